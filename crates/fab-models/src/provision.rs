//! Making sure a model artifact is present before it is loaded.

use fab_core::ModelError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Smallest file size accepted as a complete download.
pub const DEFAULT_MIN_ARTIFACT_BYTES: u64 = 1_000_000;

/// Where an artifact lives locally and where to fetch it from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub path: PathBuf,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,
}

fn default_min_bytes() -> u64 {
    DEFAULT_MIN_ARTIFACT_BYTES
}

impl ArtifactSource {
    pub fn local<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            url: None,
            min_bytes: DEFAULT_MIN_ARTIFACT_BYTES,
        }
    }
}

/// Downloads a URL to a local path.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ModelError>;
}

/// Fetches with the system `curl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurlFetcher;

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ModelError> {
        let output = Command::new("curl")
            .args(["--fail", "--location", "--silent", "--show-error", "--output"])
            .arg(dest)
            .arg(url)
            .output()
            .map_err(|e| ModelError::Fetch(format!("could not run curl: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModelError::Fetch(format!(
                "curl exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Sibling path a download is written to before it is moved into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Ensure the artifact exists at `source.path`, downloading it when it is
/// missing or smaller than `source.min_bytes`.
///
/// Without a URL, a missing file is an error and an undersized file is kept
/// (loading will reject it if it is actually broken).
pub fn ensure_artifact<F: Fetcher + ?Sized>(
    source: &ArtifactSource,
    fetcher: &F,
) -> Result<PathBuf, ModelError> {
    let size = file_size(&source.path);
    if matches!(size, Some(n) if n >= source.min_bytes) {
        return Ok(source.path.clone());
    }
    match (&source.url, size) {
        (Some(url), _) => {
            info!(url = %url, path = %source.path.display(), ?size, "downloading model artifact");
            if let Some(parent) = source.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            // The final path only ever holds a finished download.
            let partial = partial_path(&source.path);
            if let Err(e) = fetcher.fetch(url, &partial) {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
            match file_size(&partial) {
                Some(n) if n > 0 => {
                    if n < source.min_bytes {
                        warn!(bytes = n, min = source.min_bytes, "downloaded artifact is smaller than expected");
                    }
                    fs::rename(&partial, &source.path)?;
                    Ok(source.path.clone())
                }
                _ => {
                    let _ = fs::remove_file(&partial);
                    Err(ModelError::Fetch(format!(
                        "{url} produced no file at {}",
                        source.path.display()
                    )))
                }
            }
        }
        (None, Some(n)) => {
            warn!(
                path = %source.path.display(),
                bytes = n,
                min = source.min_bytes,
                "artifact below expected size and no download URL configured"
            );
            Ok(source.path.clone())
        }
        (None, None) => Err(ModelError::Missing(source.path.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeFetcher {
        payload: Vec<u8>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(payload: &[u8]) -> Self {
            Self {
                payload: payload.to_vec(),
                calls: RefCell::new(vec![]),
            }
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<(), ModelError> {
            self.calls.borrow_mut().push(url.to_string());
            fs::write(dest, &self.payload)?;
            Ok(())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, _: &str, _: &Path) -> Result<(), ModelError> {
            Err(ModelError::Fetch("offline".into()))
        }
    }

    fn source(path: PathBuf, url: Option<&str>, min_bytes: u64) -> ArtifactSource {
        ArtifactSource {
            path,
            url: url.map(str::to_string),
            min_bytes,
        }
    }

    #[test]
    fn healthy_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, vec![b'x'; 64]).unwrap();
        let fetcher = FakeFetcher::new(b"new");
        let got = ensure_artifact(&source(path.clone(), Some("http://h/m"), 32), &fetcher).unwrap();
        assert_eq!(got, path);
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn missing_file_is_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("m.json");
        let fetcher = FakeFetcher::new(&[b'y'; 40]);
        ensure_artifact(&source(path.clone(), Some("http://h/m"), 32), &fetcher).unwrap();
        assert_eq!(fetcher.calls.borrow().as_slice(), ["http://h/m".to_string()]);
        assert_eq!(fs::read(&path).unwrap().len(), 40);
    }

    #[test]
    fn undersized_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, b"tiny").unwrap();
        let fetcher = FakeFetcher::new(&[b'z'; 100]);
        ensure_artifact(&source(path.clone(), Some("http://h/m"), 50), &fetcher).unwrap();
        assert_eq!(fetcher.calls.borrow().len(), 1);
        assert_eq!(fs::read(&path).unwrap().len(), 100);
    }

    #[test]
    fn missing_without_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let err = ensure_artifact(&ArtifactSource::local(&path), &FailingFetcher).unwrap_err();
        assert!(matches!(err, ModelError::Missing(p) if p == path));
    }

    #[test]
    fn undersized_without_url_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, b"{}").unwrap();
        assert_eq!(
            ensure_artifact(&ArtifactSource::local(&path), &FailingFetcher).unwrap(),
            path
        );
    }

    #[test]
    fn fetch_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let err = ensure_artifact(&source(path, Some("http://h/m"), 10), &FailingFetcher).unwrap_err();
        assert!(matches!(err, ModelError::Fetch(_)));
    }

    struct TruncatingFetcher;

    impl Fetcher for TruncatingFetcher {
        fn fetch(&self, _: &str, dest: &Path) -> Result<(), ModelError> {
            fs::write(dest, b"{\"name\":")?;
            Err(ModelError::Fetch("connection reset".into()))
        }
    }

    #[test]
    fn interrupted_download_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, b"old").unwrap();
        let err = ensure_artifact(&source(path.clone(), Some("http://h/m"), 50), &TruncatingFetcher)
            .unwrap_err();
        assert!(matches!(err, ModelError::Fetch(_)));
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn interrupted_download_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        assert!(ensure_artifact(&source(path.clone(), Some("http://h/m"), 50), &TruncatingFetcher).is_err());
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn source_defaults_from_yaml_like_json() {
        let s: ArtifactSource = serde_json::from_str(r#"{"path": "models/w.json"}"#).unwrap();
        assert_eq!(s.min_bytes, DEFAULT_MIN_ARTIFACT_BYTES);
        assert!(s.url.is_none());
    }
}
