//! Loading artifacts and holding them for the life of the process.

use crate::artifact::ModelArtifact;
use fab_core::{
    EfficiencyFeatures, ModelError, RevenueFeatures, RevenueMultiplierModel, WaterEfficiencyModel,
};
use once_cell::sync::OnceCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// An artifact loaded from disk. Read-only after construction.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub path: PathBuf,
    pub artifact: ModelArtifact,
}

impl RevenueMultiplierModel for LoadedModel {
    fn predict_revenue_multiplier(&self, features: &RevenueFeatures) -> Result<f64, ModelError> {
        self.artifact.predict(&features.to_row())
    }
}

impl WaterEfficiencyModel for LoadedModel {
    fn predict_water_efficiency(&self, features: &EfficiencyFeatures) -> Result<f64, ModelError> {
        self.artifact.predict(&features.to_row())
    }
}

/// Read and validate an artifact. Missing or malformed files are errors.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LoadedModel, ModelError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ModelError::Missing(path.to_path_buf()),
        ErrorKind::InvalidData => ModelError::Malformed {
            path: path.to_path_buf(),
            reason: "artifact is not valid UTF-8".into(),
        },
        _ => ModelError::from(e),
    })?;
    let artifact = ModelArtifact::from_json(&text, path)?;
    info!(
        model = %artifact.name,
        path = %path.display(),
        features = artifact.width(),
        "model loaded"
    );
    Ok(LoadedModel {
        path: path.to_path_buf(),
        artifact,
    })
}

/// Load-once handles for the revenue and water-efficiency models.
///
/// Each artifact is read at most once; a failed load is not cached, so the
/// next call retries.
#[derive(Debug)]
pub struct ModelRegistry {
    revenue_path: PathBuf,
    water_path: PathBuf,
    revenue: OnceCell<Arc<LoadedModel>>,
    water: OnceCell<Arc<LoadedModel>>,
}

impl ModelRegistry {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(revenue_path: P, water_path: Q) -> Self {
        Self {
            revenue_path: revenue_path.as_ref().to_path_buf(),
            water_path: water_path.as_ref().to_path_buf(),
            revenue: OnceCell::new(),
            water: OnceCell::new(),
        }
    }

    pub fn revenue_model(&self) -> Result<Arc<LoadedModel>, ModelError> {
        self.revenue
            .get_or_try_init(|| load_model(&self.revenue_path).map(Arc::new))
            .cloned()
    }

    pub fn water_model(&self) -> Result<Arc<LoadedModel>, ModelError> {
        self.water
            .get_or_try_init(|| load_model(&self.water_path).map(Arc::new))
            .cloned()
    }

    /// Whether both models have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.revenue.get().is_some() && self.water.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::{build_efficiency_features, build_revenue_features, ScenarioInput};
    use std::io::Write;

    const REVENUE: &str = r#"{
        "name": "revenue",
        "columns": [
            {"name": "wafer_size", "encoding": "numeric"},
            {"name": "year", "encoding": "numeric"},
            {"name": "impact_score", "encoding": "numeric"}
        ],
        "estimator": {"type": "linear", "intercept": 1.0, "coefficients": [0.0, 0.0, 0.001]}
    }"#;

    const WATER: &str = r#"{
        "name": "water",
        "columns": [
            {"name": "Total Investment", "encoding": "numeric"},
            {"name": "Wafer Intention", "encoding": "one_hot",
             "categories": ["Automotive", "Medical Devices"]}
        ],
        "estimator": {"type": "linear", "intercept": 2000.0, "coefficients": [-1.0, 5.0, 7.0]}
    }"#;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_predicts_through_traits() {
        let dir = tempfile::tempdir().unwrap();
        let rev = write(dir.path(), "rev.json", REVENUE);
        let wat = write(dir.path(), "water.json", WATER);
        let registry = ModelRegistry::new(&rev, &wat);
        assert!(!registry.is_loaded());

        let input = ScenarioInput::default();
        let revenue = registry.revenue_model().unwrap();
        let m = revenue
            .predict_revenue_multiplier(&build_revenue_features(&input, 1.0))
            .unwrap();
        assert!((m - (1.0 + 0.205)).abs() < 1e-12);

        let water = registry.water_model().unwrap();
        let e = water
            .predict_water_efficiency(&build_efficiency_features(&input))
            .unwrap();
        assert_eq!(e, 2000.0 - 250.0 + 5.0);
        assert!(registry.is_loaded());
    }

    #[test]
    fn loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let rev = write(dir.path(), "rev.json", REVENUE);
        let wat = write(dir.path(), "water.json", WATER);
        let registry = ModelRegistry::new(&rev, &wat);
        let first = registry.revenue_model().unwrap();
        // Removing the file does not matter once cached.
        fs::remove_file(&rev).unwrap();
        let second = registry.revenue_model().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_artifact_is_fatal_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let rev = dir.path().join("rev.json");
        let wat = write(dir.path(), "water.json", WATER);
        let registry = ModelRegistry::new(&rev, &wat);
        assert!(matches!(registry.revenue_model(), Err(ModelError::Missing(_))));
        write(dir.path(), "rev.json", REVENUE);
        assert!(registry.revenue_model().is_ok());
    }

    #[test]
    fn malformed_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.json", "{\"name\": \"half\"");
        assert!(matches!(load_model(&bad), Err(ModelError::Malformed { .. })));
    }

    #[test]
    fn non_utf8_artifact_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        assert!(matches!(load_model(&path), Err(ModelError::Malformed { .. })));
    }

    #[test]
    fn concurrent_callers_share_one_model() {
        let dir = tempfile::tempdir().unwrap();
        let rev = write(dir.path(), "rev.json", REVENUE);
        let wat = write(dir.path(), "water.json", WATER);
        let registry = ModelRegistry::new(&rev, &wat);
        let handles: Vec<Arc<LoadedModel>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.revenue_model().unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert_eq!(handles.len(), 8);
        for h in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], h));
        }
    }

    #[test]
    fn revenue_model_rejects_wrong_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        // The water pipeline asks for columns the revenue features do not have.
        let wat = write(dir.path(), "water.json", WATER);
        let model = load_model(&wat).unwrap();
        let err = model
            .predict_revenue_multiplier(&build_revenue_features(&ScenarioInput::default(), 1.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingFeature(_)));
    }
}
