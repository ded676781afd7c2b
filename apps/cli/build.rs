use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Short commit hash and commit date of HEAD, if this is a git checkout.
fn head_commit() -> Option<(String, String)> {
    let out = Command::new("git")
        .args(["log", "-1", "--format=%h%n%cI", "--abbrev=12"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let text = String::from_utf8(out.stdout).ok()?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    Some((lines.next()?.to_string(), lines.next()?.to_string()))
}

fn main() {
    let (sha, date) = head_commit().unwrap_or_else(|| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "unknown".into());
        ("unknown".into(), secs)
    });
    println!("cargo:rustc-env=GIT_SHA={sha}");
    println!("cargo:rustc-env=BUILD_DATE={date}");
    // build.rs runs from apps/cli; HEAD lives at the workspace root
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
