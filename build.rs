use std::path::PathBuf;
use std::process::Command;

fn main() {
    let commit = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT_HASH={commit}");

    // Rebuild when HEAD moves so `--version` stays accurate.
    if let Some(git_dir) = git(&["rev-parse", "--git-dir"]) {
        let mut git_dir = PathBuf::from(git_dir);
        if git_dir.is_relative() {
            if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
                git_dir = PathBuf::from(manifest_dir).join(git_dir);
            }
        }
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}
