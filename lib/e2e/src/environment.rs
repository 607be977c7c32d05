use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use eyre::{bail, ContextCompat, WrapErr};
use toml::Table;

/// Returns the root directory of the cargo workspace containing the current
/// directory.
///
/// Runs the following command:
///
/// ```bash
/// cargo locate-project --workspace --message-format plain
/// ```
///
/// # Errors
///
/// May fail if `cargo` can't be run or no workspace is found.
pub fn workspace_root() -> eyre::Result<PathBuf> {
    let output = Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format", "plain"])
        .output()
        .wrap_err("should run `cargo locate-project`")?;

    if !output.status.success() {
        let err = String::from_utf8_lossy(&output.stderr);
        bail!("failed to locate workspace manifest: {err}");
    }

    let manifest = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    manifest
        .parent()
        .map(Path::to_path_buf)
        .context("workspace manifest should have a parent directory")
}

/// Reads the package name from the manifest in `package_dir`.
///
/// # Errors
///
/// May fail if the manifest can't be read or has no `package.name`.
pub fn package_name(package_dir: &Path) -> eyre::Result<String> {
    let cargo_toml = package_dir.join("Cargo.toml");
    let buffer = fs::read_to_string(&cargo_toml)
        .wrap_err(format!("failed to read {}", cargo_toml.display()))?;

    let table = buffer.parse::<Table>()?;
    table
        .get("package")
        .and_then(|package| package.get("name"))
        .and_then(toml::Value::as_str)
        .map(ToOwned::to_owned)
        .context(format!(
            "unable to find package name in {}",
            cargo_toml.display()
        ))
}
