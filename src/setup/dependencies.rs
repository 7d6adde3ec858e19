//! Startup check for the external tools the selected backends run.

use std::env;
use std::ffi::OsString;
use std::path::Path;

use log::debug;

use crate::error::SnipError;

/// Fail with install guidance if any of `required` is not on `PATH`.
pub fn check(required: &[&str]) -> Result<(), SnipError> {
    let missing = find_missing(required, env::var_os("PATH"));
    if missing.is_empty() {
        debug!("Found required tools: {}", required.join(", "));
        return Ok(());
    }

    let packages: Vec<&str> = missing.iter().map(|tool| package_for(tool)).collect();
    let hint = format!(
        "Please install them (e.g., 'sudo apt-get install {}') and try again.",
        packages.join(" ")
    );
    Err(SnipError::DependencyMissing { missing, hint })
}

pub fn find_missing(required: &[&str], path_var: Option<OsString>) -> Vec<String> {
    let dirs: Vec<_> = path_var
        .map(|paths| env::split_paths(&paths).collect())
        .unwrap_or_default();

    required
        .iter()
        .filter(|tool| !dirs.iter().any(|dir| is_executable(&dir.join(tool))))
        .map(|tool| tool.to_string())
        .collect()
}

pub fn is_on_path(tool: &str) -> bool {
    find_missing(&[tool], env::var_os("PATH")).is_empty()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn package_for(tool: &str) -> &str {
    match tool {
        "wl-copy" => "wl-clipboard",
        "gsettings" => "libglib2.0-bin",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[cfg(unix)]
    fn install_fake_tool(dir: &Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_find_missing_reports_only_absent_tools() {
        let dir = tempfile::tempdir().unwrap();
        install_fake_tool(dir.path(), "scrot");

        let missing = find_missing(
            &["scrot", "xclip"],
            Some(dir.path().as_os_str().to_os_string()),
        );
        assert_eq!(missing, vec!["xclip".to_string()]);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_executable_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("xclip"), "").unwrap();

        let missing = find_missing(&["xclip"], Some(dir.path().as_os_str().to_os_string()));
        assert_eq!(missing, vec!["xclip".to_string()]);
    }

    #[test]
    fn test_no_path_means_everything_missing() {
        let missing = find_missing(&["scrot", "xclip"], None);
        assert_eq!(missing, vec!["scrot".to_string(), "xclip".to_string()]);
    }

    #[test]
    fn test_nothing_required_passes() {
        assert!(check(&[]).is_ok());
    }

    #[test]
    fn test_install_hint_uses_package_names() {
        assert_eq!(package_for("wl-copy"), "wl-clipboard");
        assert_eq!(package_for("scrot"), "scrot");
    }
}
