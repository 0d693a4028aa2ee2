// src/core/paths.rs

use crate::constants::{CONFIG_DIR_ENV, PRODUCT_DIR, SETTINGS_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref SCRIPTDECK_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Failures locating or creating the config directory.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform reports no config directory.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// The directory could not be created.
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        /// The directory that was being created.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Returns the scriptdeck configuration directory (`~/.config/scriptdeck`), or the
/// directory named by `SCRIPTDECK_CONFIG_DIR` when that variable is set.
/// Creates it if it doesn't exist.
///
/// This function is memoized: the first call computes and caches the path,
/// subsequent calls return the cached value instantly.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached_path_guard = SCRIPTDECK_CONFIG_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(path) = &*cached_path_guard {
        return Ok(path.clone());
    }

    // --- Cache miss: compute the path for the first time ---
    let config_path = match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join(PRODUCT_DIR),
    };

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached_path_guard = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to `settings.json` inside the configuration directory.
pub fn get_settings_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user supplied path.
///
/// Expansion failures (an undefined variable, for instance) leave the input untouched.
pub fn expand_user_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            log::debug!("Could not expand path '{}': {}", raw, e);
            PathBuf::from(raw)
        }
    }
}

/// Turns a user supplied directory into the form stored in settings.
///
/// Existing directories are canonicalized (without the `\\?\` prefix on Windows);
/// anything else is only made absolute.
pub fn normalize_directory(raw: &str) -> std::io::Result<PathBuf> {
    let expanded = expand_user_path(raw);
    if expanded.exists() {
        dunce::canonicalize(&expanded)
    } else {
        std::path::absolute(&expanded)
    }
}

/// Compares two paths ignoring ASCII and Unicode case, component by component.
pub fn paths_equal_ignore_case(a: &Path, b: &Path) -> bool {
    let a: Vec<Component<'_>> = a.components().collect();
    let b: Vec<Component<'_>> = b.components().collect();
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| component_eq(x, y))
}

/// Whether `path` equals `root` or lies below it. Case-insensitive.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    let mut path_components = path.components();
    root.components()
        .all(|root_part| path_components.next().is_some_and(|part| component_eq(&part, &root_part)))
}

fn component_eq(a: &Component<'_>, b: &Component<'_>) -> bool {
    let a = a.as_os_str().to_string_lossy();
    let b = b.as_os_str().to_string_lossy();
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_within_root() {
        let root = Path::new("/home/me/Scripts");
        assert!(is_within_root(Path::new("/home/me/Scripts/a.sh"), root));
        assert!(is_within_root(Path::new("/home/me/scripts/sub/b.py"), root));
        assert!(is_within_root(root, root));
        assert!(!is_within_root(Path::new("/home/me/ScriptsOld/a.sh"), root));
        assert!(!is_within_root(Path::new("/home/me"), root));
    }

    #[test]
    fn test_paths_equal_ignore_case() {
        assert!(paths_equal_ignore_case(
            Path::new("/tmp/Foo/BAR.sh"),
            Path::new("/tmp/foo/bar.sh")
        ));
        assert!(!paths_equal_ignore_case(
            Path::new("/tmp/foo/bar.sh"),
            Path::new("/tmp/foo/bar.py")
        ));
        assert!(!paths_equal_ignore_case(Path::new("/tmp/foo"), Path::new("/tmp/foo/x")));
    }

    #[test]
    fn test_normalize_existing_directory_is_canonical() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        let raw = format!("{}/../nested", nested.display());
        let normalized = normalize_directory(&raw).unwrap();
        assert_eq!(normalized, dunce::canonicalize(&nested).unwrap());
    }

    #[test]
    fn test_normalize_missing_directory_is_absolute() {
        let normalized = normalize_directory("definitely-missing-dir").unwrap();
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("definitely-missing-dir"));
    }

    #[test]
    fn test_expand_user_path_keeps_plain_paths() {
        assert_eq!(expand_user_path("/opt/scripts"), PathBuf::from("/opt/scripts"));
        assert_eq!(
            expand_user_path("$SCRIPTDECK_SURELY_UNDEFINED_VAR/x"),
            PathBuf::from("$SCRIPTDECK_SURELY_UNDEFINED_VAR/x")
        );
    }
}
