// src/core/scanner.rs

use crate::{
    core::metadata_parser,
    models::{ScriptLanguage, ScriptMetadata},
};
use log::{debug, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Lists every script file below `root`, recursively.
///
/// Only regular files whose extension is a recognized script language are
/// returned, as absolute paths. A missing, empty or unreadable root yields an
/// empty list. The order is whatever the directory walk produced.
pub fn find_script_files(root: &Path) -> Vec<PathBuf> {
    if root.as_os_str().is_empty() || !root.is_dir() {
        debug!("Script root '{}' is not a directory; nothing to scan.", root.display());
        return Vec::new();
    }

    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    WalkDir::new(&root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry under '{}': {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| ScriptLanguage::from_path(entry.path()).is_some())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Scans and parses one root directory.
///
/// Parsing runs on the rayon pool. Files that fail to parse are logged and
/// dropped, as are records without a title. The result is stably sorted by
/// package name, ignoring case.
pub fn load_directory(root: &Path) -> Vec<Arc<ScriptMetadata>> {
    let files = find_script_files(root);

    let mut batch: Vec<Arc<ScriptMetadata>> = files
        .par_iter()
        .filter_map(|path| match metadata_parser::parse_script_path(path) {
            Ok(Some(metadata)) => Some(metadata),
            Ok(None) => None,
            Err(e) => {
                warn!("Skipping script: {}", e);
                None
            }
        })
        .filter(ScriptMetadata::is_listable)
        .map(Arc::new)
        .collect();

    batch.sort_by(|a, b| compare_packages(a, b));
    debug!(
        "Loaded {} of {} script files from '{}'.",
        batch.len(),
        files.len(),
        root.display()
    );
    batch
}

/// Orders records by `packageName`, case-insensitively. A missing package sorts first.
pub fn compare_packages(a: &ScriptMetadata, b: &ScriptMetadata) -> std::cmp::Ordering {
    let a = a.package_name.as_deref().unwrap_or_default();
    let b = b.package_name.as_deref().unwrap_or_default();
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
