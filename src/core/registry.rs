//! # Command Registry
//!
//! The live, ordered set of listable scripts.
//!
//! Entries are kept sorted by `packageName` (case-insensitive). After a full
//! reload the order is "directories in configured order, each batch sorted",
//! so two scripts from different roots are never compared. Single inserts then
//! go to the binary-search position against the current sequence.
//!
//! Every mutation runs behind one lock, so a watch event can never interleave
//! with a reload. Notifications are published after the lock is released.

use crate::{
    core::{events::EventBus, paths, scanner},
    dev_utils::BlockTimer,
    models::{RegistryEvent, ScriptDirectoryInfo, ScriptMetadata},
};
use log::debug;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Every known script, ordered by source directory and then by package.
///
/// Mutations and reads go through one lock; each mutation notifies subscribers.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Mutex<Vec<Arc<ScriptMetadata>>>,
    bus: EventBus<RegistryEvent>,
}

impl CommandRegistry {
    /// An empty registry with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ScriptMetadata>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the whole registry with the scripts found under `directories`.
    ///
    /// Returns the number of registered scripts.
    pub fn load_all(&self, directories: &[ScriptDirectoryInfo]) -> usize {
        let _timer = BlockTimer::new("registry::load_all");

        let count = {
            let mut entries = self.lock();
            entries.clear();
            for directory in directories {
                entries.extend(scanner::load_directory(&directory.full_path));
            }
            entries.len()
        };

        debug!(
            "Registry reloaded: {} scripts from {} directories.",
            count,
            directories.len()
        );
        self.bus.emit(RegistryEvent::Reloaded { count });
        count
    }

    /// Inserts a record at its sorted position.
    ///
    /// Returns `false` (and changes nothing) when the record has no title or a
    /// record with the same path is already registered.
    pub fn insert(&self, metadata: ScriptMetadata) -> bool {
        let path = metadata.script_file_path.clone();
        let inserted = {
            let mut entries = self.lock();
            insert_sorted(&mut entries, Arc::new(metadata))
        };

        if inserted {
            debug!("Registered script '{}'.", path.display());
            self.bus.emit(RegistryEvent::Inserted { path });
        }
        inserted
    }

    /// Removes the record registered under `path`. A missing path is a no-op.
    pub fn remove(&self, path: &Path) -> bool {
        let removed = {
            let mut entries = self.lock();
            remove_path(&mut entries, path)
        };

        if removed {
            debug!("Unregistered script '{}'.", path.display());
            self.bus.emit(RegistryEvent::Removed {
                path: path.to_path_buf(),
            });
        }
        removed
    }

    /// Removes `path` and, when given, inserts the re-parsed record, as one
    /// atomic step. Used for change events.
    pub fn replace(&self, path: &Path, metadata: Option<ScriptMetadata>) {
        let (removed, inserted) = {
            let mut entries = self.lock();
            let removed = remove_path(&mut entries, path);
            let inserted = metadata.is_some_and(|m| insert_sorted(&mut entries, Arc::new(m)));
            (removed, inserted)
        };

        if removed {
            self.bus.emit(RegistryEvent::Removed {
                path: path.to_path_buf(),
            });
        }
        if inserted {
            self.bus.emit(RegistryEvent::Inserted {
                path: path.to_path_buf(),
            });
        }
    }

    /// Whether a script at `path` is registered (case-insensitive).
    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// The record registered for `path`, compared case-insensitively.
    pub fn get(&self, path: &Path) -> Option<Arc<ScriptMetadata>> {
        self.lock()
            .iter()
            .find(|m| paths::paths_equal_ignore_case(&m.script_file_path, path))
            .cloned()
    }

    /// A point-in-time copy of the registry, in order.
    pub fn snapshot(&self) -> Vec<Arc<ScriptMetadata>> {
        self.lock().clone()
    }

    /// Number of registered scripts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Looks up scripts by title (case-insensitive) or by file path.
    ///
    /// An exact title or path match wins; otherwise every title containing
    /// `query` is returned.
    pub fn find(&self, query: &str) -> Vec<Arc<ScriptMetadata>> {
        let entries = self.lock();
        let needle = query.to_lowercase();
        let query_path = Path::new(query);

        let exact: Vec<_> = entries
            .iter()
            .filter(|m| {
                m.display_title().to_lowercase() == needle
                    || paths::paths_equal_ignore_case(&m.script_file_path, query_path)
            })
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        entries
            .iter()
            .filter(|m| m.display_title().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Registers a listener for registry notifications.
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        self.bus.subscribe()
    }

    /// Publishes an event on the registry's bus.
    pub fn publish(&self, event: RegistryEvent) {
        self.bus.emit(event);
    }
}

fn insert_sorted(entries: &mut Vec<Arc<ScriptMetadata>>, metadata: Arc<ScriptMetadata>) -> bool {
    if !metadata.is_listable() {
        return false;
    }
    if entries
        .iter()
        .any(|m| paths::paths_equal_ignore_case(&m.script_file_path, &metadata.script_file_path))
    {
        return false;
    }

    let index = entries
        .partition_point(|m| scanner::compare_packages(m, &metadata) != Ordering::Greater);
    entries.insert(index, metadata);
    true
}

fn remove_path(entries: &mut Vec<Arc<ScriptMetadata>>, path: &Path) -> bool {
    match entries
        .iter()
        .position(|m| paths::paths_equal_ignore_case(&m.script_file_path, path))
    {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}
