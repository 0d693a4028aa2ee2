//! # Filesystem Watch Coordinator
//!
//! Keeps the [`CommandRegistry`] in sync with the monitored roots without
//! rescanning them.
//!
//! Each root gets its own recursive `notify` watcher. All watchers feed one
//! channel drained by a single worker thread, so changes are applied one at a
//! time and in arrival order. A failure while applying one change is logged and
//! the worker keeps going.
//!
//! Changing the directory list always tears every watcher down and builds the
//! new set from scratch.

use crate::{
    core::{
        metadata_parser::{self, ParseError},
        paths,
        registry::CommandRegistry,
        scanner,
    },
    models::{RegistryEvent, ScriptDirectoryInfo, ScriptLanguage},
};
use log::{debug, error, info, trace, warn};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use scopeguard::defer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// How often the worker wakes up to check for shutdown while idle.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Failures while watching or applying a change.
#[derive(Error, Debug)]
pub enum WatchError {
    /// A changed script could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A root could not be watched.
    #[error("Could not watch '{path}': {source}")]
    Watch {
        /// The root that failed.
        path: PathBuf,
        /// The watcher's error.
        #[source]
        source: notify::Error,
    },
    /// The worker thread could not be spawned.
    #[error("Could not start the watch worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// A filesystem change, reduced to what the registry cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsChange {
    /// A file or folder appeared.
    Created(PathBuf),
    /// A file's contents were written.
    Changed(PathBuf),
    /// A file or folder is gone.
    Deleted(PathBuf),
    /// A path was renamed, with both halves known.
    Renamed {
        /// The old path.
        from: PathBuf,
        /// The new path.
        to: PathBuf,
    },
}

/// Converts a raw `notify` event into zero or more [`FsChange`]s.
///
/// Access and metadata-only events produce nothing. Rename events that carry
/// only one half are resolved against the filesystem: a path that still exists
/// is treated as changed, anything else as deleted.
pub fn translate_event(event: &Event) -> Vec<FsChange> {
    let each = |make: fn(PathBuf) -> FsChange| -> Vec<FsChange> {
        event.paths.iter().cloned().map(make).collect()
    };

    match event.kind {
        EventKind::Create(_) => each(FsChange::Created),
        EventKind::Remove(_) => each(FsChange::Deleted),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![FsChange::Renamed {
                from: from.clone(),
                to: to.clone(),
            }],
            _ => event.paths.iter().map(|p| change_or_delete(p)).collect(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(FsChange::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(FsChange::Changed),
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Any => {
            event.paths.iter().map(|p| change_or_delete(p)).collect()
        }
        EventKind::Modify(_) => each(FsChange::Changed),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}

fn change_or_delete(path: &Path) -> FsChange {
    if path.exists() {
        FsChange::Changed(path.to_path_buf())
    } else {
        FsChange::Deleted(path.to_path_buf())
    }
}

// --- Applying changes ---

/// Applies [`FsChange`]s for a fixed set of monitored roots.
#[derive(Debug, Clone)]
pub struct ChangeApplier {
    registry: Arc<CommandRegistry>,
    roots: Vec<PathBuf>,
}

impl ChangeApplier {
    /// An applier that ignores paths outside `directories`.
    pub fn new(registry: Arc<CommandRegistry>, directories: &[ScriptDirectoryInfo]) -> Self {
        Self {
            registry,
            roots: directories.iter().map(|d| d.full_path.clone()).collect(),
        }
    }

    fn is_under_root(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| paths::is_within_root(path, root))
    }

    /// A recognized script file inside one of the monitored roots.
    fn is_relevant(&self, path: &Path) -> bool {
        ScriptLanguage::from_path(path).is_some() && self.is_under_root(path)
    }

    /// A non-script path inside a root, typically a directory.
    fn is_relevant_folder(&self, path: &Path) -> bool {
        ScriptLanguage::from_path(path).is_none() && self.is_under_root(path)
    }

    /// Updates the registry for one change.
    ///
    /// A script that fails to parse is removed and its error returned.
    pub fn apply(&self, change: &FsChange) -> Result<(), WatchError> {
        trace!("Applying {:?}", change);
        match change {
            FsChange::Created(path) => {
                if self.is_relevant(path) {
                    self.add(path)?;
                } else if self.is_relevant_folder(path) && path.is_dir() {
                    self.add_folder(path);
                }
            }
            FsChange::Deleted(path) => self.delete(path),
            FsChange::Changed(path) => {
                if self.is_relevant(path) {
                    self.refresh(path)?;
                } else if self.is_relevant_folder(path) && path.is_dir() {
                    self.add_folder(path);
                }
            }
            FsChange::Renamed { from, to } => {
                self.delete(from);
                if self.is_relevant(to) {
                    self.refresh(to)?;
                } else if self.is_relevant_folder(to) && to.is_dir() {
                    self.add_folder(to);
                }
            }
        }
        Ok(())
    }

    fn add(&self, path: &Path) -> Result<(), WatchError> {
        if self.registry.contains(path) {
            trace!("'{}' is already registered.", path.display());
            return Ok(());
        }
        if let Some(metadata) = metadata_parser::parse_script_path(path)? {
            self.registry.insert(metadata);
        }
        Ok(())
    }

    /// Re-parses `path` and swaps the registered record, unless nothing changed.
    fn refresh(&self, path: &Path) -> Result<(), WatchError> {
        match metadata_parser::parse_script_path(path) {
            Ok(Some(metadata)) => {
                let unchanged = self
                    .registry
                    .get(path)
                    .is_some_and(|current| current.fingerprint == metadata.fingerprint);
                if unchanged {
                    trace!("'{}' did not change; keeping it.", path.display());
                } else {
                    self.registry.replace(path, Some(metadata));
                }
                Ok(())
            }
            Ok(None) => {
                self.registry.remove(path);
                Ok(())
            }
            Err(e) => {
                self.registry.remove(path);
                Err(e.into())
            }
        }
    }

    fn delete(&self, path: &Path) {
        if self.is_relevant(path) {
            self.registry.remove(path);
        } else if self.is_relevant_folder(path) {
            // A whole folder went away; drop everything that lived below it.
            for metadata in self.registry.snapshot() {
                if paths::is_within_root(&metadata.script_file_path, path) {
                    self.registry.remove(&metadata.script_file_path);
                }
            }
        }
    }

    fn add_folder(&self, folder: &Path) {
        for file in scanner::find_script_files(folder) {
            if let Err(e) = self.refresh(&file) {
                warn!("Skipping script: {}", e);
            }
        }
    }
}

// --- Coordinator ---

struct ActiveWatch {
    roots: Vec<ScriptDirectoryInfo>,
    watchers: Vec<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

/// Owns the watchers for the current directory set.
pub struct WatchCoordinator {
    registry: Arc<CommandRegistry>,
    active: Mutex<Option<ActiveWatch>>,
}

impl std::fmt::Debug for WatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchCoordinator")
            .field("watched_roots", &self.watched_roots())
            .finish()
    }
}

impl WatchCoordinator {
    /// A coordinator that is not watching anything yet.
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            active: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveWatch>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts watching `directories`, replacing any previous watch set.
    ///
    /// Roots that are missing or cannot be watched are logged and skipped.
    /// Returns the number of roots actually being watched.
    pub fn start(&self, directories: &[ScriptDirectoryInfo]) -> Result<usize, WatchError> {
        self.stop();

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watchers = Vec::with_capacity(directories.len());

        for directory in directories {
            match watch_root(&directory.full_path, tx.clone()) {
                Ok(watcher) => {
                    debug!("Watching '{}'.", directory.full_path.display());
                    watchers.push(watcher);
                }
                Err(e) => warn!("{}", e),
            }
        }
        // Only the watchers hold senders now; the worker exits once they are gone.
        drop(tx);

        let shutdown = Arc::new(AtomicBool::new(false));
        let applier = ChangeApplier::new(Arc::clone(&self.registry), directories);
        let worker_shutdown = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("scriptdeck-watch".to_string())
            .spawn(move || run_worker(rx, &applier, &worker_shutdown))
            .map_err(WatchError::Worker)?;

        let watched = watchers.len();
        *self.lock() = Some(ActiveWatch {
            roots: directories.to_vec(),
            watchers,
            worker: Some(worker),
            shutdown,
        });

        info!("Watching {} of {} script directories.", watched, directories.len());
        Ok(watched)
    }

    /// Stops every watcher and waits for the worker to finish. Safe to call repeatedly.
    pub fn stop(&self) {
        let Some(mut active) = self.lock().take() else {
            return;
        };

        active.shutdown.store(true, Ordering::SeqCst);
        active.watchers.clear();
        if let Some(worker) = active.worker.take() {
            if worker.join().is_err() {
                error!("The watch worker panicked.");
            }
        }
        debug!("Stopped watching {} directories.", active.roots.len());
    }

    /// Switches to a new directory set: stops all watches, starts the new ones,
    /// reloads the registry and announces the change.
    pub fn set_directories(&self, directories: &[ScriptDirectoryInfo]) -> Result<usize, WatchError> {
        self.stop();
        self.start(directories)?;
        let count = self.registry.load_all(directories);
        self.registry.publish(RegistryEvent::DirectoriesChanged {
            directories: directories.to_vec(),
        });
        Ok(count)
    }

    /// Whether a watch set is active.
    pub fn is_watching(&self) -> bool {
        self.lock().is_some()
    }

    /// The roots of the current watch set, in configured order.
    pub fn watched_roots(&self) -> Vec<ScriptDirectoryInfo> {
        self.lock()
            .as_ref()
            .map(|active| active.roots.clone())
            .unwrap_or_default()
    }

    /// The registry kept in sync.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }
}

impl Drop for WatchCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_root(
    root: &Path,
    tx: mpsc::Sender<notify::Result<Event>>,
) -> Result<RecommendedWatcher, WatchError> {
    let to_error = |source| WatchError::Watch {
        path: root.to_path_buf(),
        source,
    };

    if !root.is_dir() {
        return Err(to_error(notify::Error::path_not_found()));
    }

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // The receiver is gone during shutdown; nothing left to deliver to.
        let _ = tx.send(res);
    })
    .map_err(to_error)?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(to_error)?;
    Ok(watcher)
}

fn run_worker(rx: Receiver<notify::Result<Event>>, applier: &ChangeApplier, shutdown: &AtomicBool) {
    defer! {
        debug!("Watch worker exited.");
    }

    while !shutdown.load(Ordering::SeqCst) {
        match rx.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(Ok(event)) => {
                for change in translate_event(&event) {
                    if let Err(e) = applier.apply(&change) {
                        warn!("Could not apply {:?}: {}", change, e);
                    }
                }
            }
            Ok(Err(e)) => warn!("Watch error: {}", e),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&Path]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(path.to_path_buf()))
    }

    fn setup() -> (TempDir, Arc<CommandRegistry>, ChangeApplier) {
        let dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let registry = Arc::new(CommandRegistry::new());
        let applier = ChangeApplier::new(Arc::clone(&registry), &[ScriptDirectoryInfo::new(root)]);
        (dir, registry, applier)
    }

    fn root_of(dir: &TempDir) -> PathBuf {
        dunce::canonicalize(dir.path()).unwrap()
    }

    #[test]
    fn test_translate_basic_kinds() {
        let p = Path::new("/r/a.sh");
        assert_eq!(
            translate_event(&event(EventKind::Create(CreateKind::File), &[p])),
            vec![FsChange::Created(p.to_path_buf())]
        );
        assert_eq!(
            translate_event(&event(EventKind::Remove(RemoveKind::File), &[p])),
            vec![FsChange::Deleted(p.to_path_buf())]
        );
        assert_eq!(
            translate_event(&event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &[p]
            )),
            vec![FsChange::Changed(p.to_path_buf())]
        );
    }

    #[test]
    fn test_translate_ignores_access_and_metadata() {
        let p = Path::new("/r/a.sh");
        assert!(translate_event(&event(EventKind::Access(AccessKind::Any), &[p])).is_empty());
        assert!(
            translate_event(&event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                &[p]
            ))
            .is_empty()
        );
        assert!(translate_event(&event(EventKind::Other, &[p])).is_empty());
    }

    #[test]
    fn test_translate_renames() {
        let from = Path::new("/r/old.sh");
        let to = Path::new("/r/new.sh");
        assert_eq!(
            translate_event(&event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &[from, to]
            )),
            vec![FsChange::Renamed {
                from: from.to_path_buf(),
                to: to.to_path_buf()
            }]
        );
        assert_eq!(
            translate_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &[from])),
            vec![FsChange::Deleted(from.to_path_buf())]
        );
        assert_eq!(
            translate_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &[to])),
            vec![FsChange::Changed(to.to_path_buf())]
        );
        // A one-sided rename of a path that no longer exists is a delete.
        assert_eq!(
            translate_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), &[from])),
            vec![FsChange::Deleted(from.to_path_buf())]
        );
    }

    #[test]
    fn test_created_script_is_inserted_in_order() {
        let (dir, registry, applier) = setup();
        let root = root_of(&dir);
        fs::write(
            root.join("a.sh"),
            "# @raycast.title A\n# @raycast.packageName Alpha\n",
        )
        .unwrap();
        fs::write(
            root.join("z.sh"),
            "# @raycast.title Z\n# @raycast.packageName Zulu\n",
        )
        .unwrap();
        applier.apply(&FsChange::Created(root.join("a.sh"))).unwrap();
        applier.apply(&FsChange::Created(root.join("z.sh"))).unwrap();

        let bar = root.join("bar.py");
        fs::write(&bar, "# @raycast.title Bar\n# @raycast.packageName Mid\n").unwrap();
        applier.apply(&FsChange::Created(bar.clone())).unwrap();
        applier.apply(&FsChange::Created(bar.clone())).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        let entry = &snapshot[1];
        assert_eq!(entry.script_file_path, bar);
        assert_eq!(entry.language(), ScriptLanguage::Python);
        assert_eq!(entry.language_tag().text, "py");
    }

    #[test]
    fn test_events_outside_roots_or_for_other_files_are_ignored() {
        let (dir, registry, applier) = setup();
        let outside = TempDir::new().unwrap();
        let foreign = outside.path().join("x.sh");
        fs::write(&foreign, "# @raycast.title X\n").unwrap();
        let notes = root_of(&dir).join("notes.txt");
        fs::write(&notes, "# @raycast.title Notes\n").unwrap();

        applier.apply(&FsChange::Created(foreign)).unwrap();
        applier.apply(&FsChange::Created(notes)).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_changed_package_repositions_entry() {
        let (dir, registry, applier) = setup();
        let root = root_of(&dir);
        for (file, package) in [("a.sh", "A"), ("m.sh", "M"), ("y.sh", "Y")] {
            fs::write(
                root.join(file),
                format!("# @raycast.title {}\n# @raycast.packageName {}\n", file, package),
            )
            .unwrap();
            applier.apply(&FsChange::Created(root.join(file))).unwrap();
        }

        fs::write(root.join("a.sh"), "# @raycast.title a.sh\n# @raycast.packageName Z\n").unwrap();
        applier.apply(&FsChange::Changed(root.join("a.sh"))).unwrap();

        let order: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|m| m.package_name.clone().unwrap())
            .collect();
        assert_eq!(order, vec!["M", "Y", "Z"]);
    }

    #[test]
    fn test_unchanged_content_keeps_existing_record() {
        let (dir, registry, applier) = setup();
        let path = root_of(&dir).join("a.sh");
        fs::write(&path, "# @raycast.title A\n").unwrap();
        applier.apply(&FsChange::Created(path.clone())).unwrap();
        let before = registry.get(&path).unwrap();
        let events = registry.subscribe();

        applier.apply(&FsChange::Changed(path.clone())).unwrap();

        assert!(Arc::ptr_eq(&before, &registry.get(&path).unwrap()));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_change_to_invalid_boolean_removes_entry_and_reports() {
        let (dir, registry, applier) = setup();
        let path = root_of(&dir).join("a.sh");
        fs::write(&path, "# @raycast.title A\n").unwrap();
        applier.apply(&FsChange::Created(path.clone())).unwrap();

        fs::write(&path, "# @raycast.title A\n# @raycast.needsConfirmation maybe\n").unwrap();
        let result = applier.apply(&FsChange::Changed(path.clone()));

        assert!(matches!(result, Err(WatchError::Parse(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_deleted_and_renamed_scripts() {
        let (dir, registry, applier) = setup();
        let root = root_of(&dir);
        let old = root.join("old.sh");
        fs::write(&old, "# @raycast.title Old\n").unwrap();
        applier.apply(&FsChange::Created(old.clone())).unwrap();

        let new = root.join("new.sh");
        fs::rename(&old, &new).unwrap();
        applier
            .apply(&FsChange::Renamed {
                from: old.clone(),
                to: new.clone(),
            })
            .unwrap();
        assert!(!registry.contains(&old));
        assert!(registry.contains(&new));

        // Renaming away from a script extension only removes.
        let text = root.join("new.txt");
        fs::rename(&new, &text).unwrap();
        applier
            .apply(&FsChange::Renamed {
                from: new.clone(),
                to: text,
            })
            .unwrap();
        assert!(registry.is_empty());

        applier.apply(&FsChange::Deleted(root.join("missing.sh"))).unwrap();
    }

    #[test]
    fn test_deleted_folder_drops_its_scripts() {
        let (dir, registry, applier) = setup();
        let root = root_of(&dir);
        let sub = root.join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.sh"), "# @raycast.title A\n").unwrap();
        fs::write(root.join("b.sh"), "# @raycast.title B\n").unwrap();
        applier.apply(&FsChange::Created(sub.clone())).unwrap();
        applier.apply(&FsChange::Created(root.join("b.sh"))).unwrap();
        assert_eq!(registry.len(), 2);

        fs::remove_dir_all(&sub).unwrap();
        applier.apply(&FsChange::Deleted(sub)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&root.join("b.sh")));
    }

    #[test]
    fn test_coordinator_lifecycle() {
        let (dir, registry, _) = setup();
        let root = root_of(&dir);
        fs::write(root.join("a.sh"), "# @raycast.title A\n").unwrap();
        let coordinator = WatchCoordinator::new(Arc::clone(&registry));
        let events = registry.subscribe();

        let directories = vec![
            ScriptDirectoryInfo::new(&root),
            ScriptDirectoryInfo::new(root.join("does-not-exist")),
        ];
        let count = coordinator.set_directories(&directories).unwrap();

        assert_eq!(count, 1);
        assert!(coordinator.is_watching());
        assert_eq!(coordinator.watched_roots(), directories);
        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&RegistryEvent::DirectoriesChanged {
            directories: directories.clone()
        }));

        coordinator.stop();
        coordinator.stop();
        assert!(!coordinator.is_watching());
    }

    #[test]
    fn test_coordinator_picks_up_new_files() {
        let (dir, registry, _) = setup();
        let root = root_of(&dir);
        let coordinator = WatchCoordinator::new(Arc::clone(&registry));
        coordinator
            .set_directories(&[ScriptDirectoryInfo::new(&root)])
            .unwrap();

        fs::write(root.join("live.sh"), "# @raycast.title Live\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !registry.contains(&root.join("live.sh")) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(registry.contains(&root.join("live.sh")));
    }

    #[test]
    fn test_coordinator_keeps_running_after_a_failed_change() {
        let (dir, registry, _) = setup();
        let root = root_of(&dir);
        let coordinator = WatchCoordinator::new(Arc::clone(&registry));
        coordinator
            .set_directories(&[ScriptDirectoryInfo::new(&root)])
            .unwrap();

        let broken = root.join("broken.sh");
        fs::write(
            &broken,
            "# @raycast.title Broken\n# @raycast.needsConfirmation notabool\n",
        )
        .unwrap();
        thread::sleep(Duration::from_millis(300));
        fs::write(root.join("ok.sh"), "# @raycast.title Ok\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !registry.contains(&root.join("ok.sh")) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(coordinator.is_watching());
        assert!(registry.contains(&root.join("ok.sh")));
        assert!(!registry.contains(&broken));
    }
}
