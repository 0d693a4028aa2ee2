// src/context.rs

use crate::core::{
    registry::CommandRegistry,
    settings::{SettingsError, SettingsStore},
};
use crate::models::Settings;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Represents the state of the settings.
/// It holds the current value and, once a mutation was requested, a snapshot
/// of the value as it was loaded.
enum SettingsState {
    /// No mutable access has been requested yet.
    Pristine(Settings),
    /// Mutable access was requested. Holds the loaded snapshot and the live value.
    Dirty { original: Settings, current: Settings },
}

impl SettingsState {
    fn current(&self) -> &Settings {
        match self {
            Self::Pristine(settings) => settings,
            Self::Dirty { current, .. } => current,
        }
    }
}

/// Everything a command handler needs: the settings (journaled), where they
/// live, and the shared command registry.
///
/// Built once by the entry point and passed by reference.
pub struct AppContext {
    store: SettingsStore,
    settings: Mutex<SettingsState>,
    registry: Arc<CommandRegistry>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("settings_path", &self.store.path())
            .field("registry_len", &self.registry.len())
            .finish()
    }
}

impl AppContext {
    /// Loads the settings from `store`.
    pub fn new(store: SettingsStore) -> Self {
        let settings = store.load();
        Self::with_settings(store, settings)
    }

    /// Uses `settings` as the loaded baseline instead of reading `store`.
    pub fn with_settings(store: SettingsStore, settings: Settings) -> Self {
        Self {
            store,
            settings: Mutex::new(SettingsState::Pristine(settings)),
            registry: Arc::new(CommandRegistry::new()),
        }
    }

    /// Locks the settings. Mutating through the guard marks them for saving.
    pub fn lock_settings(&self) -> SettingsGuard<'_> {
        SettingsGuard {
            guard: self.settings.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// A copy of the current settings.
    pub fn settings(&self) -> Settings {
        self.lock_settings().clone()
    }

    /// Whether the settings differ from what was loaded.
    pub fn needs_saving(&self) -> bool {
        match &*self.settings.lock().unwrap_or_else(PoisonError::into_inner) {
            SettingsState::Pristine(_) => false,
            SettingsState::Dirty { original, current } => original != current,
        }
    }

    /// Saves the settings when they changed. The saved value becomes the new
    /// baseline. Returns whether anything was written.
    pub fn persist_if_needed(&self) -> Result<bool, SettingsError> {
        let mut state = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
        let current = match &*state {
            SettingsState::Dirty { original, current } if original != current => current.clone(),
            _ => return Ok(false),
        };

        self.store.try_save(&current)?;
        *state = SettingsState::Pristine(current);
        Ok(true)
    }

    /// Re-reads the settings file, replacing the in-memory value and its baseline.
    pub fn reload_settings(&self) -> Settings {
        let settings = self.store.load();
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) =
            SettingsState::Pristine(settings.clone());
        settings
    }

    /// The registry shared with the watch coordinator.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Reloads the registry from the configured directories.
    pub fn reload_registry(&self) -> usize {
        let directories = self.lock_settings().directories.clone();
        self.registry.load_all(&directories)
    }

    /// Where the settings are loaded from and saved to.
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// The configured limit for captured runs, if any.
    pub fn launch_timeout(&self) -> Option<Duration> {
        self.lock_settings()
            .launch_timeout_secs
            .map(Duration::from_secs)
    }
}

/// A custom `MutexGuard` that manages the transition from Pristine to Dirty.
pub struct SettingsGuard<'a> {
    guard: MutexGuard<'a, SettingsState>,
}

impl std::fmt::Debug for SettingsGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.guard.current(), f)
    }
}

impl Deref for SettingsGuard<'_> {
    type Target = Settings;

    fn deref(&self) -> &Self::Target {
        self.guard.current()
    }
}

impl DerefMut for SettingsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Settings {
        // The first mutable access snapshots the loaded value.
        if let SettingsState::Pristine(settings) = &mut *self.guard {
            let current = std::mem::take(settings);
            *self.guard = SettingsState::Dirty {
                original: current.clone(),
                current,
            };
        }

        match &mut *self.guard {
            SettingsState::Dirty { current, .. } => current,
            SettingsState::Pristine(settings) => settings,
        }
    }
}
