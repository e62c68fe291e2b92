//! One viewer window's worth of state and the glue between its parts.
//!
//! The session owns the settings registry and is the only subscriber that
//! acts on its changes: view settings go to the renderer, user edits are
//! checked for drift from the active preset, and shell toggles are kept for
//! the persisted store.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use shared::{SettingCategory, SettingKey, SettingValue, UpDirection};

use crate::reload::{ReloadOutcome, ReloadWorker};
use crate::state::{
    ActivePreset, ChangeSource, KeyValueStore, PresetCatalog, PresetError, SettingChange,
    SettingRegistry, WindowState,
};
use crate::viewer::{SceneUpdate, Viewer};
use crate::watcher::FileWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub struct Session {
    pub registry: SettingRegistry,
    pub presets: PresetCatalog,
    pub viewer: Viewer,
    store: Box<dyn KeyValueStore>,
    window: WindowState,
    changes: Receiver<SettingChange>,
    reload: ReloadWorker,
    watcher: Option<FileWatcher>,
    notices: Vec<Notice>,
}

impl Session {
    /// Build a session and push every setting to the renderer once
    pub fn new(viewer: Viewer, presets: PresetCatalog, store: Box<dyn KeyValueStore>) -> Self {
        let mut registry = SettingRegistry::new();
        let changes = registry.subscribe();
        let window = WindowState::load(store.as_ref());

        registry.set(SettingKey::SidebarShow, window.sidebar_show, ChangeSource::External);
        registry.set(SettingKey::AutoBest, window.auto_best, ChangeSource::External);

        let mut session = Self {
            registry,
            presets,
            viewer,
            store,
            window,
            changes,
            reload: ReloadWorker::default(),
            watcher: None,
            notices: Vec::new(),
        };
        // Anything queued so far is covered by the full sync
        while session.changes.try_recv().is_ok() {}
        session.registry.sync_all();
        session.process_changes();
        session
    }

    pub fn with_reload_worker(mut self, worker: ReloadWorker) -> Self {
        self.reload = worker;
        self
    }

    pub fn with_watcher(mut self, watcher: FileWatcher) -> Self {
        self.watcher = Some(watcher);
        self.refresh_watch();
        self
    }

    pub fn window_state(&self) -> &WindowState {
        &self.window
    }

    pub fn active_preset(&self) -> &ActivePreset {
        self.presets.active()
    }

    /// Files shown in the viewer
    pub fn files(&self) -> &[PathBuf] {
        self.viewer.files()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// A setting edited by the user
    pub fn set(&mut self, key: SettingKey, value: impl Into<SettingValue>) -> bool {
        let changed = self.registry.set(key, value, ChangeSource::User);
        self.process_changes();
        changed
    }

    /// React to every queued setting change. Returns how many were handled.
    pub fn process_changes(&mut self) -> usize {
        let changes: Vec<SettingChange> = self.changes.try_iter().collect();
        if changes.is_empty() {
            return 0;
        }

        let mut options = Vec::new();
        let mut user_edit = false;
        let mut watch_changed = false;
        for change in &changes {
            user_edit |= change.source == ChangeSource::User;
            match change.key {
                SettingKey::PointUp => {
                    self.viewer.set_point_up(change.value.as_bool().unwrap_or(true))
                }
                SettingKey::AutoReload => watch_changed = true,
                SettingKey::SidebarShow => {
                    self.window.sidebar_show = change.value.as_bool().unwrap_or(true)
                }
                SettingKey::AutoBest => {
                    self.window.auto_best = change.value.as_bool().unwrap_or(true)
                }
                key if change.category == SettingCategory::View => {
                    options.push((key, change.value.clone()))
                }
                _ => {}
            }
        }

        self.viewer.update_options(options);
        if watch_changed {
            self.refresh_watch();
        }
        if user_edit && self.presets.detect_drift(&self.registry) {
            tracing::info!("Settings no longer match the active preset");
        }
        changes.len()
    }

    /// Open the first path and add the others to the scene
    pub fn open_files(&mut self, paths: &[PathBuf]) {
        let Some((first, rest)) = paths.split_first() else {
            return;
        };
        if self.open_file(first) {
            for path in rest {
                self.add_file(path);
            }
        }
    }

    /// Replace the scene with `path`.
    ///
    /// With auto-best on, the up axis for the file type is applied first and
    /// then the matching preset.
    pub fn open_file(&mut self, path: &Path) -> bool {
        if self.registry.bool(SettingKey::AutoBest) {
            let up = UpDirection::for_path(path);
            self.registry
                .set(SettingKey::Up, up.as_str(), ChangeSource::External);

            let key = self.presets.select_preset_for(path).to_string();
            if let Err(e) = self.presets.apply_preset(&key, &mut self.registry) {
                tracing::error!("{e}");
            }
        }
        self.process_changes();

        // A reload still parsing belongs to the scene being replaced
        self.reload.cancel();
        let loaded = self.viewer.load_file(path);
        if !loaded {
            self.notices
                .push(Notice::error(format!("Could not open {}", display_name(path))));
        }
        self.refresh_watch();
        loaded
    }

    pub fn add_file(&mut self, path: &Path) -> bool {
        self.reload.cancel();
        let added = self.viewer.add_file(path);
        if !added {
            self.notices
                .push(Notice::error(format!("Could not add {}", display_name(path))));
        }
        self.refresh_watch();
        added
    }

    /// Apply a preset chosen by the user
    pub fn apply_preset(&mut self, key: &str) -> Result<(), PresetError> {
        self.presets.apply_preset(key, &mut self.registry)?;
        self.process_changes();
        Ok(())
    }

    /// Save the current settings as a user preset
    pub fn save_preset(&mut self, name: &str, formats: &str) -> Result<String, PresetError> {
        let key = self.presets.save_current(name, formats, &self.registry)?;
        self.notices.push(Notice::info(format!("Saved preset \"{name}\"")));
        Ok(key)
    }

    /// Parse the current scene again in the background
    pub fn request_reload(&mut self) {
        let files = self.viewer.files().to_vec();
        if !files.is_empty() {
            self.reload.request(files);
        }
    }

    /// Check the watcher and the reload worker. Returns whether the scene
    /// changed.
    pub fn poll_background(&mut self) -> bool {
        let modified = self
            .watcher
            .as_ref()
            .map(FileWatcher::changed_files)
            .unwrap_or_default();
        if !modified.is_empty() && self.registry.bool(SettingKey::AutoReload) {
            tracing::info!("{} changed on disk, reloading", display_name(&modified[0]));
            self.request_reload();
        }

        match self.reload.poll() {
            Some(outcome) => self.show_reload(outcome),
            None => false,
        }
    }

    /// Block until a pending reload lands
    pub fn finish_reload(&mut self, timeout: std::time::Duration) -> bool {
        match self.reload.wait(timeout) {
            Some(outcome) => self.show_reload(outcome),
            None => false,
        }
    }

    fn show_reload(&mut self, outcome: ReloadOutcome) -> bool {
        match outcome {
            ReloadOutcome::Loaded(models) => {
                let mut shown = false;
                for (i, model) in models.into_iter().enumerate() {
                    let update = if i == 0 {
                        SceneUpdate::Reload
                    } else {
                        SceneUpdate::Add
                    };
                    shown |= self.viewer.show_model(model, update);
                }
                shown
            }
            ReloadOutcome::Failed { path, error } => {
                tracing::error!("Reload failed: {error}");
                self.notices
                    .push(Notice::error(format!("Could not reload {}", display_name(&path))));
                false
            }
        }
    }

    fn refresh_watch(&mut self) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        let result = if self.registry.bool(SettingKey::AutoReload) {
            watcher.watch_files(self.viewer.files())
        } else {
            watcher.unwatch_all();
            Ok(())
        };
        if let Err(e) = result {
            tracing::warn!("{e}");
        }
    }

    /// Persist shell state. Called when the window closes.
    pub fn save_window_state(&mut self, width: f32, height: f32) {
        self.window.width = width;
        self.window.height = height;
        self.window.store(self.store.as_mut());
        if let Err(e) = self.store.flush() {
            tracing::error!("Failed to save window state: {e}");
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
