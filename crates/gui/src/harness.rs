//! Headless test harness for driving a viewer session without a window.
//!
//! Wraps a [`Session`] built on the [`HeadlessEngine`], an in-memory store and
//! the built-in presets, and exposes the engine's option log and camera for
//! inspection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::DVec3;
use shared::{EngineOption, SettingKey, SettingValue};

use crate::engine::{Camera, HeadlessEngine, OptionLog};
use crate::navigation::{DragButton, OrbitDirection, ViewPreset};
use crate::reload::ReloadWorker;
use crate::session::{Notice, Session};
use crate::state::{MemoryStore, PresetCatalog};

/// Headless session plus a handle on what the engine received
pub struct TestHarness {
    pub session: Session,
    log: OptionLog,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with only the built-in presets
    pub fn new() -> Self {
        Self::with_presets(PresetCatalog::builtin())
    }

    /// Harness whose presets include the files in `dir`; saved presets go
    /// there too.
    pub fn with_user_presets(dir: &Path) -> Self {
        Self::with_presets(PresetCatalog::load(Some(dir.to_path_buf())))
    }

    pub fn with_presets(presets: PresetCatalog) -> Self {
        let engine = HeadlessEngine::new();
        let log = engine.log();
        let viewer = crate::viewer::Viewer::new(Box::new(engine));
        let session = Session::new(viewer, presets, Box::new(MemoryStore::default()));
        Self { session, log }
    }

    /// Replace the background reload worker, e.g. with a custom loader
    pub fn with_reload_worker(mut self, worker: ReloadWorker) -> Self {
        self.session = self.session.with_reload_worker(worker);
        self
    }

    // ── Settings ──────────────────────────────────────────────

    /// Change a setting as the user would
    pub fn set(&mut self, key: SettingKey, value: impl Into<SettingValue>) -> bool {
        self.session.set(key, value)
    }

    pub fn get(&self, key: SettingKey) -> &SettingValue {
        self.session.registry.get(key)
    }

    pub fn apply_preset(&mut self, key: &str) -> bool {
        self.session.apply_preset(key).is_ok()
    }

    /// Tag shown in the preset picker
    pub fn active_preset(&self) -> String {
        self.session.active_preset().tag().to_string()
    }

    // ── Files ─────────────────────────────────────────────────

    pub fn open(&mut self, path: &Path) -> bool {
        self.session.open_file(path)
    }

    pub fn add(&mut self, path: &Path) -> bool {
        self.session.add_file(path)
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.session.files().to_vec()
    }

    /// Ask for a reload and wait for it to land
    pub fn reload(&mut self) -> bool {
        self.session.request_reload();
        self.session.finish_reload(Duration::from_secs(5))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.session.take_notices()
    }

    // ── Engine inspection ─────────────────────────────────────

    /// Every option update the engine received, in order
    pub fn option_log(&self) -> &OptionLog {
        &self.log
    }

    pub fn engine_option(&self, option: EngineOption) -> Option<&SettingValue> {
        self.session.viewer.option(option)
    }

    pub fn camera(&self) -> Camera {
        self.session
            .viewer
            .engine()
            .map(|e| e.camera().clone())
            .unwrap_or_default()
    }

    pub fn set_camera(&mut self, position: DVec3, focal_point: DVec3, view_up: DVec3) {
        if let Some(engine) = self.session.viewer.engine_mut() {
            let cam = engine.camera_mut();
            cam.position = position;
            cam.focal_point = focal_point;
            cam.view_up = view_up;
        }
        self.session.viewer.refresh_distance();
    }

    // ── Navigation ────────────────────────────────────────────

    pub fn orbit(&mut self, direction: OrbitDirection) {
        self.session.viewer.orbit(direction);
    }

    pub fn pan(&mut self, dx: f64, dy: f64, dz: f64) {
        self.session.viewer.pan(dx, dy, dz);
    }

    pub fn drag(&mut self, button: DragButton, dx: f64, dy: f64) {
        self.session
            .viewer
            .drag(button, [dx, dy], [800.0, 600.0]);
    }

    pub fn scroll(&mut self, dy: f64) {
        self.session.viewer.scroll(dy);
    }

    pub fn view(&mut self, preset: ViewPreset) {
        self.session.viewer.view(preset);
    }
}
