//! Adapter between the settings world and the render engine.
//!
//! The viewer owns the engine (if one could be created) and the camera
//! navigator. Without an engine every operation is a logged no-op.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use shared::{EngineOption, SettingKey, SettingValue, UpDirection};

use crate::engine::{EngineError, RenderEngine};
use crate::model::{self, Aabb, LoadedModel};
use crate::navigation::{CameraNavigator, DragButton, OrbitDirection, ViewPreset};

/// How a freshly parsed model enters the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneUpdate {
    /// Replace the scene and frame the new model
    Open,
    /// Add to the scene, keep the camera
    Add,
    /// Replace the scene, keep the camera
    Reload,
}

pub struct Viewer {
    engine: Option<Box<dyn RenderEngine>>,
    options: BTreeMap<EngineOption, SettingValue>,
    navigator: CameraNavigator,
    files: Vec<PathBuf>,
}

impl Viewer {
    pub fn new(engine: Box<dyn RenderEngine>) -> Self {
        Self {
            engine: Some(engine),
            options: BTreeMap::new(),
            navigator: CameraNavigator::default(),
            files: Vec::new(),
        }
    }

    /// Viewer without a backend
    pub fn inert() -> Self {
        Self {
            engine: None,
            options: BTreeMap::new(),
            navigator: CameraNavigator::default(),
            files: Vec::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&dyn RenderEngine> {
        self.engine.as_deref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut (dyn RenderEngine + 'static)> {
        self.engine.as_deref_mut()
    }

    pub fn navigator(&self) -> &CameraNavigator {
        &self.navigator
    }

    /// Files currently in the scene, first opened first
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Last value forwarded for an option
    pub fn option(&self, option: EngineOption) -> Option<&SettingValue> {
        self.options.get(&option)
    }

    /// Forward the settings that map to engine options; everything else is
    /// dropped. Returns how many options were sent.
    pub fn update_options<I>(&mut self, settings: I) -> usize
    where
        I: IntoIterator<Item = (SettingKey, SettingValue)>,
    {
        let options: Vec<(EngineOption, SettingValue)> = settings
            .into_iter()
            .filter_map(|(key, value)| key.engine_option().map(|option| (option, value)))
            .collect();
        if options.is_empty() {
            return 0;
        }

        for (option, value) in &options {
            self.options.insert(*option, value.clone());
            if *option == EngineOption::UpDirection {
                let up = value
                    .as_str()
                    .and_then(|s| s.parse::<UpDirection>().ok())
                    .unwrap_or_default();
                if let Some(engine) = self.engine.as_deref_mut() {
                    self.navigator.set_up(up, engine.camera_mut());
                } else {
                    self.navigator.up = up;
                }
            }
        }
        tracing::trace!("Forwarding {} option(s)", options.len());

        match self.engine.as_deref_mut() {
            Some(engine) => engine.update_options(&options),
            None => tracing::debug!("No render backend, options kept for later"),
        }
        options.len()
    }

    pub fn set_point_up(&mut self, point_up: bool) {
        match self.engine.as_deref_mut() {
            Some(engine) => self.navigator.set_point_up(point_up, engine.camera_mut()),
            None => self.navigator.point_up = point_up,
        }
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.engine.as_ref().is_some_and(|e| e.supports(path))
    }

    /// Clear the scene and show `path`. Returns whether it loaded.
    pub fn load_file(&mut self, path: &Path) -> bool {
        self.load(path, SceneUpdate::Open)
    }

    /// Add `path` to the current scene. Returns whether it loaded.
    pub fn add_file(&mut self, path: &Path) -> bool {
        self.load(path, SceneUpdate::Add)
    }

    fn load(&mut self, path: &Path, update: SceneUpdate) -> bool {
        if !self.is_ready() {
            tracing::warn!("Cannot load {}: no render backend", path.display());
            return false;
        }
        if !self.supports(path) {
            tracing::warn!("Unsupported file: {}", path.display());
            return false;
        }
        match model::load_model(path) {
            Ok(model) => self.show_model(model, update),
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    }

    /// Put an already parsed model into the scene
    pub fn show_model(&mut self, model: LoadedModel, update: SceneUpdate) -> bool {
        let Some(engine) = self.engine.as_deref_mut() else {
            return false;
        };
        let path = model.path.clone();
        if update != SceneUpdate::Add {
            engine.clear_scene();
            self.files.clear();
        }
        if let Err(e) = engine.add_model(model) {
            tracing::error!("Failed to show {}: {e}", path.display());
            return false;
        }

        let bounds = engine.scene_bounds();
        match update {
            SceneUpdate::Open => self.navigator.reset_to_bounds(engine.camera_mut(), &bounds),
            SceneUpdate::Add | SceneUpdate::Reload => {
                self.navigator.update_distance(engine.camera())
            }
        }
        tracing::info!("Showing {}", path.display());
        self.files.push(path);
        true
    }

    pub fn scene_bounds(&self) -> Aabb {
        self.engine.as_ref().map_or(Aabb::EMPTY, |e| e.scene_bounds())
    }

    /// Capture the current view
    pub fn render_image(&mut self, width: u32, height: u32) -> Result<RgbaImage, EngineError> {
        self.engine
            .as_deref_mut()
            .ok_or(EngineError::Unavailable)?
            .render_to_image(width, height)
    }

    /// Capture the current view and write it as PNG
    pub fn save_image(&mut self, path: &Path, width: u32, height: u32) -> Result<(), EngineError> {
        let image = self.render_image(width, height)?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        tracing::info!("Saved render to {}", path.display());
        Ok(())
    }

    pub fn orbit(&mut self, direction: OrbitDirection) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.navigator.orbit(engine.camera_mut(), direction);
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64, dz: f64) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.navigator.pan(engine.camera_mut(), dx, dy, dz);
        }
    }

    pub fn drag(&mut self, button: DragButton, delta: [f64; 2], viewport: [f64; 2]) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.navigator.drag(engine.camera_mut(), button, delta, viewport);
        }
    }

    pub fn scroll(&mut self, dy: f64) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.navigator.scroll(engine.camera_mut(), dy);
        }
    }

    pub fn pinch(&mut self, scale: f64) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.navigator.pinch(engine.camera_mut(), scale);
        }
    }

    pub fn end_pinch(&mut self) {
        self.navigator.end_pinch();
    }

    pub fn view(&mut self, preset: ViewPreset) {
        if let Some(engine) = self.engine.as_deref_mut() {
            let bounds = engine.scene_bounds();
            self.navigator.view(engine.camera_mut(), &bounds, preset);
        }
    }

    /// Re-read the camera distance after the camera was moved directly
    pub fn refresh_distance(&mut self) {
        if let Some(engine) = self.engine.as_deref() {
            self.navigator.update_distance(engine.camera());
        }
    }

    pub fn reset_to_bounds(&mut self) {
        if let Some(engine) = self.engine.as_deref_mut() {
            let bounds = engine.scene_bounds();
            self.navigator.reset_to_bounds(engine.camera_mut(), &bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeadlessEngine;
    use shared::SettingCategory;

    fn write_obj(dir: &tempfile::TempDir, name: &str, offset: f32) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(
            &path,
            format!("v {offset} 0 0\nv {} 0 0\nv {offset} 1 0\nf 1 2 3\n", offset + 1.0),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_only_engine_options_forwarded() {
        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        let sent = viewer.update_options(
            SettingKey::ALL.into_iter().map(|k| (k, k.default_value())),
        );
        let expected = SettingKey::ALL
            .iter()
            .filter(|k| k.engine_option().is_some())
            .count();
        assert_eq!(sent, expected);
        assert!(SettingKey::ALL
            .iter()
            .filter(|k| k.category() != SettingCategory::View)
            .all(|k| k.engine_option().is_none()));
    }

    #[test]
    fn test_up_option_drives_navigator() {
        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        viewer.update_options([(SettingKey::Up, SettingValue::from("-Z"))]);
        assert_eq!(viewer.navigator().up, UpDirection::NegZ);
        assert_eq!(
            viewer.engine().unwrap().camera().view_up,
            glam::DVec3::NEG_Z
        );
    }

    #[test]
    fn test_inert_viewer() {
        let mut viewer = Viewer::inert();
        assert!(!viewer.is_ready());
        assert!(!viewer.load_file(Path::new("/tmp/x.obj")));
        assert_eq!(viewer.update_options([(SettingKey::Grid, false.into())]), 1);
        assert_eq!(viewer.option(EngineOption::GridEnable), Some(&SettingValue::Bool(false)));
        assert!(matches!(viewer.render_image(2, 2), Err(EngineError::Unavailable)));
        viewer.orbit(OrbitDirection::Left);
    }

    #[test]
    fn test_load_and_add() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_obj(&dir, "a.obj", 0.0);
        let b = write_obj(&dir, "b.obj", 10.0);

        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        assert!(viewer.load_file(&a));
        assert!(viewer.add_file(&b));
        assert_eq!(viewer.files(), &[a.clone(), b]);
        assert_eq!(viewer.scene_bounds().max.x, 11.0);

        assert!(viewer.load_file(&a));
        assert_eq!(viewer.files(), &[a]);
    }

    #[test]
    fn test_failed_load_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        assert!(!viewer.load_file(&dir.path().join("missing.obj")));
        assert!(!viewer.load_file(Path::new("scene.unknown")));
        assert!(viewer.files().is_empty());
    }

    #[test]
    fn test_open_frames_model() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_obj(&dir, "a.obj", 100.0);
        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        viewer.load_file(&a);
        let camera = viewer.engine().unwrap().camera().clone();
        assert_eq!(camera.focal_point, viewer.scene_bounds().center());
        assert!((viewer.navigator().distance() - camera.distance()).abs() < 1e-9);
    }

    #[test]
    fn test_save_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut viewer = Viewer::new(Box::new(HeadlessEngine::new()));
        viewer.save_image(&path, 8, 8).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 8);
    }
}
