//! Boundary between the viewer and whatever draws the scene.

mod camera;
mod headless;

use std::path::{Path, PathBuf};

use image::RgbaImage;
use shared::{EngineOption, SettingValue};

use crate::model::{Aabb, LoadedModel};

pub use camera::Camera;
pub use headless::{HeadlessEngine, OptionLog};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("backend '{backend}' unavailable: {reason}")]
    Init { backend: String, reason: String },
    #[error("unsupported file: {0}")]
    Unsupported(PathBuf),
    #[error("render failed: {0}")]
    Render(String),
    #[error("no render backend available")]
    Unavailable,
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A scene renderer.
///
/// Options arrive already translated to [`EngineOption`]s; the engine keeps
/// the last value of each and applies it on the next frame.
pub trait RenderEngine {
    fn backend_name(&self) -> &str;

    fn update_options(&mut self, options: &[(EngineOption, SettingValue)]);

    fn clear_scene(&mut self);

    fn add_model(&mut self, model: LoadedModel) -> Result<(), EngineError>;

    fn supports(&self, path: &Path) -> bool {
        crate::model::supports(path)
    }

    fn scene_bounds(&self) -> Aabb;

    /// Draw the current view offscreen
    fn render_to_image(&mut self, width: u32, height: u32) -> Result<RgbaImage, EngineError>;

    fn camera(&self) -> &Camera;

    fn camera_mut(&mut self) -> &mut Camera;

    fn reset_camera_to_bounds(&mut self) {
        let bounds = self.scene_bounds();
        self.camera_mut().reset_to_bounds(&bounds);
    }
}

pub type BackendFactory = Box<dyn FnOnce() -> Result<Box<dyn RenderEngine>, EngineError>>;

/// One way of creating an engine, tried in preference order
pub struct BackendCandidate {
    pub name: &'static str,
    pub create: BackendFactory,
}

impl BackendCandidate {
    pub fn new(
        name: &'static str,
        create: impl FnOnce() -> Result<Box<dyn RenderEngine>, EngineError> + 'static,
    ) -> Self {
        Self {
            name,
            create: Box::new(create),
        }
    }
}

/// Create the first backend that initializes.
///
/// Logs a critical error and returns every failure when no candidate
/// initializes.
pub fn init_first_available(
    candidates: Vec<BackendCandidate>,
) -> Result<Box<dyn RenderEngine>, Vec<EngineError>> {
    let mut failures = Vec::new();
    for candidate in candidates {
        match (candidate.create)() {
            Ok(engine) => {
                tracing::info!("Using render backend '{}'", candidate.name);
                return Ok(engine);
            }
            Err(e) => {
                tracing::warn!("{e}");
                failures.push(e);
            }
        }
    }
    tracing::error!("CRITICAL: no render backend could be initialized");
    Err(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(name: &'static str) -> BackendCandidate {
        BackendCandidate::new(name, move || {
            Err(EngineError::Init {
                backend: name.to_string(),
                reason: "no display".to_string(),
            })
        })
    }

    #[test]
    fn test_first_available_wins() {
        let engine = init_first_available(vec![
            failing("egl"),
            BackendCandidate::new("headless", || Ok(Box::new(HeadlessEngine::new()))),
            BackendCandidate::new("never", || panic!("must not be tried")),
        ])
        .unwrap();
        assert_eq!(engine.backend_name(), "headless");
    }

    #[test]
    fn test_all_fail() {
        let failures = init_first_available(vec![failing("egl"), failing("osmesa")])
            .err()
            .unwrap();
        assert_eq!(failures.len(), 2);
    }
}
