//! OpenGL implementation of the render engine, drawing through the eframe
//! glow context.

use std::sync::{Arc, Mutex};

use exhibit_lib::engine::{BackendCandidate, Camera, EngineError, RenderEngine};
use exhibit_lib::model::{Aabb, LoadedModel};
use glam::DVec3;
use image::RgbaImage;
use shared::{EngineOption, SettingValue, UpDirection};

use super::gl_renderer::{GlRenderer, ShaderDialect};

/// Handle on the GPU renderer shared with the viewport's paint callback
pub type SharedRenderer = Arc<Mutex<GlRenderer>>;

pub struct GlEngine {
    name: &'static str,
    gl: Arc<glow::Context>,
    renderer: SharedRenderer,
    models: Vec<LoadedModel>,
    camera: Camera,
}

impl GlEngine {
    pub fn new(
        name: &'static str,
        gl: Arc<glow::Context>,
        dialect: ShaderDialect,
    ) -> Result<Self, EngineError> {
        let renderer = GlRenderer::new(&gl, dialect).map_err(|reason| EngineError::Init {
            backend: name.to_string(),
            reason,
        })?;
        Ok(Self {
            name,
            gl,
            renderer: Arc::new(Mutex::new(renderer)),
            models: Vec::new(),
            camera: Camera::default(),
        })
    }

    pub fn renderer(&self) -> SharedRenderer {
        self.renderer.clone()
    }

    fn upload_scene(&self) {
        let meshes = self
            .models
            .iter()
            .flat_map(|m| m.meshes.iter().cloned())
            .collect();
        if let Ok(mut r) = self.renderer.lock() {
            r.set_scene(meshes, self.scene_bounds());
        }
    }
}

fn rgb(value: &SettingValue) -> Option<[f32; 3]> {
    value.as_rgb().map(|[r, g, b]| [r as f32, g as f32, b as f32])
}

impl RenderEngine for GlEngine {
    fn backend_name(&self) -> &str {
        self.name
    }

    fn update_options(&mut self, options: &[(EngineOption, SettingValue)]) {
        let Ok(mut r) = self.renderer.lock() else {
            return;
        };
        let params = &mut r.params;
        for (option, value) in options {
            match option {
                EngineOption::BackgroundColor => {
                    if let Some(c) = rgb(value) {
                        params.bg_color = c;
                    }
                }
                EngineOption::ColorRgb => {
                    if let Some(c) = rgb(value) {
                        params.model_color = c;
                    }
                }
                EngineOption::GridColor => {
                    if let Some(c) = rgb(value) {
                        params.grid_color = c;
                    }
                }
                EngineOption::ColorOpacity => {
                    params.opacity = value.as_f64().unwrap_or(1.0).clamp(0.0, 1.0) as f32
                }
                EngineOption::LightIntensity => {
                    params.light_intensity = value.as_f64().unwrap_or(1.0) as f32
                }
                EngineOption::MaterialRoughness => {
                    params.roughness = value.as_f64().unwrap_or(0.3) as f32
                }
                EngineOption::PointSize => {
                    params.point_size = value.as_f64().unwrap_or(1.0).max(1.0) as f32
                }
                EngineOption::GridEnable => params.grid_visible = value.as_bool().unwrap_or(true),
                EngineOption::GridAbsolute => {
                    params.grid_absolute = value.as_bool().unwrap_or(false)
                }
                EngineOption::UpDirection => {
                    let up = value
                        .as_str()
                        .and_then(|s| s.parse::<UpDirection>().ok())
                        .unwrap_or_default();
                    params.up = DVec3::from_array(up.vector());
                }
                EngineOption::CameraOrthographic => {
                    self.camera.orthographic = value.as_bool().unwrap_or(false)
                }
                other => tracing::trace!("{} not handled by the OpenGL backend", other.key()),
            }
        }
    }

    fn clear_scene(&mut self) {
        self.models.clear();
        self.upload_scene();
    }

    fn add_model(&mut self, model: LoadedModel) -> Result<(), EngineError> {
        if model.meshes.is_empty() {
            return Err(EngineError::Render(format!(
                "{} has no geometry",
                model.path.display()
            )));
        }
        self.models.push(model);
        self.upload_scene();
        Ok(())
    }

    fn scene_bounds(&self) -> Aabb {
        self.models
            .iter()
            .fold(Aabb::EMPTY, |acc, m| acc.union(&m.bounds))
    }

    fn render_to_image(&mut self, width: u32, height: u32) -> Result<RgbaImage, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::Render(format!("invalid size {width}x{height}")));
        }
        let mut r = self
            .renderer
            .lock()
            .map_err(|_| EngineError::Render("renderer poisoned".to_string()))?;
        let pixels = r
            .paint_offscreen(&self.gl, &self.camera, width as i32, height as i32)
            .map_err(EngineError::Render)?;
        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| EngineError::Render("pixel buffer size mismatch".to_string()))
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

/// Backends in preference order: desktop GL first, then GLES.
///
/// `on_created` receives the renderer handle of whichever one initializes.
pub fn candidates(
    gl: Option<Arc<glow::Context>>,
    on_created: Arc<Mutex<Option<SharedRenderer>>>,
) -> Vec<BackendCandidate> {
    [("opengl", ShaderDialect::Core330), ("opengl-es", ShaderDialect::Es300)]
        .into_iter()
        .map(|(name, dialect)| {
            let gl = gl.clone();
            let on_created = on_created.clone();
            BackendCandidate::new(name, move || {
                let gl = gl.ok_or_else(|| EngineError::Init {
                    backend: name.to_string(),
                    reason: "no OpenGL context".to_string(),
                })?;
                let engine = GlEngine::new(name, gl, dialect)?;
                if let Ok(mut slot) = on_created.lock() {
                    *slot = Some(engine.renderer());
                }
                Ok(Box::new(engine) as Box<dyn RenderEngine>)
            })
        })
        .collect()
}
