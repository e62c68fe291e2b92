use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use shared::{list_to_rgb, EngineOption, SettingValue};

use super::{Camera, EngineError, RenderEngine};
use crate::model::{Aabb, LoadedModel};

/// Every option update an engine received, in arrival order. Clones share
/// the same log, so it stays readable after the engine is boxed away.
#[derive(Debug, Clone, Default)]
pub struct OptionLog(Arc<Mutex<Vec<(EngineOption, SettingValue)>>>);

impl OptionLog {
    fn push(&self, option: EngineOption, value: SettingValue) {
        if let Ok(mut log) = self.0.lock() {
            log.push((option, value));
        }
    }

    pub fn entries(&self) -> Vec<(EngineOption, SettingValue)> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.0.lock() {
            log.clear();
        }
    }

    /// Index of the first update of `option`
    pub fn position(&self, option: EngineOption) -> Option<usize> {
        self.entries().iter().position(|(o, _)| *o == option)
    }

    /// Last value sent for `option`
    pub fn last(&self, option: EngineOption) -> Option<SettingValue> {
        self.entries()
            .into_iter()
            .rev()
            .find(|(o, _)| *o == option)
            .map(|(_, v)| v)
    }
}

/// Engine without a GPU. Keeps the scene and options in memory and renders
/// the background colour only.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    options: BTreeMap<EngineOption, SettingValue>,
    log: OptionLog,
    models: Vec<LoadedModel>,
    camera: Camera,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(&self, option: EngineOption) -> Option<&SettingValue> {
        self.options.get(&option)
    }

    pub fn log(&self) -> OptionLog {
        self.log.clone()
    }

    pub fn models(&self) -> &[LoadedModel] {
        &self.models
    }
}

impl RenderEngine for HeadlessEngine {
    fn backend_name(&self) -> &str {
        "headless"
    }

    fn update_options(&mut self, options: &[(EngineOption, SettingValue)]) {
        for (option, value) in options {
            if *option == EngineOption::CameraOrthographic {
                self.camera.orthographic = value.as_bool().unwrap_or(false);
            }
            self.options.insert(*option, value.clone());
            self.log.push(*option, value.clone());
        }
    }

    fn clear_scene(&mut self) {
        self.models.clear();
    }

    fn add_model(&mut self, model: LoadedModel) -> Result<(), EngineError> {
        self.models.push(model);
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
        let [r, g, b] = self
            .options
            .get(&EngineOption::BackgroundColor)
            .and_then(SettingValue::as_rgb)
            .map_or([255, 255, 255], list_to_rgb);
        Ok(RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])))
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_options_in_order() {
        let mut engine = HeadlessEngine::new();
        let log = engine.log();
        engine.update_options(&[
            (EngineOption::UpDirection, "+Z".into()),
            (EngineOption::GridEnable, false.into()),
        ]);
        engine.update_options(&[(EngineOption::GridEnable, true.into())]);
        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.position(EngineOption::UpDirection), Some(0));
        assert_eq!(log.last(EngineOption::GridEnable), Some(SettingValue::Bool(true)));
        assert_eq!(engine.option(EngineOption::GridEnable), Some(&SettingValue::Bool(true)));

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_render_uses_background() {
        let mut engine = HeadlessEngine::new();
        engine.update_options(&[(EngineOption::BackgroundColor, [1.0, 0.0, 0.0].into())]);
        let img = engine.render_to_image(4, 2).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert!(engine.render_to_image(0, 2).is_err());
    }

    #[test]
    fn test_orthographic_option_reaches_camera() {
        let mut engine = HeadlessEngine::new();
        engine.update_options(&[(EngineOption::CameraOrthographic, true.into())]);
        assert!(engine.camera().orthographic);
    }
}
