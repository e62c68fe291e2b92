use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which part of the application a setting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingCategory {
    /// Forwarded to the renderer and saved in presets
    View,
    /// Saved in presets, never seen by the renderer
    Other,
    /// Application state, neither in presets nor in the renderer
    Internal,
}

/// A setting value as stored in the registry and in preset files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Rgb([f64; 3]),
    Text(String),
}

/// Discriminant of [`SettingValue`], used for type checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Rgb,
    Text,
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Null => ValueKind::Null,
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Int(_) => ValueKind::Int,
            SettingValue::Float(_) => ValueKind::Float,
            SettingValue::Rgb(_) => ValueKind::Rgb,
            SettingValue::Text(_) => ValueKind::Text,
        }
    }

    /// Convert `self` to the kind of `template`.
    ///
    /// Integers widen to floats; every other kind change is refused.
    pub fn coerce_like(&self, template: &SettingValue) -> Option<SettingValue> {
        match (self, template) {
            (SettingValue::Int(i), SettingValue::Float(_)) => Some(SettingValue::Float(*i as f64)),
            (value, template) if value.kind() == template.kind() => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<[f64; 3]> {
        match self {
            SettingValue::Rgb(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<[f64; 3]> for SettingValue {
    fn from(value: [f64; 3]) -> Self {
        SettingValue::Rgb(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Null => write!(f, "null"),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Float(v) => write!(f, "{v}"),
            SettingValue::Rgb([r, g, b]) => write!(f, "({r}, {g}, {b})"),
            SettingValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Every setting the viewer knows about.
///
/// The wire name (`as_str`) is the key used in preset files and in the
/// persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    // View
    TranslucencySupport,
    ToneMapping,
    AmbientOcclusion,
    AntiAliasing,
    HdriAmbient,
    LightIntensity,
    ShowEdges,
    EdgesWidth,
    SpriteEnabled,
    PointSize,
    SpritesType,
    SpritesSize,
    ModelMetallic,
    ModelRoughness,
    ModelOpacity,
    ArmatureEnable,
    ScivisComponent,
    Cells,
    ScivisEnabled,
    ModelColor,
    Grid,
    GridAbsolute,
    HdriSkybox,
    HdriFile,
    BlurBackground,
    BlurCoc,
    BgColor,
    Up,
    Orthographic,
    AnimationIndex,
    AnimationTime,
    NormalScale,
    Volume,
    Inverse,
    GridColor,
    // Other
    UseColor,
    PointUp,
    AutoReload,
    // Internal
    AutoBest,
    SidebarShow,
}

impl SettingKey {
    /// All keys in registry order: view, other, internal
    pub const ALL: [SettingKey; 40] = [
        SettingKey::TranslucencySupport,
        SettingKey::ToneMapping,
        SettingKey::AmbientOcclusion,
        SettingKey::AntiAliasing,
        SettingKey::HdriAmbient,
        SettingKey::LightIntensity,
        SettingKey::ShowEdges,
        SettingKey::EdgesWidth,
        SettingKey::SpriteEnabled,
        SettingKey::PointSize,
        SettingKey::SpritesType,
        SettingKey::SpritesSize,
        SettingKey::ModelMetallic,
        SettingKey::ModelRoughness,
        SettingKey::ModelOpacity,
        SettingKey::ArmatureEnable,
        SettingKey::ScivisComponent,
        SettingKey::Cells,
        SettingKey::ScivisEnabled,
        SettingKey::ModelColor,
        SettingKey::Grid,
        SettingKey::GridAbsolute,
        SettingKey::HdriSkybox,
        SettingKey::HdriFile,
        SettingKey::BlurBackground,
        SettingKey::BlurCoc,
        SettingKey::BgColor,
        SettingKey::Up,
        SettingKey::Orthographic,
        SettingKey::AnimationIndex,
        SettingKey::AnimationTime,
        SettingKey::NormalScale,
        SettingKey::Volume,
        SettingKey::Inverse,
        SettingKey::GridColor,
        SettingKey::UseColor,
        SettingKey::PointUp,
        SettingKey::AutoReload,
        SettingKey::AutoBest,
        SettingKey::SidebarShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::TranslucencySupport => "translucency-support",
            SettingKey::ToneMapping => "tone-mapping",
            SettingKey::AmbientOcclusion => "ambient-occlusion",
            SettingKey::AntiAliasing => "anti-aliasing",
            SettingKey::HdriAmbient => "hdri-ambient",
            SettingKey::LightIntensity => "light-intensity",
            SettingKey::ShowEdges => "show-edges",
            SettingKey::EdgesWidth => "edges-width",
            SettingKey::SpriteEnabled => "sprite-enabled",
            SettingKey::PointSize => "point-size",
            SettingKey::SpritesType => "sprites-type",
            SettingKey::SpritesSize => "sprites-size",
            SettingKey::ModelMetallic => "model-metallic",
            SettingKey::ModelRoughness => "model-roughness",
            SettingKey::ModelOpacity => "model-opacity",
            SettingKey::ArmatureEnable => "armature-enable",
            SettingKey::ScivisComponent => "scivis-component",
            SettingKey::Cells => "cells",
            SettingKey::ScivisEnabled => "scivis-enabled",
            SettingKey::ModelColor => "model-color",
            SettingKey::Grid => "grid",
            SettingKey::GridAbsolute => "grid-absolute",
            SettingKey::HdriSkybox => "hdri-skybox",
            SettingKey::HdriFile => "hdri-file",
            SettingKey::BlurBackground => "blur-background",
            SettingKey::BlurCoc => "blur-coc",
            SettingKey::BgColor => "bg-color",
            SettingKey::Up => "up",
            SettingKey::Orthographic => "orthographic",
            SettingKey::AnimationIndex => "animation-index",
            SettingKey::AnimationTime => "animation-time",
            SettingKey::NormalScale => "normal-scale",
            SettingKey::Volume => "volume",
            SettingKey::Inverse => "inverse",
            SettingKey::GridColor => "grid-color",
            SettingKey::UseColor => "use-color",
            SettingKey::PointUp => "point-up",
            SettingKey::AutoReload => "auto-reload",
            SettingKey::AutoBest => "auto-best",
            SettingKey::SidebarShow => "sidebar-show",
        }
    }

    pub fn category(&self) -> SettingCategory {
        match self {
            SettingKey::UseColor | SettingKey::PointUp | SettingKey::AutoReload => {
                SettingCategory::Other
            }
            SettingKey::AutoBest | SettingKey::SidebarShow => SettingCategory::Internal,
            _ => SettingCategory::View,
        }
    }

    /// Value a fresh registry starts with
    pub fn default_value(&self) -> SettingValue {
        match self {
            SettingKey::TranslucencySupport => true.into(),
            SettingKey::ToneMapping => true.into(),
            SettingKey::AmbientOcclusion => false.into(),
            SettingKey::AntiAliasing => true.into(),
            SettingKey::HdriAmbient => false.into(),
            SettingKey::LightIntensity => 1.5.into(),
            SettingKey::ShowEdges => false.into(),
            SettingKey::EdgesWidth => 1.0.into(),
            SettingKey::SpriteEnabled => false.into(),
            SettingKey::PointSize => 1.0.into(),
            SettingKey::SpritesType => "sphere".into(),
            SettingKey::SpritesSize => 1.0.into(),
            SettingKey::ModelMetallic => 0.0.into(),
            SettingKey::ModelRoughness => 0.3.into(),
            SettingKey::ModelOpacity => 1.0.into(),
            SettingKey::ArmatureEnable => false.into(),
            SettingKey::ScivisComponent => (-1i64).into(),
            SettingKey::Cells => true.into(),
            SettingKey::ScivisEnabled => false.into(),
            SettingKey::ModelColor => [1.0, 1.0, 1.0].into(),
            SettingKey::Grid => true.into(),
            SettingKey::GridAbsolute => false.into(),
            SettingKey::HdriSkybox => false.into(),
            SettingKey::HdriFile => "".into(),
            SettingKey::BlurBackground => true.into(),
            SettingKey::BlurCoc => 20.0.into(),
            SettingKey::BgColor => [1.0, 1.0, 1.0].into(),
            SettingKey::Up => "+Y".into(),
            SettingKey::Orthographic => false.into(),
            SettingKey::AnimationIndex => 0i64.into(),
            SettingKey::AnimationTime => 0.0.into(),
            SettingKey::NormalScale => 1.0.into(),
            SettingKey::Volume => false.into(),
            SettingKey::Inverse => false.into(),
            SettingKey::GridColor => [0.0, 0.0, 0.0].into(),
            SettingKey::UseColor => false.into(),
            SettingKey::PointUp => true.into(),
            SettingKey::AutoReload => true.into(),
            SettingKey::AutoBest => true.into(),
            SettingKey::SidebarShow => true.into(),
        }
    }

    /// Renderer option this setting drives, if any.
    ///
    /// Settings returning `None` are application-level and never reach the
    /// renderer.
    pub fn engine_option(&self) -> Option<EngineOption> {
        let option = match self {
            SettingKey::TranslucencySupport => EngineOption::TranslucencySupport,
            SettingKey::ToneMapping => EngineOption::ToneMapping,
            SettingKey::AmbientOcclusion => EngineOption::AmbientOcclusion,
            SettingKey::AntiAliasing => EngineOption::AntiAliasing,
            SettingKey::HdriAmbient => EngineOption::HdriAmbient,
            SettingKey::LightIntensity => EngineOption::LightIntensity,
            SettingKey::ShowEdges => EngineOption::ShowEdges,
            SettingKey::EdgesWidth => EngineOption::LineWidth,
            SettingKey::SpriteEnabled => EngineOption::PointSpritesEnable,
            SettingKey::PointSize => EngineOption::PointSize,
            SettingKey::SpritesType => EngineOption::PointSpritesType,
            SettingKey::SpritesSize => EngineOption::PointSpritesSize,
            SettingKey::ModelMetallic => EngineOption::MaterialMetallic,
            SettingKey::ModelRoughness => EngineOption::MaterialRoughness,
            SettingKey::ModelOpacity => EngineOption::ColorOpacity,
            SettingKey::ArmatureEnable => EngineOption::ArmatureEnable,
            SettingKey::ScivisComponent => EngineOption::ScivisComponent,
            SettingKey::Cells => EngineOption::ScivisCells,
            SettingKey::ModelColor => EngineOption::ColorRgb,
            SettingKey::Grid => EngineOption::GridEnable,
            SettingKey::GridAbsolute => EngineOption::GridAbsolute,
            SettingKey::HdriSkybox => EngineOption::BackgroundSkybox,
            SettingKey::HdriFile => EngineOption::HdriFile,
            SettingKey::BlurBackground => EngineOption::BackgroundBlurEnable,
            SettingKey::BlurCoc => EngineOption::BackgroundBlurCoc,
            SettingKey::BgColor => EngineOption::BackgroundColor,
            SettingKey::Up => EngineOption::UpDirection,
            SettingKey::Orthographic => EngineOption::CameraOrthographic,
            SettingKey::AnimationIndex => EngineOption::AnimationIndex,
            SettingKey::AnimationTime => EngineOption::AnimationTime,
            SettingKey::NormalScale => EngineOption::NormalScale,
            SettingKey::Volume => EngineOption::VolumeEnable,
            SettingKey::Inverse => EngineOption::VolumeInverse,
            SettingKey::GridColor => EngineOption::GridColor,
            SettingKey::ScivisEnabled
            | SettingKey::UseColor
            | SettingKey::PointUp
            | SettingKey::AutoReload
            | SettingKey::AutoBest
            | SettingKey::SidebarShow => return None,
        };
        Some(option)
    }

    /// Keys of a category, in registry order
    pub fn in_category(category: SettingCategory) -> impl Iterator<Item = SettingKey> {
        Self::ALL.into_iter().filter(move |k| k.category() == category)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known setting name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSetting(pub String);

impl fmt::Display for UnknownSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown setting '{}'", self.0)
    }
}

impl std::error::Error for UnknownSetting {}

impl FromStr for SettingKey {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownSetting(s.to_string()))
    }
}

/// Options understood by the render engine.
///
/// `key()` is the dotted option name the engine documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineOption {
    TranslucencySupport,
    ToneMapping,
    AmbientOcclusion,
    AntiAliasing,
    HdriAmbient,
    LightIntensity,
    ShowEdges,
    LineWidth,
    PointSpritesEnable,
    PointSize,
    PointSpritesType,
    PointSpritesSize,
    MaterialMetallic,
    MaterialRoughness,
    ColorOpacity,
    ArmatureEnable,
    ScivisComponent,
    ScivisCells,
    ColorRgb,
    GridEnable,
    GridAbsolute,
    BackgroundSkybox,
    HdriFile,
    BackgroundBlurEnable,
    BackgroundBlurCoc,
    BackgroundColor,
    UpDirection,
    CameraOrthographic,
    AnimationIndex,
    AnimationTime,
    NormalScale,
    VolumeEnable,
    VolumeInverse,
    GridColor,
}

impl EngineOption {
    pub fn key(&self) -> &'static str {
        match self {
            EngineOption::TranslucencySupport => "render.effect.translucency_support",
            EngineOption::ToneMapping => "render.effect.tone_mapping",
            EngineOption::AmbientOcclusion => "render.effect.ambient_occlusion",
            EngineOption::AntiAliasing => "render.effect.anti_aliasing",
            EngineOption::HdriAmbient => "render.hdri.ambient",
            EngineOption::LightIntensity => "render.light.intensity",
            EngineOption::ShowEdges => "render.show_edges",
            EngineOption::LineWidth => "render.line_width",
            EngineOption::PointSpritesEnable => "model.point_sprites.enable",
            EngineOption::PointSize => "render.point_size",
            EngineOption::PointSpritesType => "model.point_sprites.type",
            EngineOption::PointSpritesSize => "model.point_sprites.size",
            EngineOption::MaterialMetallic => "model.material.metallic",
            EngineOption::MaterialRoughness => "model.material.roughness",
            EngineOption::ColorOpacity => "model.color.opacity",
            EngineOption::ArmatureEnable => "render.armature.enable",
            EngineOption::ScivisComponent => "model.scivis.component",
            EngineOption::ScivisCells => "model.scivis.cells",
            EngineOption::ColorRgb => "model.color.rgb",
            EngineOption::GridEnable => "render.grid.enable",
            EngineOption::GridAbsolute => "render.grid.absolute",
            EngineOption::BackgroundSkybox => "render.background.skybox",
            EngineOption::HdriFile => "render.hdri.file",
            EngineOption::BackgroundBlurEnable => "render.background.blur.enable",
            EngineOption::BackgroundBlurCoc => "render.background.blur.coc",
            EngineOption::BackgroundColor => "render.background.color",
            EngineOption::UpDirection => "scene.up_direction",
            EngineOption::CameraOrthographic => "scene.camera.orthographic",
            EngineOption::AnimationIndex => "scene.animation.index",
            EngineOption::AnimationTime => "scene.animation.time",
            EngineOption::NormalScale => "model.normal.scale",
            EngineOption::VolumeEnable => "model.volume.enable",
            EngineOption::VolumeInverse => "model.volume.inverse",
            EngineOption::GridColor => "render.grid.color",
        }
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!("not-a-setting".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_wire_names_unique() {
        let mut names: Vec<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SettingKey::ALL.len());
    }

    #[test]
    fn test_categories() {
        assert_eq!(SettingKey::in_category(SettingCategory::Other).count(), 3);
        assert_eq!(SettingKey::in_category(SettingCategory::Internal).count(), 2);
        assert_eq!(SettingKey::in_category(SettingCategory::View).count(), 35);
        assert_eq!(SettingKey::Up.category(), SettingCategory::View);
        assert_eq!(SettingKey::PointUp.category(), SettingCategory::Other);
    }

    #[test]
    fn test_only_view_settings_reach_engine() {
        for key in SettingKey::ALL {
            if key.engine_option().is_some() {
                assert_eq!(key.category(), SettingCategory::View, "{key}");
            }
        }
        assert_eq!(SettingKey::Up.engine_option().unwrap().key(), "scene.up_direction");
        assert_eq!(SettingKey::ScivisEnabled.engine_option(), None);
    }

    #[test]
    fn test_value_from_json() {
        let v: SettingValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, SettingValue::Bool(true));
        let v: SettingValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, SettingValue::Int(3));
        let v: SettingValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(v, SettingValue::Float(0.25));
        let v: SettingValue = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(v, SettingValue::Rgb([0.1, 0.2, 0.3]));
        let v: SettingValue = serde_json::from_str("\"+Z\"").unwrap();
        assert_eq!(v, SettingValue::Text("+Z".into()));
        let v: SettingValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, SettingValue::Null);
    }

    #[test]
    fn test_coerce_like() {
        let float = SettingValue::Float(1.0);
        assert_eq!(SettingValue::Int(2).coerce_like(&float), Some(SettingValue::Float(2.0)));
        assert_eq!(SettingValue::Bool(true).coerce_like(&float), None);
        assert_eq!(
            SettingValue::Text("a".into()).coerce_like(&SettingValue::Text(String::new())),
            Some(SettingValue::Text("a".into()))
        );
        assert_eq!(SettingValue::Float(1.5).coerce_like(&SettingValue::Int(0)), None);
    }
}
