//! Data model shared by the viewer library and the desktop shell.
//!
//! Everything here is plain data: setting keys and values, the mapping from
//! settings to renderer options, up directions, colour conversion and the
//! on-disk preset document format.

pub mod color;
pub mod preset;
pub mod settings;
pub mod up;

pub use color::{list_to_rgb, rgb_to_list};
pub use preset::{PresetDocument, PresetFile};
pub use settings::{EngineOption, SettingCategory, SettingKey, SettingValue, ValueKind};
pub use up::UpDirection;
