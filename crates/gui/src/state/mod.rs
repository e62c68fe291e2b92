pub mod paths;
pub mod presets;
pub mod settings;
pub mod store;

pub use paths::AppPaths;
pub use presets::{ActivePreset, Preset, PresetCatalog, PresetError, CUSTOM_TAG, GENERAL_PRESET};
pub use settings::{ChangeSource, Setting, SettingChange, SettingRegistry};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError, WindowState};
