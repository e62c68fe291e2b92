use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::SettingValue;

/// A preset as written in a configuration file.
///
/// Setting names are kept as strings here; validation against the known
/// settings happens when the preset is loaded into a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDocument {
    /// Display name
    pub name: String,
    /// Regular expression searched for in the file path
    pub formats: String,
    #[serde(rename = "view-settings")]
    pub view_settings: BTreeMap<String, SettingValue>,
    #[serde(rename = "other-settings")]
    pub other_settings: BTreeMap<String, SettingValue>,
}

/// A configuration file: preset key → preset, in file order
pub type PresetFile = serde_json::Map<String, serde_json::Value>;
