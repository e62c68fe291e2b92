use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// World axis the scene treats as "up"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpDirection {
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "+X")]
    PosX,
    #[serde(rename = "-Y")]
    NegY,
    #[default]
    #[serde(rename = "+Y")]
    PosY,
    #[serde(rename = "-Z")]
    NegZ,
    #[serde(rename = "+Z")]
    PosZ,
}

/// Extensions of formats that are conventionally authored Z-up
/// (CAD exchange formats and 3D printing).
const Z_UP_EXTENSIONS: &[&str] = &["stl", "3mf", "step", "stp", "iges", "igs", "brep"];

impl UpDirection {
    pub const ALL: [UpDirection; 6] = [
        UpDirection::NegX,
        UpDirection::PosX,
        UpDirection::NegY,
        UpDirection::PosY,
        UpDirection::NegZ,
        UpDirection::PosZ,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpDirection::NegX => "-X",
            UpDirection::PosX => "+X",
            UpDirection::NegY => "-Y",
            UpDirection::PosY => "+Y",
            UpDirection::NegZ => "-Z",
            UpDirection::PosZ => "+Z",
        }
    }

    /// Unit vector of the axis
    pub fn vector(&self) -> [f64; 3] {
        match self {
            UpDirection::NegX => [-1.0, 0.0, 0.0],
            UpDirection::PosX => [1.0, 0.0, 0.0],
            UpDirection::NegY => [0.0, -1.0, 0.0],
            UpDirection::PosY => [0.0, 1.0, 0.0],
            UpDirection::NegZ => [0.0, 0.0, -1.0],
            UpDirection::PosZ => [0.0, 0.0, 1.0],
        }
    }

    /// Up direction to use for a file, chosen by its extension.
    pub fn for_path(path: &Path) -> UpDirection {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext {
            Some(ext) if Z_UP_EXTENSIONS.contains(&ext.as_str()) => UpDirection::PosZ,
            _ => UpDirection::PosY,
        }
    }
}

impl fmt::Display for UpDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpDirection::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid up direction '{s}'"))
    }
}
