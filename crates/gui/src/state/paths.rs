use std::path::{Path, PathBuf};

/// Per-user locations of configuration and data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config: PathBuf,
    data: PathBuf,
}

impl AppPaths {
    /// Platform directories for the application, if the platform has a home
    pub fn discover() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("com", "exhibit", "exhibit")?;
        Some(Self::new(dirs.config_dir(), dirs.data_dir()))
    }

    pub fn new(config: impl Into<PathBuf>, data: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            data: data.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config
    }

    /// User configuration presets
    pub fn presets_dir(&self) -> PathBuf {
        self.config.join("configurations")
    }

    /// Persisted window state
    pub fn state_file(&self) -> PathBuf {
        self.config.join("state.json")
    }

    pub fn hdri_dir(&self) -> PathBuf {
        self.data.join("hdri")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = AppPaths::new("/cfg", "/data");
        assert_eq!(paths.presets_dir(), PathBuf::from("/cfg/configurations"));
        assert_eq!(paths.state_file(), PathBuf::from("/cfg/state.json"));
        assert_eq!(paths.hdri_dir(), PathBuf::from("/data/hdri"));
    }
}
