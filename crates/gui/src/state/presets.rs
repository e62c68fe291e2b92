//! Configuration presets: matching opened files to named bundles of
//! settings, and tracking whether the live settings still match.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use shared::{PresetDocument, PresetFile, SettingCategory, SettingKey, SettingValue};

use super::settings::{ChangeSource, SettingRegistry};

/// Key of the preset used when no pattern matches
pub const GENERAL_PRESET: &str = "general";
/// Indicator tag once the settings drifted away from the active preset
pub const CUSTOM_TAG: &str = "custom";

const BUILTIN_CONFIGURATIONS: &str = include_str!("../../assets/configurations.json");

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid formats pattern for preset '{key}': {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("no preset named '{0}'")]
    Unknown(String),
    #[error("no user configuration directory available")]
    NoUserDirectory,
}

/// A validated preset
#[derive(Debug, Clone)]
pub struct Preset {
    pub key: String,
    pub name: String,
    pattern: String,
    formats: Option<Regex>,
    pub view_settings: BTreeMap<SettingKey, SettingValue>,
    pub other_settings: BTreeMap<SettingKey, SettingValue>,
}

impl Preset {
    /// Validate a preset document.
    ///
    /// A bad `formats` pattern rejects the whole preset. Unknown setting
    /// names, settings filed under the wrong category and wrongly typed
    /// values are dropped with a warning.
    pub fn from_document(key: &str, doc: PresetDocument) -> Result<Self, PresetError> {
        let formats = if doc.formats.is_empty() {
            None
        } else {
            Some(Regex::new(&doc.formats).map_err(|source| PresetError::Pattern {
                key: key.to_string(),
                source,
            })?)
        };

        Ok(Self {
            key: key.to_string(),
            name: doc.name,
            pattern: doc.formats,
            formats,
            view_settings: validate_settings(key, doc.view_settings, SettingCategory::View),
            other_settings: validate_settings(key, doc.other_settings, SettingCategory::Other),
        })
    }

    pub fn to_document(&self) -> PresetDocument {
        let to_names = |settings: &BTreeMap<SettingKey, SettingValue>| {
            settings
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.clone()))
                .collect()
        };
        PresetDocument {
            name: self.name.clone(),
            formats: self.pattern.clone(),
            view_settings: to_names(&self.view_settings),
            other_settings: to_names(&self.other_settings),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Substring search of the pattern in `path`. An empty pattern never
    /// matches.
    pub fn matches(&self, path: &str) -> bool {
        self.formats.as_ref().is_some_and(|re| re.is_match(path))
    }

    /// Settings written by [`PresetCatalog::apply_preset`]: the view pass
    /// (customizable defaults overlaid with the preset's view settings)
    /// followed by the preset's other settings.
    ///
    /// `up` is a property of the opened file, so it is only part of the
    /// preset when the preset declares it.
    fn passes(&self) -> (Vec<(SettingKey, SettingValue)>, Vec<(SettingKey, SettingValue)>) {
        let mut view_pass = SettingRegistry::default_customizable_settings();
        view_pass.remove(&SettingKey::Up);
        view_pass.extend(self.view_settings.clone());
        let other_pass = self.other_settings.clone().into_iter().collect();
        (view_pass.into_iter().collect(), other_pass)
    }

    /// Every value the registry holds right after this preset is applied
    pub fn expected_settings(&self) -> BTreeMap<SettingKey, SettingValue> {
        let (view_pass, other_pass) = self.passes();
        view_pass.into_iter().chain(other_pass).collect()
    }
}

fn validate_settings(
    preset: &str,
    settings: BTreeMap<String, SettingValue>,
    category: SettingCategory,
) -> BTreeMap<SettingKey, SettingValue> {
    let mut valid = BTreeMap::new();
    for (name, value) in settings {
        let key = match name.parse::<SettingKey>() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Preset '{preset}': {e}, skipped");
                continue;
            }
        };
        if key.category() != category {
            tracing::warn!("Preset '{preset}': '{name}' is not a {category:?} setting, skipped");
            continue;
        }
        match value.coerce_like(&key.default_value()) {
            Some(value) => {
                valid.insert(key, value);
            }
            None => tracing::warn!("Preset '{preset}': '{name}' has the wrong type, skipped"),
        }
    }
    valid
}

/// Which preset the live settings currently correspond to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivePreset {
    Preset(String),
    Custom,
}

impl ActivePreset {
    pub fn tag(&self) -> &str {
        match self {
            ActivePreset::Preset(key) => key,
            ActivePreset::Custom => CUSTOM_TAG,
        }
    }
}

/// Built-in and user presets merged into one insertion-ordered collection
#[derive(Debug)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
    user_dir: Option<PathBuf>,
    active: ActivePreset,
}

impl PresetCatalog {
    /// Catalog holding only the bundled presets
    pub fn builtin() -> Self {
        let mut catalog = Self {
            presets: Vec::new(),
            user_dir: None,
            active: ActivePreset::Preset(GENERAL_PRESET.to_string()),
        };
        if let Err(e) = catalog.load_str("built-in configurations", BUILTIN_CONFIGURATIONS) {
            tracing::error!("{e}");
        }
        catalog
    }

    /// Bundled presets followed by the user's presets from `user_dir`.
    /// The directory is also where [`Self::save_current`] writes.
    pub fn load(user_dir: Option<PathBuf>) -> Self {
        let mut catalog = Self::builtin();
        if let Some(dir) = user_dir {
            if dir.is_dir() {
                catalog.load_dir(&dir);
            }
            catalog.user_dir = Some(dir);
        }
        catalog
    }

    /// Load every `*.json` file of a directory, in file name order.
    /// Unreadable or malformed files are logged and skipped.
    pub fn load_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to list {}: {e}", dir.display());
                return;
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            let result = std::fs::read_to_string(&path)
                .map_err(|source| PresetError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|json| self.load_str(&path.display().to_string(), &json));
            match result {
                Ok(count) => tracing::info!("Loaded {count} preset(s) from {}", path.display()),
                Err(e) => tracing::error!("{e}"),
            }
        }
    }

    /// Parse one configuration document and merge its presets.
    ///
    /// Returns how many presets were accepted. Individual presets that fail
    /// validation are logged and skipped.
    pub fn load_str(&mut self, origin: &str, json: &str) -> Result<usize, PresetError> {
        let file: PresetFile = serde_json::from_str(json).map_err(|source| PresetError::Json {
            origin: origin.to_string(),
            source,
        })?;

        let mut count = 0;
        for (key, value) in file {
            let preset = serde_json::from_value::<PresetDocument>(value)
                .map_err(|source| PresetError::Json {
                    origin: format!("{origin} [{key}]"),
                    source,
                })
                .and_then(|doc| Preset::from_document(&key, doc));
            match preset {
                Ok(preset) => {
                    self.insert(preset);
                    count += 1;
                }
                Err(e) => tracing::error!("{e}"),
            }
        }
        Ok(count)
    }

    /// Add a preset. A preset with an existing key replaces it in place;
    /// a new key is appended.
    pub fn insert(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| p.key == preset.key) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    pub fn set_user_dir(&mut self, dir: PathBuf) {
        self.user_dir = Some(dir);
    }

    pub fn active(&self) -> &ActivePreset {
        &self.active
    }

    /// Key of the last preset whose pattern matches `path`, or
    /// [`GENERAL_PRESET`] when none does.
    pub fn select_preset_for(&self, path: &Path) -> &str {
        let path = path.to_string_lossy();
        self.presets
            .iter()
            .rev()
            .find(|p| p.matches(&path))
            .map_or(GENERAL_PRESET, |p| p.key.as_str())
    }

    /// Write a preset's settings into the registry and make it active.
    pub fn apply_preset(
        &mut self,
        key: &str,
        registry: &mut SettingRegistry,
    ) -> Result<(), PresetError> {
        let preset = self
            .get(key)
            .ok_or_else(|| PresetError::Unknown(key.to_string()))?;
        let (view_pass, other_pass) = preset.passes();

        registry.set_many(view_pass, ChangeSource::External);
        registry.set_many(other_pass, ChangeSource::External);

        tracing::info!("Applied preset '{key}'");
        self.active = ActivePreset::Preset(key.to_string());
        Ok(())
    }

    /// Compare the registry with the active preset. On the first mismatch
    /// the indicator latches to custom until a preset is applied again.
    ///
    /// Returns `true` when this call made the transition.
    pub fn detect_drift(&mut self, registry: &SettingRegistry) -> bool {
        let ActivePreset::Preset(key) = &self.active else {
            return false;
        };
        let Some(preset) = self.get(key) else {
            self.active = ActivePreset::Custom;
            return true;
        };

        let drifted = preset
            .expected_settings()
            .into_iter()
            .find(|(k, v)| registry.get(*k) != v);
        match drifted {
            Some((k, _)) => {
                tracing::debug!("'{k}' diverged from preset '{}'", preset.key);
                self.active = ActivePreset::Custom;
                true
            }
            None => false,
        }
    }

    /// Store the current customizable settings as a new user preset and
    /// make it active. Returns the new preset's key.
    pub fn save_current(
        &mut self,
        name: &str,
        formats: &str,
        registry: &SettingRegistry,
    ) -> Result<String, PresetError> {
        let dir = self.user_dir.clone().ok_or(PresetError::NoUserDirectory)?;
        let key = self.unused_key(&preset_key(name), &dir);

        let mut view_settings = registry.view_settings();
        view_settings.remove(&SettingKey::Up);
        let doc = PresetDocument {
            name: name.to_string(),
            formats: formats.to_string(),
            view_settings: view_settings
                .into_iter()
                .map(|(k, v)| (k.as_str().to_string(), v))
                .collect(),
            other_settings: registry
                .other_settings()
                .into_iter()
                .map(|(k, v)| (k.as_str().to_string(), v))
                .collect(),
        };
        let preset = Preset::from_document(&key, doc.clone())?;

        std::fs::create_dir_all(&dir).map_err(|source| PresetError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("{key}.json"));
        let mut file = PresetFile::new();
        file.insert(
            key.clone(),
            serde_json::to_value(&doc).map_err(|source| PresetError::Json {
                origin: key.clone(),
                source,
            })?,
        );
        let json = serde_json::to_string_pretty(&file).map_err(|source| PresetError::Json {
            origin: key.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| PresetError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Saved preset '{key}' to {}", path.display());
        self.insert(preset);
        self.active = ActivePreset::Preset(key.clone());
        Ok(key)
    }

    /// `base`, or `base-2`, `base-3`... when a preset or file already uses it
    fn unused_key(&self, base: &str, dir: &Path) -> String {
        let taken =
            |key: &str| self.get(key).is_some() || dir.join(format!("{key}.json")).exists();
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|key| !taken(key.as_str()))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Derive a file-safe preset key from a display name
fn preset_key(name: &str) -> String {
    let mut key = String::new();
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.ends_with('-') {
            key.push('-');
        }
    }
    let key = key.trim_matches('-').to_string();
    match key.as_str() {
        "" => "user-preset".to_string(),
        GENERAL_PRESET | CUSTOM_TAG => format!("user-{key}"),
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(json: &str) -> PresetCatalog {
        let mut catalog = PresetCatalog::builtin();
        catalog.load_str("test", json).unwrap();
        catalog
    }

    #[test]
    fn test_builtins_parse() {
        let catalog = PresetCatalog::builtin();
        assert!(catalog.get(GENERAL_PRESET).is_some());
        assert!(catalog.get("studio").is_some());
        assert!(catalog.get("3d-print").is_some());
        assert_eq!(catalog.iter().next().unwrap().key, GENERAL_PRESET);
    }

    #[test]
    fn test_no_match_selects_general() {
        let catalog = PresetCatalog::builtin();
        assert_eq!(catalog.select_preset_for(Path::new("/tmp/file.unknown")), GENERAL_PRESET);
    }

    #[test]
    fn test_builtin_matches() {
        let catalog = PresetCatalog::builtin();
        assert_eq!(catalog.select_preset_for(Path::new("/tmp/model.stl")), "3d-print");
        assert_eq!(catalog.select_preset_for(Path::new("/tmp/MODEL.STL")), "3d-print");
        assert_eq!(catalog.select_preset_for(Path::new("/tmp/scene.glb")), "studio");
        assert_eq!(catalog.select_preset_for(Path::new("/tmp/scan.ply")), "point-cloud");
    }

    #[test]
    fn test_last_match_wins() {
        let catalog = catalog_with(
            r#"{
                "first": {"name": "First", "formats": "\\.obj", "view-settings": {}, "other-settings": {}},
                "second": {"name": "Second", "formats": "obj$", "view-settings": {}, "other-settings": {}}
            }"#,
        );
        assert_eq!(catalog.select_preset_for(Path::new("/a/model.obj")), "second");
    }

    #[test]
    fn test_substring_search() {
        let catalog = catalog_with(
            r#"{"scans": {"name": "Scans", "formats": "scans/", "view-settings": {}, "other-settings": {}}}"#,
        );
        assert_eq!(catalog.select_preset_for(Path::new("/home/me/scans/a.obj")), "scans");
        assert_eq!(catalog.select_preset_for(Path::new("/home/me/a.obj")), GENERAL_PRESET);
    }

    #[test]
    fn test_user_preset_overrides_builtin_pattern() {
        let catalog = catalog_with(
            r#"{"my-stl": {"name": "Mine", "formats": "\\.stl$", "view-settings": {}, "other-settings": {}}}"#,
        );
        assert_eq!(catalog.select_preset_for(Path::new("part.stl")), "my-stl");
    }

    #[test]
    fn test_same_key_replaces_in_place() {
        let mut catalog = PresetCatalog::builtin();
        let position = catalog.iter().position(|p| p.key == "studio").unwrap();
        let len = catalog.len();
        catalog
            .load_str(
                "test",
                r#"{"studio": {"name": "My Studio", "formats": "\\.glb$", "view-settings": {}, "other-settings": {}}}"#,
            )
            .unwrap();
        assert_eq!(catalog.len(), len);
        assert_eq!(catalog.iter().position(|p| p.key == "studio"), Some(position));
        assert_eq!(catalog.get("studio").unwrap().name, "My Studio");
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let mut catalog = PresetCatalog::builtin();
        let before = catalog.len();
        let count = catalog
            .load_str(
                "test",
                r#"{
                    "bad-regex": {"name": "x", "formats": "(", "view-settings": {}, "other-settings": {}},
                    "missing": {"name": "x"},
                    "good": {"name": "Good", "formats": "x", "view-settings": {"nope": 1, "grid": "yes", "point-size": 2}, "other-settings": {"grid": false}}
                }"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(catalog.len(), before + 1);

        let good = catalog.get("good").unwrap();
        assert_eq!(good.view_settings.len(), 1);
        assert_eq!(good.view_settings[&SettingKey::PointSize], SettingValue::Float(2.0));
        assert!(good.other_settings.is_empty());
    }

    #[test]
    fn test_malformed_document_is_error() {
        let mut catalog = PresetCatalog::builtin();
        assert!(catalog.load_str("test", "{ not json").is_err());
    }

    #[test]
    fn test_apply_preset_writes_settings() {
        let mut catalog = PresetCatalog::builtin();
        let mut registry = SettingRegistry::new();
        registry.set(SettingKey::LightIntensity, 4.0, ChangeSource::User);

        catalog.apply_preset("studio", &mut registry).unwrap();
        assert!(registry.bool(SettingKey::HdriAmbient));
        assert!(!registry.bool(SettingKey::Grid));
        // reset to default by the view pass
        assert_eq!(registry.f64(SettingKey::LightIntensity), 1.5);
        assert_eq!(catalog.active().tag(), "studio");
    }

    #[test]
    fn test_apply_preset_keeps_up() {
        let mut catalog = PresetCatalog::builtin();
        let mut registry = SettingRegistry::new();
        registry.set(SettingKey::Up, "+Z", ChangeSource::External);
        catalog.apply_preset("3d-print", &mut registry).unwrap();
        assert_eq!(registry.str(SettingKey::Up), "+Z");
    }

    #[test]
    fn test_apply_unknown_preset() {
        let mut catalog = PresetCatalog::builtin();
        let mut registry = SettingRegistry::new();
        assert!(matches!(
            catalog.apply_preset("nope", &mut registry),
            Err(PresetError::Unknown(_))
        ));
        assert_eq!(catalog.active().tag(), GENERAL_PRESET);
    }

    #[test]
    fn test_drift_latches_until_reapplied() {
        let mut catalog = PresetCatalog::builtin();
        let mut registry = SettingRegistry::new();
        catalog.apply_preset("studio", &mut registry).unwrap();
        assert!(!catalog.detect_drift(&registry));
        assert_eq!(catalog.active().tag(), "studio");

        registry.set(SettingKey::ToneMapping, false, ChangeSource::User);
        assert!(catalog.detect_drift(&registry));
        assert_eq!(catalog.active(), &ActivePreset::Custom);

        // putting the value back does not clear the latch
        registry.set(SettingKey::ToneMapping, true, ChangeSource::User);
        assert!(!catalog.detect_drift(&registry));
        assert_eq!(catalog.active().tag(), CUSTOM_TAG);

        registry.set(SettingKey::ToneMapping, false, ChangeSource::User);
        catalog.apply_preset("studio", &mut registry).unwrap();
        assert_eq!(catalog.active().tag(), "studio");
        assert!(registry.bool(SettingKey::ToneMapping));
    }

    #[test]
    fn test_up_change_is_not_drift() {
        let mut catalog = PresetCatalog::builtin();
        let mut registry = SettingRegistry::new();
        catalog.apply_preset(GENERAL_PRESET, &mut registry).unwrap();
        registry.set(SettingKey::Up, "-X", ChangeSource::User);
        assert!(!catalog.detect_drift(&registry));
    }

    #[test]
    fn test_save_current() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = PresetCatalog::load(Some(dir.path().to_path_buf()));
        let mut registry = SettingRegistry::new();
        registry.set(SettingKey::PointSize, 7.0, ChangeSource::User);

        let key = catalog
            .save_current("My Scans!", "scans/", &registry)
            .unwrap();
        assert_eq!(key, "my-scans");
        assert_eq!(catalog.active().tag(), "my-scans");
        assert!(dir.path().join("my-scans.json").exists());

        // reloads from disk and wins over built-ins
        let reloaded = PresetCatalog::load(Some(dir.path().to_path_buf()));
        let preset = reloaded.get("my-scans").unwrap();
        assert_eq!(preset.view_settings[&SettingKey::PointSize], SettingValue::Float(7.0));
        assert_eq!(reloaded.select_preset_for(Path::new("/x/scans/a.ply")), "my-scans");
    }

    #[test]
    fn test_save_never_replaces_existing_presets() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = PresetCatalog::load(Some(dir.path().to_path_buf()));
        let registry = SettingRegistry::new();
        let studio_pattern = catalog.get("studio").unwrap().pattern().to_string();
        let before = catalog.len();

        let key = catalog
            .save_current("Studio", r"\.never$", &registry)
            .unwrap();
        assert_eq!(key, "studio-2");
        assert_eq!(catalog.len(), before + 1);
        assert_eq!(catalog.iter().last().unwrap().key, "studio-2");
        assert_eq!(catalog.get("studio").unwrap().pattern(), studio_pattern);

        let again = catalog
            .save_current("Studio", r"\.never$", &registry)
            .unwrap();
        assert_eq!(again, "studio-3");

        // The built-in survives a restart
        let reloaded = PresetCatalog::load(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.get("studio").unwrap().pattern(), studio_pattern);
        assert!(reloaded.get("studio-2").is_some());
        assert!(reloaded.get("studio-3").is_some());
    }

    #[test]
    fn test_save_without_directory() {
        let mut catalog = PresetCatalog::builtin();
        let registry = SettingRegistry::new();
        assert!(matches!(
            catalog.save_current("x", "", &registry),
            Err(PresetError::NoUserDirectory)
        ));
    }

    #[test]
    fn test_malformed_user_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "garbage").unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"mine": {"name": "Mine", "formats": "\\.obj$", "view-settings": {}, "other-settings": {}}}"#,
        )
        .unwrap();
        let catalog = PresetCatalog::load(Some(dir.path().to_path_buf()));
        assert!(catalog.get("mine").is_some());
    }

    #[test]
    fn test_preset_key() {
        assert_eq!(preset_key("My Scans!"), "my-scans");
        assert_eq!(preset_key("  "), "user-preset");
        assert_eq!(preset_key("General"), "user-general");
        assert_eq!(preset_key("a  b"), "a-b");
    }
}
