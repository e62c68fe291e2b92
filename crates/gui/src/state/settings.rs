//! Typed settings registry with change fan-out.
//!
//! The registry owns one [`Setting`] per [`SettingKey`]. Every effective
//! write publishes a single [`SettingChange`] to each subscriber; the
//! change carries its [`ChangeSource`] so that consumers (renderer sync,
//! drift detection, persistence) decide for themselves whether to react.

use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use shared::{SettingCategory, SettingKey, SettingValue, UpDirection};

/// Who caused a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// A widget edited by the user
    User,
    /// A preset, a file load or the engine
    External,
}

/// Notification published for every effective write
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: SettingKey,
    pub category: SettingCategory,
    pub value: SettingValue,
    pub source: ChangeSource,
}

/// A named, typed setting
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    key: SettingKey,
    value: SettingValue,
}

impl Setting {
    pub fn key(&self) -> SettingKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.as_str()
    }

    pub fn category(&self) -> SettingCategory {
        self.key.category()
    }

    pub fn value(&self) -> &SettingValue {
        &self.value
    }
}

/// Ordered collection of every setting of a window
pub struct SettingRegistry {
    settings: Vec<Setting>,
    subscribers: Vec<Sender<SettingChange>>,
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingRegistry {
    /// Registry populated from the default table
    pub fn new() -> Self {
        let settings = SettingKey::ALL
            .into_iter()
            .map(|key| Setting {
                key,
                value: key.default_value(),
            })
            .collect();
        Self {
            settings,
            subscribers: Vec::new(),
        }
    }

    /// Register a new listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<SettingChange> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Write a setting.
    ///
    /// Returns `true` when the stored value changed. Writing the current
    /// value, or a value of the wrong kind, changes nothing and publishes
    /// nothing.
    pub fn set(
        &mut self,
        key: SettingKey,
        value: impl Into<SettingValue>,
        source: ChangeSource,
    ) -> bool {
        let value = value.into();
        let setting = self.setting_mut(key);

        let Some(value) = value.coerce_like(&setting.value) else {
            tracing::warn!(
                "Refusing to store {value} in '{key}' (expected {:?})",
                setting.value.kind()
            );
            return false;
        };
        if value == setting.value {
            return false;
        }

        setting.value = value.clone();
        tracing::debug!("{key} = {value} ({source:?})");
        self.publish(SettingChange {
            key,
            category: key.category(),
            value,
            source,
        });
        true
    }

    /// Write a setting addressed by its wire name. Unknown names are logged
    /// and ignored.
    pub fn set_by_name(
        &mut self,
        name: &str,
        value: impl Into<SettingValue>,
        source: ChangeSource,
    ) -> bool {
        match name.parse::<SettingKey>() {
            Ok(key) => self.set(key, value, source),
            Err(e) => {
                tracing::warn!("{e}, ignoring write");
                false
            }
        }
    }

    /// Write many settings in order
    pub fn set_many<I>(&mut self, values: I, source: ChangeSource)
    where
        I: IntoIterator<Item = (SettingKey, SettingValue)>,
    {
        for (key, value) in values {
            self.set(key, value, source);
        }
    }

    pub fn get(&self, key: SettingKey) -> &SettingValue {
        &self.setting(key).value
    }

    /// Look a setting up by wire name. Unknown names are logged.
    pub fn get_by_name(&self, name: &str) -> Option<&Setting> {
        match name.parse::<SettingKey>() {
            Ok(key) => Some(self.setting(key)),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        }
    }

    pub fn bool(&self, key: SettingKey) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    pub fn f64(&self, key: SettingKey) -> f64 {
        self.get(key).as_f64().unwrap_or(0.0)
    }

    pub fn i64(&self, key: SettingKey) -> i64 {
        self.get(key).as_i64().unwrap_or(0)
    }

    pub fn str(&self, key: SettingKey) -> &str {
        self.get(key).as_str().unwrap_or("")
    }

    pub fn rgb(&self, key: SettingKey) -> [f64; 3] {
        self.get(key).as_rgb().unwrap_or([0.0; 3])
    }

    /// Current up direction; an unparsable value falls back to `+Y`
    pub fn up(&self) -> UpDirection {
        self.str(SettingKey::Up).parse().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.iter()
    }

    /// Snapshot of one category
    pub fn values_in(&self, category: SettingCategory) -> BTreeMap<SettingKey, SettingValue> {
        self.settings
            .iter()
            .filter(|s| s.category() == category)
            .map(|s| (s.key, s.value.clone()))
            .collect()
    }

    pub fn view_settings(&self) -> BTreeMap<SettingKey, SettingValue> {
        self.values_in(SettingCategory::View)
    }

    pub fn other_settings(&self) -> BTreeMap<SettingKey, SettingValue> {
        self.values_in(SettingCategory::Other)
    }

    /// View and other settings: everything a preset can carry
    pub fn customizable_settings(&self) -> BTreeMap<SettingKey, SettingValue> {
        let mut settings = self.view_settings();
        settings.extend(self.other_settings());
        settings
    }

    /// Defaults of every setting a preset can carry
    pub fn default_customizable_settings() -> BTreeMap<SettingKey, SettingValue> {
        SettingKey::ALL
            .into_iter()
            .filter(|k| k.category() != SettingCategory::Internal)
            .map(|k| (k, k.default_value()))
            .collect()
    }

    /// Republish every setting as an external change
    pub fn sync_all(&mut self) {
        let changes: Vec<_> = self
            .settings
            .iter()
            .map(|s| SettingChange {
                key: s.key,
                category: s.category(),
                value: s.value.clone(),
                source: ChangeSource::External,
            })
            .collect();
        for change in changes {
            self.publish(change);
        }
    }

    fn publish(&mut self, change: SettingChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn setting(&self, key: SettingKey) -> &Setting {
        // One entry per key, in `SettingKey::ALL` order
        &self.settings[key as usize]
    }

    fn setting_mut(&mut self, key: SettingKey) -> &mut Setting {
        &mut self.settings[key as usize]
    }
}

impl std::fmt::Debug for SettingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.settings.iter().map(|s| (s.name(), &s.value)))
            .finish()
    }
}
