use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::error::{MonitorError, MonitorResult};

pub const CHECK_INTERVAL_CHOICES: [u64; 7] = [5, 10, 15, 30, 60, 120, 300];
pub const COOLDOWN_CHOICES: [u64; 5] = [10, 30, 60, 120, 300];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum YellStyle {
    #[default]
    Coach,
    DrillSergeant,
    Friendly,
    Motivational,
}

impl YellStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            YellStyle::Coach => "coach",
            YellStyle::DrillSergeant => "drill_sergeant",
            YellStyle::Friendly => "friendly",
            YellStyle::Motivational => "motivational",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    pub check_interval_seconds: u64,
    pub cooldown_seconds: u64,
    pub style: YellStyle,
    pub use_face_detection: bool,
    /// A second display sits above the primary one; upward glances count as
    /// on-task for a short grace window.
    pub secondary_monitor_above: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval_seconds: 10,
            cooldown_seconds: 30,
            style: YellStyle::Coach,
            use_face_detection: true,
            secondary_monitor_above: false,
        }
    }
}

impl MonitorSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if !CHECK_INTERVAL_CHOICES.contains(&self.check_interval_seconds) {
            return Err(MonitorError::InvalidSetting {
                field: "checkIntervalSeconds",
                value: self.check_interval_seconds.to_string(),
            });
        }
        if !COOLDOWN_CHOICES.contains(&self.cooldown_seconds) {
            return Err(MonitorError::InvalidSetting {
                field: "cooldownSeconds",
                value: self.cooldown_seconds.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    monitor: MonitorSettings,
}

/// Monitor settings shared between the UI layer (writer) and the controller
/// (reader). The controller takes a snapshot at the start of every cycle.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let parsed: UserSettings = serde_json::from_str(&contents).unwrap_or_default();
            if parsed.monitor.validate().is_err() {
                log::warn!(
                    "Settings at {} hold unsupported values; using defaults",
                    path.display()
                );
                UserSettings::default()
            } else {
                parsed
            }
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    pub fn in_memory(monitor: MonitorSettings) -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings { monitor }),
        }
    }

    pub fn monitor(&self) -> MonitorSettings {
        self.read().monitor.clone()
    }

    pub fn update_monitor(&self, settings: MonitorSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        guard.monitor = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_settings_card() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.check_interval_seconds, 10);
        assert_eq!(settings.cooldown_seconds, 30);
        assert_eq!(settings.style, YellStyle::Coach);
        assert!(settings.use_face_detection);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_intervals_outside_the_menu() {
        let settings = MonitorSettings {
            check_interval_seconds: 7,
            ..MonitorSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(MonitorError::InvalidSetting { field: "checkIntervalSeconds", .. })
        ));

        let settings = MonitorSettings {
            cooldown_seconds: 45,
            ..MonitorSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn camel_case_wire_format() {
        let json = r#"{"checkIntervalSeconds":30,"cooldownSeconds":60,"style":"drill_sergeant","useFaceDetection":false}"#;
        let settings: MonitorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.check_interval_seconds, 30);
        assert_eq!(settings.style, YellStyle::DrillSergeant);
        assert!(!settings.use_face_detection);
        assert!(!settings.secondary_monitor_above);
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let updated = MonitorSettings {
            check_interval_seconds: 60,
            cooldown_seconds: 120,
            style: YellStyle::Friendly,
            use_face_detection: false,
            secondary_monitor_above: true,
        };
        store.update_monitor(updated.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.monitor(), updated);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.monitor(), MonitorSettings::default());
    }

    #[test]
    fn invalid_update_is_refused() {
        let store = SettingsStore::in_memory(MonitorSettings::default());
        let bad = MonitorSettings {
            cooldown_seconds: 1,
            ..MonitorSettings::default()
        };
        assert!(store.update_monitor(bad).is_err());
        assert_eq!(store.monitor(), MonitorSettings::default());
    }
}
