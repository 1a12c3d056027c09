use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Screen the launcher panel appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LauncherScreenPreference {
    ActiveScreen,
    PrimaryScreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub force_english_input: bool,
    pub launcher_screen: LauncherScreenPreference,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            force_english_input: false,
            launcher_screen: LauncherScreenPreference::ActiveScreen,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    general: GeneralSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn general(&self) -> GeneralSettings {
        self.data.read().unwrap().general.clone()
    }

    pub fn update_general(&self, settings: GeneralSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.general = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl SettingsStore {
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_settings_path(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("keytally-settings-{tag}-{unique}.json"))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(temp_settings_path("defaults")).unwrap();
        let general = store.general();
        assert!(!general.force_english_input);
        assert_eq!(general.launcher_screen, LauncherScreenPreference::ActiveScreen);
    }

    #[test]
    fn updates_round_trip_through_the_file() {
        let path = temp_settings_path("round-trip");
        let store = SettingsStore::new(path.clone()).unwrap();

        store
            .update_general(GeneralSettings {
                force_english_input: true,
                launcher_screen: LauncherScreenPreference::PrimaryScreen,
            })
            .unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        let general = reloaded.general();
        assert!(general.force_english_input);
        assert_eq!(general.launcher_screen, LauncherScreenPreference::PrimaryScreen);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let path = temp_settings_path("corrupt");
        fs::write(&path, b"not json at all").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.general(), GeneralSettings::default());

        let _ = fs::remove_file(path);
    }
}
