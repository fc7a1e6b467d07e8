//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the
//! other application config. Nothing here is secret: the password is
//! never persisted.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::KeyDerivationParams;
use crate::error::{Result, VaultError};
use crate::storage::{self, StoreFormat};

/// File name of the store inside the data directory
pub const STORE_FILE_NAME: &str = "totp_tokens";

const SETTINGS_FILE_NAME: &str = "settings.json";
const SETTINGS_VERSION: u32 = 1;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "otp-vault").ok_or_else(|| {
        VaultError::SettingsError("could not determine home directory".to_string())
    })
}

/// Default directory for `settings.json`
pub fn default_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Default store location, `<data dir>/totp_tokens`
pub fn default_store_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(STORE_FILE_NAME))
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Store file override; the platform data directory is used when unset
    pub store_file: Option<PathBuf>,
    /// Format used when saving the store
    pub format: StoreFormat,
    /// Argon2 cost for the sealed format
    pub sealed_kdf: KeyDerivationParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            store_file: None,
            format: StoreFormat::default(),
            sealed_kdf: KeyDerivationParams::default(),
        }
    }
}

impl Settings {
    /// Store path after applying the override
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_file {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load `settings.json` from `config_dir`, falling back to defaults if absent
    pub fn load(config_dir: &Path) -> Result<Self> {
        let settings_file = config_dir.join(SETTINGS_FILE_NAME);
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            settings_file,
            settings,
        })
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings file found, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(VaultError::ReadError(e)),
        };

        let settings = serde_json::from_str(&contents)
            .map_err(|e| VaultError::SettingsError(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| VaultError::SettingsError(e.to_string()))?;
        storage::write_atomic(&self.settings_file, contents.as_bytes())?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Update settings and save
    pub fn update(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.save()
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }
}
