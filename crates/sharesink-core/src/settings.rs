// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Settings persistence
//
// Settings are stored in a local JSON file and handed to the share routing
// layer explicitly. The resolver and transfer engine never read them.

use crate::types::{AppError, ResourceRef};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// User preferences (front-end agnostic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Remembered directory used as picker start and for picker-less saves
    #[serde(default)]
    pub default_save_location: Option<ResourceRef>,
    /// Save straight into the default location without asking
    #[serde(default)]
    pub skip_file_picker: bool,
    /// Go straight to the picker without showing details
    #[serde(default = "default_skip_file_details")]
    pub skip_file_details: bool,
    /// Decode an image preview on the details screen
    #[serde(default)]
    pub show_file_preview: bool,
    /// Also handle "view" requests, not only "send"
    #[serde(default)]
    pub intercept_view_intents: bool,
}

fn default_skip_file_details() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_save_location: None,
            skip_file_picker: false,
            skip_file_details: default_skip_file_details(),
            show_file_preview: false,
            intercept_view_intents: false,
        }
    }
}

/// Host permission store for remembered directories
pub trait PermissionGrants {
    /// Persist a write grant for `location`
    fn take_write_grant(&self, location: &ResourceRef) -> Result<(), AppError>;
    /// Release any persisted grant for `location`
    fn release_grant(&self, location: &ResourceRef) -> Result<(), AppError>;
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a settings store in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::open(Self::get_settings_path()?)
    }

    /// Create a settings store backed by `file_path`, loading it if present
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::Io(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            store.persist(&store.read())?;
        }

        Ok(store)
    }

    fn get_settings_path() -> Result<PathBuf, AppError> {
        let config_dir = directories::ProjectDirs::from("com", "sharesink", "sharesink")
            .ok_or_else(|| AppError::InvalidConfig("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        Ok(config_dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self, settings: &AppSettings) -> Result<(), AppError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Io(format!("Failed to create config dir: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.file_path, content)
            .map_err(|e| AppError::Io(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    fn read(&self) -> AppSettings {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `f` to a copy, write it to disk, then swap it in. The cache is
    /// unchanged when the write fails.
    fn modify(&self, f: impl FnOnce(&mut AppSettings)) -> Result<(), AppError> {
        let mut settings = match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut next = settings.clone();
        f(&mut next);

        if let Err(e) = self.persist(&next) {
            tracing::error!("Failed to persist settings: {}", e);
            return Err(e);
        }
        *settings = next;
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> AppSettings {
        self.read()
    }

    /// Replace all settings and persist
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        self.modify(|settings| *settings = new_settings)
    }

    pub fn set_skip_file_picker(&self, value: bool) -> Result<(), AppError> {
        tracing::debug!("skip_file_picker = {}", value);
        self.modify(|s| s.skip_file_picker = value)
    }

    pub fn set_skip_file_details(&self, value: bool) -> Result<(), AppError> {
        tracing::debug!("skip_file_details = {}", value);
        self.modify(|s| s.skip_file_details = value)
    }

    pub fn set_show_file_preview(&self, value: bool) -> Result<(), AppError> {
        tracing::debug!("show_file_preview = {}", value);
        self.modify(|s| s.show_file_preview = value)
    }

    pub fn set_intercept_view_intents(&self, value: bool) -> Result<(), AppError> {
        tracing::debug!("intercept_view_intents = {}", value);
        self.modify(|s| s.intercept_view_intents = value)
    }

    /// Store or clear the default save location.
    ///
    /// A write grant on the new location is taken before anything is stored;
    /// the grant on the previous location is released afterwards. If storing
    /// fails, the new grant is released again and nothing changes.
    pub fn update_default_save_location(
        &self,
        value: Option<ResourceRef>,
        grants: &dyn PermissionGrants,
    ) -> Result<(), AppError> {
        let current = self.read().default_save_location;
        if current == value {
            return Ok(());
        }

        if let Some(new) = &value {
            grants.take_write_grant(new)?;
        }
        if let Err(e) = self.modify(|s| s.default_save_location = value.clone()) {
            if let Some(new) = &value {
                if let Err(release) = grants.release_grant(new) {
                    tracing::warn!("Failed to release grant for {}: {}", new, release);
                }
            }
            return Err(e);
        }

        if let Some(old) = &current {
            if let Err(e) = grants.release_grant(old) {
                tracing::warn!("Failed to release grant for {}: {}", old, e);
            }
        }

        tracing::info!(
            "Default save location: {}",
            value.as_ref().map(|v| v.as_str()).unwrap_or("<none>")
        );
        Ok(())
    }

    pub fn clear_default_save_location(&self, grants: &dyn PermissionGrants) -> Result<(), AppError> {
        self.update_default_save_location(None, grants)
    }
}
