use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::policy::ErrorPolicy;

static SETTINGS_FILE_NAME: &str = "settings.json";

/// Platform config/data directories plus the loaded settings
pub struct ProjectConfig {
    pub settings: SchedulerSettings,
    pub project_dirs: ProjectDirs,
}

impl ProjectConfig {
    pub async fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("io", "tick-scheduler", "tick-scheduler")
            .ok_or_else(|| anyhow!("Failed to get project directories"))?;
        for x in [proj_dirs.config_dir(), proj_dirs.data_dir()] {
            if !x.exists() {
                fs::create_dir_all(x).context("Failed to create config directory")?;
            }
        }

        let settings =
            SchedulerSettings::new(&proj_dirs.config_dir().join(SETTINGS_FILE_NAME)).await?;
        Ok(Self {
            settings,
            project_dirs: proj_dirs,
        })
    }
}

/// Scheduler configuration persisted as JSON
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// Delay between ticks
    pub tick_interval: Duration,
    /// Response to tick callback failures
    pub error_policy: ErrorPolicy,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl SchedulerSettings {
    pub async fn new(config_file_path: &PathBuf) -> Result<Self> {
        match Self::load_settings_from_file(config_file_path) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Error loading settings from file - creating default config: {}", e);
                let default = Self::default();
                default.save_to_file(config_file_path)?;
                Ok(default)
            }
        }
    }

    pub fn load_settings_from_file(config_file_path: &PathBuf) -> Result<Self> {
        if !config_file_path.exists() {
            return Err(anyhow!("Config file not found"));
        }
        let data = fs::read_to_string(config_file_path)?;
        let settings: Self = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, config_file_path: &PathBuf) -> Result<()> {
        if !config_file_path.exists() {
            if let Some(parent_path) = config_file_path.parent() {
                fs::create_dir_all(parent_path).context("Failed to create config directory")?;
            }
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, data)?;
        Ok(())
    }
}
