use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::StalenessPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    /// Days a product may stay out of stock before it is deleted
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,
    /// Cadence of the scheduled reaper job
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// How often the daemon checks for due jobs
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Name of the recurring job in the job registry
    #[serde(default = "default_job_name")]
    pub job_name: String,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            interval_secs: default_interval(),
            poll_interval_secs: default_poll_interval(),
            job_name: default_job_name(),
        }
    }
}

impl ReaperConfig {
    pub fn policy(&self) -> crate::Result<StalenessPolicy> {
        NonZeroU32::new(self.threshold_days)
            .map(StalenessPolicy::new)
            .ok_or_else(|| crate::Error::Config("reaper.threshold_days must be greater than 0".to_string()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Header of the days-out-of-stock column
    #[serde(default = "default_column_label")]
    pub column_label: String,
    /// Unit shown after a count of exactly one
    #[serde(default = "default_day_singular")]
    pub day_singular: String,
    /// Unit shown after any other count
    #[serde(default = "default_day_plural")]
    pub day_plural: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            column_label: default_column_label(),
            day_singular: default_day_singular(),
            day_plural: default_day_plural(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockreaper")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_threshold_days() -> u32 {
    120
}

fn default_interval() -> u64 {
    86400 // daily
}

fn default_poll_interval() -> u64 {
    60
}

fn default_job_name() -> String {
    "delete_old_oos_products".to_string()
}

fn default_column_label() -> String {
    "Days out of stock".to_string()
}

fn default_day_singular() -> String {
    "day".to_string()
}

fn default_day_plural() -> String {
    "days".to_string()
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults when it does not exist
    pub fn load_from(config_path: &Path) -> crate::Result<Self> {
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str(&content)
                .map_err(|e| crate::Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        config.reaper.policy()?;
        Ok(config)
    }

    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("stockreaper")
            .join("config.toml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("catalog.db")
    }

    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
