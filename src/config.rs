// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored as TOML through confy. Every field has a default,
//! so a missing or partial file always loads. Command-line flags override
//! whatever is stored here.

use std::path::PathBuf;
use std::time::Duration;

use meso_archive::DEFAULT_ARCHIVE_BASE;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "mesogif";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Root of the mesoanalysis image archive
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,

    /// Where fetched frames are staged (defaults to the user cache directory)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Where finished GIFs are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Staged frames older than this are evicted by `clean` and `janitor`
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// How often `janitor` sweeps the staging directory
    #[serde(default = "default_janitor_interval_secs")]
    pub janitor_interval_secs: u64,

    /// User-Agent header sent to the archive
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_archive_base_url() -> String {
    DEFAULT_ARCHIVE_BASE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_janitor_interval_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("mesogif/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            archive_base_url: default_archive_base_url(),
            staging_dir: None,
            output_dir: default_output_dir(),
            stale_after_secs: default_stale_after_secs(),
            janitor_interval_secs: default_janitor_interval_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Staging directory, falling back to `<cache>/mesogif/images`
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(|| {
            let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
            path.push(APP_NAME);
            path.push("images");
            path
        })
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    #[must_use]
    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.archive_base_url, DEFAULT_ARCHIVE_BASE);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.stale_after(), Duration::from_secs(3600));
        assert_eq!(config.janitor_interval(), Duration::from_secs(300));
        assert!(config.user_agent.starts_with("mesogif/"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "stale_after_secs": 60, "staging_dir": "/tmp/frames" }"#)
                .unwrap();
        assert_eq!(config.stale_after_secs, 60);
        assert_eq!(config.staging_dir(), PathBuf::from("/tmp/frames"));
        assert_eq!(config.archive_base_url, DEFAULT_ARCHIVE_BASE);
        assert_eq!(config.config_version, 1);
    }

    #[test]
    fn test_staging_dir_fallback() {
        let config = AppConfig::default();
        assert!(config.staging_dir().ends_with("mesogif/images"));
    }
}
