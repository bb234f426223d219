//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use jornada_core::{Thresholds, WorkloadConfig};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// ```toml
/// [thresholds]
/// meal_min_minutes = 60
///
/// [workload]
/// special_workload_enabled = true
/// holidays = ["2025-04-21"]
///
/// [workload.overrides]
/// GARAGEM = "06:00"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Legal limits for the infraction engine.
    pub thresholds: Thresholds,

    /// Workload resolution settings.
    pub workload: WorkloadConfig,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: built-in defaults, the user config file, the file
    /// passed with `--config`, then `JORNADA_*` environment variables
    /// (`JORNADA_THRESHOLDS__MEAL_MIN_MINUTES=45`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("JORNADA_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for jornada.
///
/// On Linux: `~/.config/jornada`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jornada"))
}
