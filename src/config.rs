//! Application-level configuration loading for channel capacities and the
//! challenge urgency window.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PODIUM_BACK_CONFIG_PATH";

const DEFAULT_GLOBAL_CAPACITY: usize = 64;
const DEFAULT_TEAM_CAPACITY: usize = 16;
const DEFAULT_URGENT_WINDOW_HOURS: u64 = 48;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    global_channel_capacity: usize,
    team_channel_capacity: usize,
    urgent_window_hours: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Broadcast capacity of the global `leaderboard` channel.
    pub fn global_channel_capacity(&self) -> usize {
        self.global_channel_capacity
    }

    /// Broadcast capacity of each `team:<id>` channel.
    pub fn team_channel_capacity(&self) -> usize {
        self.team_channel_capacity
    }

    /// How far ahead of its deadline a challenge counts as urgent.
    pub fn urgent_window(&self) -> Duration {
        Duration::from_secs(self.urgent_window_hours * 3600)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            global_channel_capacity: DEFAULT_GLOBAL_CAPACITY,
            team_channel_capacity: DEFAULT_TEAM_CAPACITY,
            urgent_window_hours: DEFAULT_URGENT_WINDOW_HOURS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    global_channel_capacity: Option<usize>,
    team_channel_capacity: Option<usize>,
    urgent_window_hours: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            global_channel_capacity: value
                .global_channel_capacity
                .unwrap_or(defaults.global_channel_capacity),
            team_channel_capacity: value
                .team_channel_capacity
                .unwrap_or(defaults.team_channel_capacity),
            urgent_window_hours: value
                .urgent_window_hours
                .unwrap_or(defaults.urgent_window_hours),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_raw_config_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"team_channel_capacity": 4}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.team_channel_capacity(), 4);
        assert_eq!(config.global_channel_capacity(), DEFAULT_GLOBAL_CAPACITY);
        assert_eq!(
            config.urgent_window(),
            Duration::from_secs(DEFAULT_URGENT_WINDOW_HOURS * 3600)
        );
    }
}
