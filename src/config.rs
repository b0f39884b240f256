//! Plugin configuration
//!
//! Loaded once at startup from TOML. Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Username reported for the dashboard login when none is configured
pub const DEFAULT_USERNAME: &str = "OVOS";

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid unit template {0:?}: expected letters, digits, '-', '_', '.' or ':'")]
    InvalidUnitTemplate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dashboard login username
    pub username: String,
    pub dashboard: DashboardConfig,
    pub timing: TimingConfig,
    pub bus: BusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            dashboard: DashboardConfig::default(),
            timing: TimingConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

/// Service unit settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Template unit; instances are `<unit_template>@<secret>.service`
    pub unit_template: String,
    /// Port the dashboard serves on
    pub port: u16,
    /// Talk to the per-user service manager (`systemctl --user`)
    pub user_scope: bool,
    /// Service manager program, looked up on PATH when not absolute
    pub systemctl: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            unit_template: "ovos-dashboard".to_string(),
            port: 5000,
            user_scope: true,
            systemctl: "systemctl".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound for a single service manager call
    pub command_timeout_ms: u64,
    /// Interval between status polls after start/stop
    pub settle_poll_ms: u64,
    /// How long to wait for start/stop to become visible
    pub settle_max_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 10_000,
            settle_poll_ms: 250,
            settle_max_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn settle_poll(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }

    pub fn settle_max(&self) -> Duration {
        Duration::from_millis(self.settle_max_ms)
    }
}

/// Messagebus connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub route: String,
    pub ssl: bool,
    pub reconnect_interval_ms: u64,
    /// Max wait for a local network before connecting
    pub network_wait_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8181,
            route: "/core".to_string(),
            ssl: false,
            reconnect_interval_ms: 2_000,
            network_wait_ms: 30_000,
        }
    }
}

impl BusConfig {
    /// Websocket URL, e.g. `ws://127.0.0.1:8181/core`
    pub fn url(&self) -> String {
        let scheme = if self.ssl { "wss" } else { "ws" };
        let route = self.route.trim_start_matches('/');
        format!("{}://{}:{}/{}", scheme, self.host, self.port, route)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn network_wait(&self) -> Duration {
        Duration::from_millis(self.network_wait_ms)
    }
}

impl Config {
    /// Environment variable naming a config file
    pub const ENV_VAR: &'static str = "OVOS_DASHBOARD_CONFIG";

    /// Default location: `<config dir>/ovos-dashboard/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ovos-dashboard").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path or `OVOS_DASHBOARD_CONFIG` must point at a readable
    /// file. The default location is optional; built-in defaults are used
    /// when it does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(Self::ENV_VAR).map(PathBuf::from));

        match explicit {
            Some(path) => Self::from_file(&path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loading config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text)?;
        config.normalize()?;
        Ok(config)
    }

    /// Apply fallbacks and validate values that end up on a command line
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            self.username = DEFAULT_USERNAME.to_string();
        }

        let template = &self.dashboard.unit_template;
        let valid = !template.is_empty()
            && template
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        if !valid {
            return Err(ConfigError::InvalidUnitTemplate(template.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.username, "OVOS");
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.timing.settle_max(), Duration::from_secs(3));
        assert_eq!(config.bus.url(), "ws://127.0.0.1:8181/core");
    }

    #[test]
    fn test_username_only() {
        let config = Config::from_toml_str(r#"username = "neon""#).unwrap();
        assert_eq!(config.username, "neon");
        assert_eq!(config.dashboard, DashboardConfig::default());
    }

    #[test]
    fn test_blank_username_falls_back() {
        let config = Config::from_toml_str(r#"username = "  ""#).unwrap();
        assert_eq!(config.username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [dashboard]
            port = 8443

            [timing]
            settle_max_ms = 500

            [bus]
            host = "mycroft.local"
            route = "core"
            ssl = true
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.port, 8443);
        assert_eq!(config.dashboard.unit_template, "ovos-dashboard");
        assert_eq!(config.timing.settle_max(), Duration::from_millis(500));
        assert_eq!(config.timing.settle_poll(), Duration::from_millis(250));
        assert_eq!(config.bus.url(), "wss://mycroft.local:8181/core");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = Config::from_toml_str("module = \"ovos-PHAL-plugin-dashboard\"").unwrap();
        assert_eq!(config.username, "OVOS");
    }

    #[test]
    fn test_rejects_unit_template_with_shell_characters() {
        let result = Config::from_toml_str(
            r#"
            [dashboard]
            unit_template = "dash; rm -rf ~"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidUnitTemplate(_))));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(matches!(
            Config::from_toml_str("username = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "username = \"pi\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.username, "pi");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
