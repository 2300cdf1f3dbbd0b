//! Dispatcher and connection configuration, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// Configuration for the RCON relay.
///
/// All fields have defaults, so a config file only needs to override what
/// differs from a local Minecraft server setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Hostname or IP of the RCON server.
    pub host: String,
    /// RCON port (Minecraft default: 25575).
    pub port: u16,
    /// RCON password configured on the server.
    pub password: String,
    /// Minimum interval between identical commands, in milliseconds.
    /// Zero disables duplicate suppression.
    pub min_command_interval_ms: u64,
    /// Token bucket capacity and refill rate, commands per second.
    pub max_commands_per_second: u32,
    /// Low-priority queue capacity; overflow drops the oldest entry.
    pub queue_capacity: usize,
    /// Connect + authenticate attempts per send before the error surfaces.
    pub connect_attempts: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 25575,
            password: String::new(),
            min_command_interval_ms: 0,
            max_commands_per_second: 10,
            queue_capacity: 100,
            connect_attempts: 5,
        }
    }
}

impl RelayConfig {
    /// Loads and validates a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.host.is_empty(), "host must not be empty");
        ensure!(
            self.max_commands_per_second >= 1,
            "max_commands_per_second must be at least 1"
        );
        ensure!(self.queue_capacity >= 1, "queue_capacity must be at least 1");
        ensure!(self.connect_attempts >= 1, "connect_attempts must be at least 1");
        Ok(())
    }

    pub fn min_command_interval(&self) -> Duration {
        Duration::from_millis(self.min_command_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 25575);
        assert_eq!(config.min_command_interval_ms, 0);
        assert_eq!(config.max_commands_per_second, 10);
        assert_eq!(config.queue_capacity, 100);
        assert!(config.validate().is_ok());
        assert!(config.min_command_interval().is_zero());
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "host = \"mc.example.net\"\npassword = \"hunter2\"\nmax_commands_per_second = 4"
        )
        .unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.host, "mc.example.net");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.max_commands_per_second, 4);
        assert_eq!(config.port, 25575);
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hosty = \"oops\"").unwrap();
        assert!(RelayConfig::load(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_rate_and_zero_queue() {
        let config = RelayConfig {
            max_commands_per_second: 0,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RelayConfig {
            queue_capacity: 0,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
