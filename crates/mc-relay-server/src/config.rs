use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use mc_relay_proto::codec::DEFAULT_MAX_FRAME_SIZE;

use crate::error::RelayError;

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    pub relay: RelaySection,
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub extensions: ExtensionsSection,
}

#[derive(Debug, Deserialize)]
pub struct RelaySection {
    pub address: String,
    pub port: u16,
    /// Chat prefix for relay-local commands.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Largest accepted frame payload in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

fn default_command_prefix() -> String {
    "/".into()
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

#[derive(Debug, Deserialize)]
pub struct UpstreamSection {
    pub address: String,
    #[serde(default = "default_upstream_port")]
    pub port: u16,
    /// Bound on TCP connect and on the upstream login exchange.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_upstream_port() -> u16 {
    25565
}

fn default_connect_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_limbo_keep_alive")]
    pub limbo_keep_alive_secs: u64,
}

fn default_tick_interval() -> u64 {
    50
}

fn default_limbo_keep_alive() -> u64 {
    10
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            limbo_keep_alive_secs: default_limbo_keep_alive(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtensionsSection {
    /// Extensions registered but not enabled at startup.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl RelayConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.relay.address, self.relay.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.connect_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms.max(1))
    }

    pub fn limbo_keep_alive(&self) -> Duration {
        Duration::from_secs(self.session.limbo_keep_alive_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [relay]
            address = "127.0.0.1"
            port = 25566

            [upstream]
            address = "play.example.net"

            [logging]
            level = "debug"
        "#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:25566");
        assert_eq!(config.relay.command_prefix, "/");
        assert_eq!(config.relay.max_frame_size, 2 * 1024 * 1024);
        assert_eq!(config.upstream.address, "play.example.net");
        assert_eq!(config.upstream.port, 25565);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        // session section defaults when absent
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.limbo_keep_alive(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "debug");
        assert!(config.extensions.disabled.is_empty());
    }

    #[test]
    fn parse_config_with_overrides() {
        let toml_str = r#"
            [relay]
            address = "0.0.0.0"
            port = 25565
            command_prefix = "."
            max_frame_size = 65536

            [upstream]
            address = "localhost"
            port = 25570
            connect_timeout_secs = 3

            [session]
            tick_interval_ms = 100

            [extensions]
            disabled = ["Radar"]
        "#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.relay.command_prefix, ".");
        assert_eq!(config.relay.max_frame_size, 65536);
        assert_eq!(config.upstream.port, 25570);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.session.limbo_keep_alive_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.extensions.disabled, vec!["Radar".to_string()]);
    }

    #[test]
    fn missing_upstream_is_an_error() {
        let toml_str = r#"
            [relay]
            address = "0.0.0.0"
            port = 25565
        "#;
        assert!(toml::from_str::<RelayConfig>(toml_str).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RelayConfig::load("/nonexistent/relay.toml").unwrap_err();
        assert!(matches!(err, RelayError::Io(_)));
    }
}
