use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub online: OnlineConfig,
    pub logging: LoggingConfig,
}

/// Where the node's setup service lives and how the UDP exchange is paced.
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Address of the node while it hosts its own access point.
    pub address: String,
    /// Local address the setup socket binds to.
    pub bind: String,
    /// Pause after binding before a command is sent, in milliseconds.
    pub settle_ms: u64,
    /// Deadline for a whole command/reply exchange, in milliseconds.
    pub exchange_timeout_ms: u64,
}

/// Budget for the server-side online poll after configuration.
#[derive(Debug, Deserialize)]
pub struct OnlineConfig {
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                address: "192.168.4.1:1025".to_string(),
                bind: "0.0.0.0:1025".to_string(),
                settle_ms: 1_000,
                exchange_timeout_ms: 4_000,
            },
            online: OnlineConfig {
                poll_attempts: 60,
                poll_interval_ms: 1_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [device]
            address = "192.168.4.1:1025"
            bind = "0.0.0.0:1025"
            settle_ms = 500
            exchange_timeout_ms = 2000

            [online]
            poll_attempts = 10
            poll_interval_ms = 250

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.device.settle_ms, 500);
        assert_eq!(config.online.poll_attempts, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_defaults_match_the_stock_node() {
        let config = Config::default();
        assert_eq!(config.device.address, "192.168.4.1:1025");
        assert_eq!(config.device.exchange_timeout_ms, 4_000);
        assert_eq!(config.online.poll_attempts, 60);
    }
}
