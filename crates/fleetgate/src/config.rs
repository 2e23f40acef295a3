//! Configuration management for the fleetgate binary.
//!
//! Settings come from a TOML file, are adjusted by command-line flags and are
//! finally turned into the [`CoordinatorConfig`] value the core runs on.

use anyhow::Context;
use fleetgate_core::CoordinatorConfig;
use fleetgate_protocol::{GroupAssignment, ServerRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn default_instance_id() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "fleetgate".to_string())
}

fn default_rescue_poll_interval_ms() -> u64 {
    100
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_group() -> String {
    "lobby".to_string()
}

fn default_true() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub instance: InstanceSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub seed: SeedSettings,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Identity of this proxy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSettings {
    /// Instance name used in logs; defaults to `$HOSTNAME`
    #[serde(default = "default_instance_id")]
    pub id: String,
}

/// Timing and grouping for player routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Delay between rescue attempts for a kicked player, in milliseconds
    #[serde(default = "default_rescue_poll_interval_ms")]
    pub rescue_poll_interval_ms: u64,
    /// Health ping timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Group for servers announced without one
    #[serde(default = "default_group")]
    pub default_group: String,
    #[serde(default = "default_true")]
    pub default_group_fallback: bool,
}

/// Which broker carries the bus topics and the shared directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusBackend {
    /// In-process only; the instance sees nothing from its peers
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSettings {
    #[serde(default)]
    pub backend: BusBackend,
    /// Broker address, used by the `redis` backend
    #[serde(default = "default_redis_url")]
    pub url: String,
}

/// Servers this instance announces when it starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedSettings {
    #[serde(default)]
    pub servers: Vec<SeedServer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedServer {
    pub id: String,
    pub host: String,
    pub port: u16,
    /// Group to join; the routing default group when absent
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_true")]
    pub fallback: bool,
}

impl SeedServer {
    pub fn record(&self) -> ServerRecord {
        ServerRecord::new(&self.id, &self.host, self.port)
    }

    pub fn assignment(&self) -> Option<GroupAssignment> {
        self.group
            .as_ref()
            .map(|group| GroupAssignment::new(group, self.fallback))
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            id: default_instance_id(),
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            rescue_poll_interval_ms: default_rescue_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            default_group: default_group(),
            default_group_fallback: true,
        }
    }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            backend: BusBackend::default(),
            url: default_redis_url(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration there and
    /// returns it.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            instance_id: self.instance.id.clone(),
            rescue_poll_interval: Duration::from_millis(self.routing.rescue_poll_interval_ms),
            probe_timeout: Duration::from_millis(self.routing.probe_timeout_ms),
            default_group: GroupAssignment::new(
                &self.routing.default_group,
                self.routing.default_group_fallback,
            ),
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.instance.id.trim().is_empty() {
            return Err("Instance id cannot be empty".to_string());
        }

        if self.routing.rescue_poll_interval_ms == 0 {
            return Err("Rescue poll interval must be greater than zero".to_string());
        }
        if self.routing.probe_timeout_ms == 0 {
            return Err("Probe timeout must be greater than zero".to_string());
        }
        if self.routing.default_group.is_empty() {
            return Err("Default group cannot be empty".to_string());
        }

        for server in &self.seed.servers {
            if server.id.is_empty() || server.host.is_empty() {
                return Err(format!("Seed server '{}' needs both an id and a host", server.id));
            }
            if server.id.contains('|') || server.host.contains('|') {
                return Err(format!("Seed server '{}' contains a reserved '|' character", server.id));
            }
            if server.group.as_deref() == Some("") {
                return Err(format!("Seed server '{}' has an empty group", server.id));
            }
        }

        if self.bus.backend == BusBackend::Redis
            && !(self.bus.url.starts_with("redis://") || self.bus.url.starts_with("rediss://"))
        {
            return Err(format!("Invalid Redis url: {}", self.bus.url));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.rescue_poll_interval_ms, 100);
        assert_eq!(config.routing.probe_timeout_ms, 3000);
        assert_eq!(config.logging.level, "info");
        assert!(config.seed.servers.is_empty());
        assert_eq!(config.bus.backend, BusBackend::Memory);
    }

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.routing.default_group, "lobby");

        // The written file loads back to the same settings
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.instance.id, config.instance.id);
        assert_eq!(reloaded.routing.probe_timeout_ms, config.routing.probe_timeout_ms);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[instance]
id = "proxy-7"

[routing]
rescue_poll_interval_ms = 250
default_group = "hub"
default_group_fallback = false

[[seed.servers]]
id = "hub-1"
host = "10.0.0.4"
port = 25565

[[seed.servers]]
id = "mg-1"
host = "10.0.0.5"
port = 25570
group = "minigame"
fallback = false

[bus]
backend = "redis"
url = "redis://cache.internal:6379"

[logging]
level = "debug"
json_format = true
"#;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fleetgate.toml");
        tokio::fs::write(&path, toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.instance.id, "proxy-7");
        assert_eq!(config.routing.probe_timeout_ms, 3000);
        assert_eq!(config.seed.servers.len(), 2);
        assert!(config.seed.servers[0].assignment().is_none());
        assert_eq!(
            config.seed.servers[1].assignment(),
            Some(GroupAssignment::new("minigame", false))
        );
        assert!(config.logging.json_format);
        assert_eq!(config.bus.backend, BusBackend::Redis);
        assert_eq!(config.bus.url, "redis://cache.internal:6379");

        let coordinator = config.to_coordinator_config();
        assert_eq!(coordinator.instance_id, "proxy-7");
        assert_eq!(coordinator.rescue_poll_interval, Duration::from_millis(250));
        assert_eq!(coordinator.default_group, GroupAssignment::new("hub", false));
    }

    #[tokio::test]
    async fn test_unparsable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[routing\nprobe_timeout_ms = ").await.unwrap();

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.routing.rescue_poll_interval_ms = 0;
        assert!(config.validate().unwrap_err().contains("Rescue poll interval"));

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("Invalid log level"));

        let mut config = AppConfig::default();
        config.bus.backend = BusBackend::Redis;
        config.bus.url = "cache.internal:6379".to_string();
        assert!(config.validate().unwrap_err().contains("Redis url"));

        let mut config = AppConfig::default();
        config.seed.servers.push(SeedServer {
            id: "a|b".to_string(),
            host: "10.0.0.1".to_string(),
            port: 25565,
            group: None,
            fallback: true,
        });
        assert!(config.validate().unwrap_err().contains("reserved"));
    }
}
