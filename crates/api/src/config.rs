//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use event_bus::{ConsumerConfig, DEFAULT_FLUSH_TIMEOUT, DEFAULT_TOPIC, ProducerConfig};

/// Which services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Mutation API and event publishing only.
    Producer,
    /// Event consumption and read API only.
    Consumer,
    /// Both services in one process.
    #[default]
    All,
}

impl Role {
    pub fn runs_producer(self) -> bool {
        matches!(self, Role::Producer | Role::All)
    }

    pub fn runs_consumer(self) -> bool {
        matches!(self, Role::Consumer | Role::All)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "producer" => Ok(Role::Producer),
            "consumer" => Ok(Role::Consumer),
            "all" => Ok(Role::All),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Message transport connecting producer and consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// In-process broker. Only usable when both roles share the process.
    #[default]
    Memory,
    /// Kafka cluster, requires the `kafka` feature.
    Kafka,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TransportKind::Memory),
            "kafka" => Ok(TransportKind::Kafka),
            other => Err(format!("unknown transport: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PRODUCER_PORT`: mutation API port (default: `8081`)
/// - `CONSUMER_PORT`: read API port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `ROLE`: `producer`, `consumer` or `all` (default: `all`)
/// - `TRANSPORT`: `memory` or `kafka` (default: `memory`)
/// - `KAFKA_BOOTSTRAP_SERVERS`: broker list (default: `"localhost:9092"`)
/// - `PRODUCTS_TOPIC`: topic name (default: `"products"`)
/// - `CONSUMER_GROUP_ID`: consumer group (default: `"products-group"`)
/// - `FLUSH_TIMEOUT_SECS`: shutdown flush deadline (default: `15`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub producer_port: u16,
    pub consumer_port: u16,
    pub log_level: String,
    pub role: Role,
    pub transport: TransportKind,
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    pub flush_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparsable values are logged and replaced by their default. The
    /// in-memory transport forces [`Role::All`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut config = Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            producer_port: parsed_var("PRODUCER_PORT").unwrap_or(defaults.producer_port),
            consumer_port: parsed_var("CONSUMER_PORT").unwrap_or(defaults.consumer_port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            role: parsed_var("ROLE").unwrap_or(defaults.role),
            transport: parsed_var("TRANSPORT").unwrap_or(defaults.transport),
            bootstrap_servers: std::env::var("KAFKA_BOOTSTRAP_SERVERS")
                .unwrap_or(defaults.bootstrap_servers),
            topic: std::env::var("PRODUCTS_TOPIC").unwrap_or(defaults.topic),
            group_id: std::env::var("CONSUMER_GROUP_ID").unwrap_or(defaults.group_id),
            flush_timeout: parsed_var("FLUSH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.flush_timeout),
        };

        if config.transport == TransportKind::Memory && config.role != Role::All {
            tracing::warn!(
                role = ?config.role,
                "in-memory transport needs both roles in one process, running all"
            );
            config.role = Role::All;
        }

        config
    }

    /// Returns the `"host:port"` bind address of the mutation API.
    pub fn producer_addr(&self) -> String {
        format!("{}:{}", self.host, self.producer_port)
    }

    /// Returns the `"host:port"` bind address of the read API.
    pub fn consumer_addr(&self) -> String {
        format!("{}:{}", self.host, self.consumer_port)
    }

    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig::new(self.topic.clone())
            .bootstrap_servers(self.bootstrap_servers.clone())
            .flush_timeout(self.flush_timeout)
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            bootstrap_servers: self.bootstrap_servers.clone(),
            group_id: self.group_id.clone(),
            ..ConsumerConfig::new(self.topic.clone())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            producer_port: 8081,
            consumer_port: 8080,
            log_level: "info".to_string(),
            role: Role::All,
            transport: TransportKind::Memory,
            bootstrap_servers: "localhost:9092".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: "products-group".to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring invalid environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: &[&str] = &[
        "HOST",
        "PRODUCER_PORT",
        "CONSUMER_PORT",
        "ROLE",
        "TRANSPORT",
        "KAFKA_BOOTSTRAP_SERVERS",
        "PRODUCTS_TOPIC",
        "CONSUMER_GROUP_ID",
        "FLUSH_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(name, value) };
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.producer_port, 8081);
        assert_eq!(config.consumer_port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.role, Role::All);
        assert_eq!(config.transport, TransportKind::Memory);
        assert_eq!(config.topic, "products");
        assert_eq!(config.flush_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.producer_addr(), "127.0.0.1:8081");
        assert_eq!(config.consumer_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Producer".parse::<Role>(), Ok(Role::Producer));
        assert_eq!("consumer".parse::<Role>(), Ok(Role::Consumer));
        assert!("broker".parse::<Role>().is_err());
        assert!(Role::All.runs_producer() && Role::All.runs_consumer());
        assert!(!Role::Consumer.runs_producer());
    }

    #[test]
    fn test_bus_configs_follow_settings() {
        let config = Config {
            topic: "catalog".to_string(),
            group_id: "replicas".to_string(),
            flush_timeout: Duration::from_secs(3),
            ..Config::default()
        };

        let producer = config.producer_config();
        assert_eq!(producer.topic, "catalog");
        assert_eq!(producer.flush_timeout, Duration::from_secs(3));

        let consumer = config.consumer_config();
        assert_eq!(consumer.topic, "catalog");
        assert_eq!(consumer.group_id, "replicas");
        assert_eq!(consumer.auto_offset_reset, "earliest");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        clear_env();
        set_env("PRODUCER_PORT", "9001");
        set_env("CONSUMER_PORT", "9000");
        set_env("ROLE", "consumer");
        set_env("TRANSPORT", "kafka");
        set_env("PRODUCTS_TOPIC", "catalog");
        set_env("FLUSH_TIMEOUT_SECS", "5");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.producer_port, 9001);
        assert_eq!(config.consumer_port, 9000);
        assert_eq!(config.role, Role::Consumer);
        assert_eq!(config.transport, TransportKind::Kafka);
        assert_eq!(config.topic, "catalog");
        assert_eq!(config.flush_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back_to_defaults() {
        clear_env();
        set_env("PRODUCER_PORT", "not-a-port");
        set_env("TRANSPORT", "carrier-pigeon");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.producer_port, 8081);
        assert_eq!(config.transport, TransportKind::Memory);
    }

    #[test]
    #[serial]
    fn test_memory_transport_forces_all_roles() {
        clear_env();
        set_env("ROLE", "producer");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.transport, TransportKind::Memory);
        assert_eq!(config.role, Role::All);
    }
}
