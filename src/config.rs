//! Startup configuration for the gateway.
//!
//! Configuration is read once from the process environment when the gateway
//! starts and is never re-evaluated per request.
//!
//! | Variable | Default |
//! |---|---|
//! | `ENV` | `development` |
//! | `GATEWAY_ADDR` | `0.0.0.0:8787` |
//! | `WISH_SERVICE_ADDR` | `http://127.0.0.1:7777` |
//! | `WISH_SERVICE_TIMEOUT_MS` | `5000` |
//! | `GATEWAY_METRICS` | `true` |
//! | `GATEWAY_SHUTDOWN_TIMEOUT_SECS` | `30` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP listen address
pub const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:8787";

/// Default Wish Service endpoint
pub const DEFAULT_WISH_SERVICE_ADDR: &str = "http://127.0.0.1:7777";

/// Default deadline for a single backend call
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_millis(5000);

/// Deployment environment of the process.
///
/// Production hides the GraphiQL explorer, disables introspection and
/// sanitizes backend error details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Whether this is a production deployment
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "" => Ok(Environment::Development),
            other => Err(Error::Config(format!("unknown environment '{other}'"))),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment
    pub environment: Environment,

    /// HTTP listen address
    pub listen_addr: String,

    /// Wish Service endpoint URI
    pub wish_service_addr: String,

    /// Deadline for each backend call
    #[serde(with = "duration_millis")]
    pub backend_timeout: Duration,

    /// Mount the Prometheus `/metrics` route
    pub metrics_enabled: bool,

    /// How long in-flight requests may drain after a shutdown signal
    #[serde(with = "duration_secs")]
    pub shutdown_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            listen_addr: DEFAULT_GATEWAY_ADDR.to_string(),
            wish_service_addr: DEFAULT_WISH_SERVICE_ADDR.to_string(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            metrics_enabled: true,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults; values that cannot be parsed are
    /// reported as [`Error::Config`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = match env_var("ENV") {
            Some(value) => value.parse()?,
            None => defaults.environment,
        };

        Ok(Self {
            environment,
            listen_addr: env_var("GATEWAY_ADDR").unwrap_or(defaults.listen_addr),
            wish_service_addr: env_var("WISH_SERVICE_ADDR").unwrap_or(defaults.wish_service_addr),
            backend_timeout: parse_env::<u64>("WISH_SERVICE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.backend_timeout),
            metrics_enabled: parse_env::<bool>("GATEWAY_METRICS")?
                .unwrap_or(defaults.metrics_enabled),
            shutdown_timeout: parse_env::<u64>("GATEWAY_SHUTDOWN_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        })
    }

    /// Set the environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the backend call deadline
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Whether the GraphiQL explorer should be mounted
    pub fn graphiql_enabled(&self) -> bool {
        !self.environment.is_production()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("{key}={raw}: {e}")))
        })
        .transpose()
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "ENV",
        "GATEWAY_ADDR",
        "WISH_SERVICE_ADDR",
        "WISH_SERVICE_TIMEOUT_MS",
        "GATEWAY_METRICS",
        "GATEWAY_SHUTDOWN_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_when_env_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.listen_addr, "0.0.0.0:8787");
        assert_eq!(config.wish_service_addr, "http://127.0.0.1:7777");
        assert_eq!(config.backend_timeout, Duration::from_secs(5));
        assert!(config.metrics_enabled);
        assert!(config.graphiql_enabled());
    }

    #[test]
    fn test_production_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("ENV", "prod");
        std::env::set_var("WISH_SERVICE_ADDR", "http://wish:9000");
        std::env::set_var("WISH_SERVICE_TIMEOUT_MS", "250");
        std::env::set_var("GATEWAY_METRICS", "false");

        let config = GatewayConfig::from_env().unwrap();
        assert!(config.environment.is_production());
        assert!(!config.graphiql_enabled());
        assert_eq!(config.wish_service_addr, "http://wish:9000");
        assert_eq!(config.backend_timeout, Duration::from_millis(250));
        assert!(!config.metrics_enabled);

        clear_env();
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("WISH_SERVICE_TIMEOUT_MS", "soon");

        let err = GatewayConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("WISH_SERVICE_TIMEOUT_MS"));

        clear_env();
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("ENV", "staging-ish");

        assert!(matches!(GatewayConfig::from_env(), Err(Error::Config(_))));

        clear_env();
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"environment":"production","backend_timeout":100}"#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.backend_timeout, Duration::from_millis(100));
        assert_eq!(config.listen_addr, DEFAULT_GATEWAY_ADDR);
    }
}
