use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::evaluation::orchestrator::{RetryPolicy, INITIAL_RETRY_DELAY_MS, MAX_RETRIES};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Upper bound for `APP_MAX_RETRIES`; backoff doubles per retry.
pub const MAX_CONFIGURABLE_RETRIES: u32 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub classifier: ClassifierConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Reads every section from the process environment, after merging `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::from_str(&env_or("APP_ENV", "development")),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig {
                log_level: env_or("APP_LOG_LEVEL", "info"),
            },
            classifier: ClassifierConfig::from_env()?,
            retry: retry_policy_from_env()?,
        })
    }
}

fn retry_policy_from_env() -> Result<RetryPolicy, ConfigError> {
    let max_retries = parse_numeric("APP_MAX_RETRIES", MAX_RETRIES)?;
    if max_retries > MAX_CONFIGURABLE_RETRIES {
        return Err(ConfigError::InvalidNumber {
            variable: "APP_MAX_RETRIES",
            value: max_retries.to_string(),
        });
    }
    let delay_ms = parse_numeric("APP_INITIAL_RETRY_DELAY_MS", INITIAL_RETRY_DELAY_MS)?;
    Ok(RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(delay_ms),
    })
}

fn env_or(variable: &str, default: &str) -> String {
    env::var(variable).unwrap_or_else(|_| default.to_string())
}

fn parse_numeric<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or("APP_HOST", "127.0.0.1"),
            port: parse_numeric("APP_PORT", 3000u16)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection settings for the Anthropic Messages API.
#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
}

impl ClassifierConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            api_url: env_or("ANTHROPIC_API_URL", DEFAULT_API_URL),
            api_version: env_or("ANTHROPIC_VERSION", DEFAULT_API_VERSION),
            model: env_or("APP_CLASSIFIER_MODEL", DEFAULT_MODEL),
            max_tokens: parse_numeric("APP_CLASSIFIER_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
        })
    }

    /// The key is only needed once a live classifier is built.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer in range (got '{value}')")
            }
            ConfigError::MissingApiKey => write!(f, "missing ANTHROPIC_API_KEY"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidNumber { .. }
            | ConfigError::MissingApiKey => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for variable in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_API_URL",
            "ANTHROPIC_VERSION",
            "APP_CLASSIFIER_MODEL",
            "APP_CLASSIFIER_MAX_TOKENS",
            "APP_MAX_RETRIES",
            "APP_INITIAL_RETRY_DELAY_MS",
        ] {
            env::remove_var(variable);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.classifier.model, DEFAULT_MODEL);
        assert_eq!(config.classifier.max_tokens, 4096);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(1000));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_out_of_range_ports() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "70000");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { variable, value }) => {
                assert_eq!(variable, "APP_PORT");
                assert_eq!(value, "70000");
            }
            other => panic!("expected invalid port, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_retry_budget() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MAX_RETRIES", "three");
        let err = AppConfig::load().expect_err("retry budget must be numeric");
        assert!(err.to_string().contains("APP_MAX_RETRIES"));
        reset_env();
    }

    #[test]
    fn caps_the_retry_budget() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MAX_RETRIES", "10");
        let config = AppConfig::load().expect("cap itself is allowed");
        assert_eq!(config.retry.max_retries, MAX_CONFIGURABLE_RETRIES);

        env::set_var("APP_MAX_RETRIES", "4294967295");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { variable, value }) => {
                assert_eq!(variable, "APP_MAX_RETRIES");
                assert_eq!(value, "4294967295");
            }
            other => panic!("expected invalid retry budget, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn api_key_is_required_and_redacted() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads");
        assert!(matches!(
            config.classifier.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));

        env::set_var("ANTHROPIC_API_KEY", "sk-test-secret");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.classifier.require_api_key().ok(), Some("sk-test-secret"));
        assert!(!format!("{:?}", config.classifier).contains("sk-test-secret"));
        reset_env();
    }
}
