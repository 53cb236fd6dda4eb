use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::custody::CustodyPolicy;

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
    pub custody: CustodyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            custody: CustodyConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Return deadlines and the cadence of the background alert scan.
#[derive(Debug, Clone)]
pub struct CustodyConfig {
    pub policy: CustodyPolicy,
    pub scan_interval: Duration,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            policy: CustodyPolicy::default(),
            scan_interval: Duration::from_secs(60),
        }
    }
}

impl CustodyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = CustodyPolicy::default();
        let policy = CustodyPolicy {
            active_deadline_days: number_var(
                "CUSTODY_ACTIVE_DEADLINE_DAYS",
                defaults.active_deadline_days,
            )?,
            dismissed_deadline_days: number_var(
                "CUSTODY_DISMISSED_DEADLINE_DAYS",
                defaults.dismissed_deadline_days,
            )?,
            warning_window_days: number_var(
                "CUSTODY_WARNING_WINDOW_DAYS",
                defaults.warning_window_days,
            )?,
        };
        policy.validate().map_err(ConfigError::InvalidPolicy)?;

        let interval_secs: u64 = number_var("CUSTODY_SCAN_INTERVAL_SECS", 60)?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "CUSTODY_SCAN_INTERVAL_SECS",
            });
        }

        Ok(Self {
            policy,
            scan_interval: Duration::from_secs(interval_secs),
        })
    }
}

fn number_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a positive whole number")
            }
            ConfigError::InvalidPolicy(reason) => write!(f, "invalid custody policy: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidPolicy(_) => None,
        }
    }
}
