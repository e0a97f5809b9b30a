use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::rating::{RatingPolicy, ResetPolicy, UNLIMITED_RECURRING_PROMPTS};

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
    pub storage: StorageConfig,
    pub rating: RatingConfig,
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

        let store_path = env::var("RATING_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("rating-state.json"));

        let rating = RatingConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                rating_debug: rating.debug_enabled,
            },
            storage: StorageConfig { path: store_path },
            rating,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Mirrors `RATING_DEBUG` so engine decisions show up at debug level.
    pub rating_debug: bool,
}

/// Where the usage record is persisted.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

/// Engine settings: thresholds plus the tracking switches.
#[derive(Debug, Clone)]
pub struct RatingConfig {
    pub app_version: String,
    pub policy: RatingPolicy,
    pub prompt_on_launch: bool,
    pub reset_on_version_change: bool,
    pub debug_enabled: bool,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            policy: RatingPolicy::default(),
            prompt_on_launch: false,
            reset_on_version_change: false,
            debug_enabled: false,
        }
    }
}

impl RatingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = RatingPolicy::default();

        let policy = RatingPolicy {
            min_days_used: number("RATING_MIN_DAYS_USED", defaults.min_days_used)?,
            min_app_sessions: number("RATING_MIN_APP_SESSIONS", defaults.min_app_sessions)?,
            min_significant_events: number(
                "RATING_MIN_SIGNIFICANT_EVENTS",
                defaults.min_significant_events,
            )?,
            reminder_cooldown_days: number(
                "RATING_REMINDER_COOLDOWN_DAYS",
                defaults.reminder_cooldown_days,
            )?,
            decline_cooldown_days: number(
                "RATING_DECLINE_COOLDOWN_DAYS",
                defaults.decline_cooldown_days,
            )?,
            decline_back_off_factor: factor(
                "RATING_DECLINE_BACKOFF_FACTOR",
                defaults.decline_back_off_factor,
            )?,
            decline_max_recurring_prompts: recurring(
                "RATING_DECLINE_MAX_RECURRING",
                defaults.decline_max_recurring_prompts,
            )?,
            rerate_cooldown_days: number(
                "RATING_RERATE_COOLDOWN_DAYS",
                defaults.rerate_cooldown_days,
            )?,
            rerate_back_off_factor: factor(
                "RATING_RERATE_BACKOFF_FACTOR",
                defaults.rerate_back_off_factor,
            )?,
            rerate_max_recurring_prompts: recurring(
                "RATING_RERATE_MAX_RECURRING",
                defaults.rerate_max_recurring_prompts,
            )?,
            ..defaults
        };

        Ok(Self {
            app_version: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            policy,
            prompt_on_launch: flag("RATING_PROMPT_ON_LAUNCH", false)?,
            reset_on_version_change: flag("RATING_RESET_ON_VERSION_CHANGE", false)?,
            debug_enabled: flag("RATING_DEBUG", false)?,
        })
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        if self.reset_on_version_change {
            ResetPolicy::OnVersionChange
        } else {
            ResetPolicy::Never
        }
    }
}

fn number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn factor(key: &'static str, default: Option<f64>) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .map(Some)
            .ok_or(ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn recurring(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("unlimited") => {
            Ok(UNLIMITED_RECURRING_PROMPTS)
        }
        Ok(_) => number(key, default),
        Err(_) => Ok(default),
    }
}

fn flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
