//! Environment-driven application configuration.
//!
//! Every knob has a default in code; environment variables override.
//! Loaded once at startup and logged.

use std::net::{IpAddr, Ipv4Addr};

use crate::incidents;
use crate::wheel::WheelLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Requests allowed per window, per endpoint group.
#[derive(Debug, Clone, Copy)]
pub struct RateSettings {
    pub window_secs: u64,
    pub wheel: u32,
    pub spin: u32,
    pub analytics: u32,
    pub blockchain: u32,
    pub collaboration: u32,
    pub report: u32,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            window_secs: 60,
            wheel: 50,
            spin: 30,
            analytics: 100,
            blockchain: 20,
            collaboration: 50,
            report: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub limits: WheelLimits,
    pub incident_capacity: usize,
    pub rate: RateSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            environment: Environment::Development,
            limits: WheelLimits::default(),
            incident_capacity: incidents::DEFAULT_CAPACITY,
            rate: RateSettings::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let environment = match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        let limits = WheelLimits {
            min_segments: env_parse("WHEEL_MIN_SEGMENTS", defaults.limits.min_segments),
            max_segments: env_parse("WHEEL_MAX_SEGMENTS", defaults.limits.max_segments),
            max_text_length: env_parse("WHEEL_MAX_TEXT_LENGTH", defaults.limits.max_text_length),
        };

        let rate = RateSettings {
            window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", defaults.rate.window_secs),
            wheel: env_parse("RATE_LIMIT_WHEEL", defaults.rate.wheel),
            spin: env_parse("RATE_LIMIT_SPIN", defaults.rate.spin),
            analytics: env_parse("RATE_LIMIT_ANALYTICS", defaults.rate.analytics),
            blockchain: env_parse("RATE_LIMIT_BLOCKCHAIN", defaults.rate.blockchain),
            collaboration: env_parse("RATE_LIMIT_COLLABORATION", defaults.rate.collaboration),
            report: env_parse("RATE_LIMIT_REPORT", defaults.rate.report),
        };

        let config = Self {
            host: env_parse("HOST", defaults.host),
            port: env_parse("PORT", defaults.port),
            environment,
            limits,
            incident_capacity: env_parse("INCIDENT_LOG_CAPACITY", defaults.incident_capacity),
            rate,
        };

        tracing::info!(
            environment = ?config.environment,
            port = config.port,
            min_segments = config.limits.min_segments,
            max_segments = config.limits.max_segments,
            max_text_length = config.limits.max_text_length,
            incident_capacity = config.incident_capacity,
            "Configuration loaded"
        );

        config
    }
}
