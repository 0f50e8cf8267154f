// ABOUTME: Environment-based engine configuration
// ABOUTME: Base URL, HTTP timeouts, admin rate limits, and log level parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! Environment-driven configuration for embedding hosts.
//!
//! Every knob has a default, so `EngineConfig::from_env()` succeeds in a bare
//! environment; set variables only to override.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Strongly typed log level configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string, defaulting to `Info` for unrecognized values.
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

/// Engine configuration, loaded once at host startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the platform API, e.g. `https://api.lumen.example`.
    pub api_base_url: String,
    /// Request timeout for feature and audit calls.
    pub http_timeout_secs: u64,
    /// Connect timeout for the pooled HTTP client.
    pub http_connect_timeout_secs: u64,
    /// Admin mutation budget per rolling window (advisory, client-side).
    pub admin_rate_limit: u32,
    /// Rolling window length for the admin mutation budget.
    pub admin_rate_window_secs: u64,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8081".to_owned(),
            http_timeout_secs: 30,
            http_connect_timeout_secs: 10,
            admin_rate_limit: 10,
            admin_rate_window_secs: 60,
            log_level: LogLevel::Info,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, applying defaults for
    /// anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable is set but unparseable.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_base_url: env::var("LUMEN_API_BASE_URL").unwrap_or(defaults.api_base_url),
            http_timeout_secs: parse_env("LUMEN_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            http_connect_timeout_secs: parse_env(
                "LUMEN_HTTP_CONNECT_TIMEOUT_SECS",
                defaults.http_connect_timeout_secs,
            )?,
            admin_rate_limit: parse_env("LUMEN_ADMIN_RATE_LIMIT", defaults.admin_rate_limit)?,
            admin_rate_window_secs: parse_env(
                "LUMEN_ADMIN_RATE_WINDOW_SECS",
                defaults.admin_rate_window_secs,
            )?,
            log_level: env::var("LUMEN_LOG_LEVEL")
                .map(|value| LogLevel::from_str_or_default(&value))
                .unwrap_or(defaults.log_level),
        })
    }
}

/// Parse a numeric environment variable, keeping the default when unset.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {value}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.admin_rate_limit, 10);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn log_level_parsing_falls_back_to_info() {
        assert_eq!(LogLevel::from_str_or_default("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str_or_default("verbose"), LogLevel::Info);
    }
}
