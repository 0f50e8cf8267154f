// ABOUTME: Structured logging setup for hosts embedding the engine
// ABOUTME: tracing-subscriber initialization with env-filter and format selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! Logging initialization for embedding hosts.
//!
//! The engine itself only emits `tracing` events; hosts that don't already
//! install a subscriber can call [`init`] once at startup. `RUST_LOG` takes
//! precedence over the configured level when set.

use std::io;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;

/// Log output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON format for production logging.
    Json,
    /// Human-readable format for development.
    #[default]
    Pretty,
    /// Compact format for space-constrained environments.
    Compact,
}

impl LogFormat {
    /// Parse from string, defaulting to `Pretty` for unrecognized values.
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Install a global tracing subscriber for the configured level and format.
///
/// Safe to call once per process; a second call is ignored (the first
/// subscriber wins), which keeps host and engine initialization from fighting.
pub fn init(config: &EngineConfig, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_tracing_level().to_string()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_target(true)
                .with_writer(io::stdout)
                .json();
            registry.with(layer).try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer().with_target(true).with_writer(io::stdout);
            registry.with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stdout);
            registry.with(layer).try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping existing one");
    }
}

/// Shorthand: initialize from environment configuration with pretty output.
pub fn init_from_env() {
    let config = EngineConfig::from_env().unwrap_or_default();
    let format = std::env::var("LUMEN_LOG_FORMAT")
        .map(|value| LogFormat::from_str_or_default(&value))
        .unwrap_or_default();
    init(&config, format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_falls_back_to_pretty() {
        assert!(matches!(LogFormat::from_str_or_default("json"), LogFormat::Json));
        assert!(matches!(
            LogFormat::from_str_or_default("rainbow"),
            LogFormat::Pretty
        ));
    }
}
