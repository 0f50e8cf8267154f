// ABOUTME: Library entry point for the Lumen CRM feature-entitlement engine
// ABOUTME: Registry, resolver, session store, backend sync, audit, and rate limiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

#![deny(unsafe_code)]

//! # Lumen Entitlements
//!
//! Client-side feature-entitlement engine for the Lumen CRM platform. The
//! engine answers one question for the UI ("does this user have feature X?")
//! and gives admin surfaces typed mutations that keep the backend and the
//! session in agreement.
//!
//! ## Architecture
//!
//! - [`registry`]: the compiled-in catalog of gateable capabilities with
//!   dependency, conflict, and default rules. Read-only, side-effect-free.
//! - [`resolver`]: pure resolution (user override, then global toggle, then
//!   disabled) and combination validation. Validation reports invalid
//!   combinations; it never enforces.
//! - [`store`]: per-session state container mediating backend writes. Local
//!   state changes only after the backend acknowledges a mutation.
//! - [`backend`]: the HTTP transport boundary and the named fail-open policy.
//! - [`audit`]: best-effort, fire-and-forget audit trail for mutations.
//! - [`rate_limit`]: advisory client-side throttle for admin entry points.
//!
//! ## Fail-open reads: read this before deploying
//!
//! When a feature fetch fails, the engine degrades instead of erroring: user
//! overrides fall back to an empty layer and global toggles to a conservative
//! core baseline, so features behave as disabled and the product stays
//! usable. This is a deliberate availability-over-enforcement trade-off
//! carried over from the platform's product behavior, not an accident, and it
//! means a network fault can silently narrow what a user sees. Both
//! converters live in [`backend`] (`fail_open_user`, `fail_open_global`), log
//! a `warn` on every degrade, and are the single place to swap in fail-closed
//! handling for stricter deployments.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lumen_entitlements::auth::StaticTokenProvider;
//! use lumen_entitlements::backend::HttpFeatureBackend;
//! use lumen_entitlements::audit::HttpAuditSink;
//! use lumen_entitlements::config::EngineConfig;
//! use lumen_entitlements::registry::FeatureKey;
//! use lumen_entitlements::store::FeatureStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let tokens = Arc::new(StaticTokenProvider::new("session-jwt"));
//! let backend = Arc::new(HttpFeatureBackend::new(&config, tokens.clone()));
//! let audit = Arc::new(HttpAuditSink::new(
//!     reqwest::Client::new(),
//!     &config.api_base_url,
//!     tokens,
//! ));
//!
//! let store = FeatureStore::new(backend, audit);
//! store.refresh_global_features().await;
//! if store.is_enabled(FeatureKey::AiTools).await {
//!     // render the AI tools hub
//! }
//! # Ok(())
//! # }
//! ```

/// Best-effort audit trail emission for entitlement mutations
pub mod audit;

/// Bearer-token provider abstraction for backend calls
pub mod auth;

/// HTTP transport boundary and fail-open read policy
pub mod backend;

/// Environment-based engine configuration
pub mod config;

/// Unified error taxonomy
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Client-side rate limiting for administrative mutations
pub mod rate_limit;

/// Static feature catalog with dependency and conflict rules
pub mod registry;

/// Pure effective-state resolution and combination validation
pub mod resolver;

/// In-memory session store and backend sync
pub mod store;
