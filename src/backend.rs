// ABOUTME: HTTP transport boundary for feature reads, writes, and analytics
// ABOUTME: FeatureBackend trait, reqwest implementation, and the named fail-open policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Feature Backend
//!
//! Everything that touches the network lives behind [`FeatureBackend`], so the
//! store and the tests construct isolated instances with whatever transport
//! they need. [`HttpFeatureBackend`] is the production implementation against
//! the platform REST API:
//!
//! - `GET  /api/features/global`
//! - `PATCH /api/features/global/{feature}`
//! - `GET  /api/features/users/{userId}`
//! - `PATCH /api/features/users/{userId}/{feature}`
//! - `PATCH /api/features/users/{userId}/bulk`
//! - `GET  /api/features/analytics`
//!
//! Every call carries the session bearer token; with no token the call is
//! skipped and reported as [`FetchError::MissingToken`].
//!
//! ## Fail-open read policy
//!
//! Read failures degrade instead of propagating: [`fail_open_user`] turns any
//! fetch error into an empty override map (entitlements fall through to the
//! global toggles) and [`fail_open_global`] into the registry's conservative
//! baseline. This favors keeping the product usable over strict entitlement
//! enforcement; the converters are named, logged, and applied in exactly one
//! place ([`crate::store`]) so a stricter deployment can swap them for
//! fail-closed handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::config::EngineConfig;
use crate::errors::FetchError;
use crate::registry::{FeatureKey, FeatureMap};

/// Platform-wide feature adoption numbers from the analytics endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnalytics {
    pub total_users: u64,
    /// Users with each feature effectively enabled.
    pub feature_usage: HashMap<FeatureKey, u64>,
    /// Current global toggle state as the backend sees it.
    pub global_features: FeatureMap,
}

/// Transport interface for feature state and analytics.
#[async_trait]
pub trait FeatureBackend: Send + Sync {
    /// Per-user overrides for one user.
    async fn fetch_user_features(&self, user_id: Uuid) -> Result<FeatureMap, FetchError>;

    /// Platform-wide toggles.
    async fn fetch_global_features(&self) -> Result<FeatureMap, FetchError>;

    /// Write one per-user override.
    async fn push_user_feature(
        &self,
        user_id: Uuid,
        key: FeatureKey,
        enabled: bool,
    ) -> Result<(), FetchError>;

    /// Write one global toggle.
    async fn push_global_feature(&self, key: FeatureKey, enabled: bool) -> Result<(), FetchError>;

    /// Write a batch of per-user overrides, all-or-nothing at the backend.
    async fn push_user_features_bulk(
        &self,
        user_id: Uuid,
        features: &FeatureMap,
    ) -> Result<(), FetchError>;

    /// Adoption analytics for the admin console.
    async fn fetch_analytics(&self) -> Result<FeatureAnalytics, FetchError>;
}

/// Convert a failed user-override fetch into an empty map.
///
/// The session then resolves entirely from the global toggles. Logged so the
/// silent UI degrade still leaves a trace for operators.
#[must_use]
pub fn fail_open_user(result: Result<FeatureMap, FetchError>) -> FeatureMap {
    match result {
        Ok(map) => map,
        Err(err) => {
            warn!(error = %err, "user feature fetch failed, degrading to global toggles");
            FeatureMap::new()
        }
    }
}

/// Convert a failed global-toggle fetch into the conservative baseline.
///
/// Global toggles gate broad platform behavior, so an outage falls back to the
/// registry's core default set instead of an empty map.
#[must_use]
pub fn fail_open_global(result: Result<FeatureMap, FetchError>) -> FeatureMap {
    match result {
        Ok(map) => map,
        Err(err) => {
            warn!(error = %err, "global feature fetch failed, using conservative defaults");
            crate::registry::conservative_global_defaults()
        }
    }
}

/// Drop wire entries whose names are outside the catalog.
///
/// A backend ahead of (or behind) this build may persist keys this deployment
/// no longer knows; those entries must not poison the whole decode.
fn retain_known_features(raw: HashMap<String, bool>) -> FeatureMap {
    let mut map = FeatureMap::with_capacity(raw.len());
    for (name, enabled) in raw {
        match name.parse::<FeatureKey>() {
            Ok(key) => {
                map.insert(key, enabled);
            }
            Err(_) => {
                debug!(feature = %name, "ignoring unknown feature key from backend");
            }
        }
    }
    map
}

/// Error body shape the backend uses for non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Reqwest-based [`FeatureBackend`] against the platform REST API.
pub struct HttpFeatureBackend {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpFeatureBackend {
    /// Backend with a client built from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, &config.api_base_url, tokens)
    }

    /// Backend reusing an existing pooled client.
    #[must_use]
    pub fn with_client(client: Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
        }
    }

    fn bearer_token(&self) -> Result<String, FetchError> {
        self.tokens.bearer_token().ok_or(FetchError::MissingToken)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into `FetchError::Http`, keeping the
    /// backend's `{ "message": ... }` when the body carries one.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        Err(FetchError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_feature_map(&self, path: &str) -> Result<FeatureMap, FetchError> {
        let token = self.bearer_token()?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let raw: HashMap<String, bool> = response.json().await?;
        Ok(retain_known_features(raw))
    }

    async fn patch_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), FetchError> {
        let token = self.bearer_token()?;
        let response = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// PATCH body for single-feature updates.
#[derive(Debug, Serialize)]
struct EnabledBody {
    enabled: bool,
}

/// PATCH body for bulk updates.
#[derive(Debug, Serialize)]
struct BulkBody<'a> {
    features: &'a FeatureMap,
}

/// Wire shape of the analytics endpoint before lenient key filtering.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsWire {
    total_users: u64,
    #[serde(default)]
    feature_usage: HashMap<String, u64>,
    #[serde(default)]
    global_features: HashMap<String, bool>,
}

#[async_trait]
impl FeatureBackend for HttpFeatureBackend {
    async fn fetch_user_features(&self, user_id: Uuid) -> Result<FeatureMap, FetchError> {
        self.get_feature_map(&format!("/api/features/users/{user_id}"))
            .await
    }

    async fn fetch_global_features(&self) -> Result<FeatureMap, FetchError> {
        self.get_feature_map("/api/features/global").await
    }

    async fn push_user_feature(
        &self,
        user_id: Uuid,
        key: FeatureKey,
        enabled: bool,
    ) -> Result<(), FetchError> {
        self.patch_json(
            &format!("/api/features/users/{user_id}/{key}"),
            &EnabledBody { enabled },
        )
        .await
    }

    async fn push_global_feature(&self, key: FeatureKey, enabled: bool) -> Result<(), FetchError> {
        self.patch_json(&format!("/api/features/global/{key}"), &EnabledBody { enabled })
            .await
    }

    async fn push_user_features_bulk(
        &self,
        user_id: Uuid,
        features: &FeatureMap,
    ) -> Result<(), FetchError> {
        self.patch_json(
            &format!("/api/features/users/{user_id}/bulk"),
            &BulkBody { features },
        )
        .await
    }

    async fn fetch_analytics(&self) -> Result<FeatureAnalytics, FetchError> {
        let token = self.bearer_token()?;
        let response = self
            .client
            .get(self.url("/api/features/analytics"))
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let wire: AnalyticsWire = response.json().await?;

        let mut feature_usage = HashMap::with_capacity(wire.feature_usage.len());
        for (name, count) in wire.feature_usage {
            match name.parse::<FeatureKey>() {
                Ok(key) => {
                    feature_usage.insert(key, count);
                }
                Err(_) => {
                    debug!(feature = %name, "ignoring unknown feature key in analytics");
                }
            }
        }

        Ok(FeatureAnalytics {
            total_users: wire.total_users,
            feature_usage,
            global_features: retain_known_features(wire.global_features),
        })
    }
}
