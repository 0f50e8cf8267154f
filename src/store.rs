// ABOUTME: In-memory session store for resolved entitlement state
// ABOUTME: Mediates backend writes, applies local state only after acknowledgement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Feature Store & Sync
//!
//! [`FeatureStore`] holds the two entitlement layers (per-user overrides and
//! platform-wide toggles) for the active session and mediates every backend
//! write. It is an explicit, dependency-injected container: construct one per
//! session with the backend and audit sink it should use, and tests build
//! isolated instances with mock transports.
//!
//! Read path: refreshes fetch through [`crate::backend::FeatureBackend`] and
//! absorb failures via the named fail-open converters; a failed read never
//! surfaces past this boundary. Queries resolve from the current snapshot on
//! every call, never cached beyond it.
//!
//! Write path: each mutation runs `idle -> pending -> {applied, failed}`. The
//! new value is written into local state only after the backend acknowledges,
//! so a failure leaves the session exactly as it was (no optimistic
//! rollback). Errors propagate as [`EntitlementError::UpdateRejected`] for the
//! caller to surface.
//!
//! Concurrent mutations to the same (scope, key) are not sequenced: the
//! backend sees last-writer-wins and the session applies whichever response
//! lands last. This matches the platform's documented behavior; callers that
//! need ordering must serialize their own calls.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditSink};
use crate::backend::{fail_open_global, fail_open_user, FeatureAnalytics, FeatureBackend};
use crate::errors::{EntitlementResult, FetchError};
use crate::registry::{FeatureKey, FeatureMap};
use crate::resolver::{self, ValidationReport};

/// The two entitlement layers for the active session.
#[derive(Debug, Default)]
struct SessionState {
    user_overrides: FeatureMap,
    global_toggles: FeatureMap,
}

/// Session container for resolved entitlement state.
pub struct FeatureStore {
    backend: Arc<dyn FeatureBackend>,
    audit: Arc<dyn AuditSink>,
    state: RwLock<SessionState>,
    /// Acting user recorded on audit entries, when a session is attached.
    session_user: Option<Uuid>,
}

impl FeatureStore {
    /// Store with empty entitlement layers.
    #[must_use]
    pub fn new(backend: Arc<dyn FeatureBackend>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            backend,
            audit,
            state: RwLock::new(SessionState::default()),
            session_user: None,
        }
    }

    /// Attribute audit records emitted by this store to the given user.
    #[must_use]
    pub const fn with_session_user(mut self, user_id: Uuid) -> Self {
        self.session_user = Some(user_id);
        self
    }

    // ── Read path ───────────────────────────────────────────────────────

    /// Fetch and replace the per-user override layer.
    ///
    /// Fetch failures degrade to an empty layer (resolution falls through to
    /// the global toggles); this method never fails.
    #[instrument(skip(self))]
    pub async fn refresh_user_features(&self, user_id: Uuid) {
        let fetched = fail_open_user(self.backend.fetch_user_features(user_id).await);
        let mut state = self.state.write().await;
        state.user_overrides = fetched;
    }

    /// Fetch and replace the global toggle layer.
    ///
    /// Fetch failures degrade to the registry's conservative baseline; this
    /// method never fails.
    #[instrument(skip(self))]
    pub async fn refresh_global_features(&self) {
        let fetched = fail_open_global(self.backend.fetch_global_features().await);
        let mut state = self.state.write().await;
        state.global_toggles = fetched;
    }

    /// Effective state for one key, resolved from the current snapshot.
    pub async fn is_enabled(&self, key: FeatureKey) -> bool {
        let state = self.state.read().await;
        resolver::effective(&state.user_overrides, &state.global_toggles, key)
    }

    /// Effective state looked up by wire name; unknown names are disabled.
    pub async fn is_enabled_by_name(&self, name: &str) -> bool {
        let state = self.state.read().await;
        resolver::effective_by_name(&state.user_overrides, &state.global_toggles, name)
    }

    /// Effective state for every catalog key.
    pub async fn effective_features(&self) -> FeatureMap {
        let state = self.state.read().await;
        resolver::effective_map(&state.user_overrides, &state.global_toggles)
    }

    /// Validate the current effective state against the catalog rules.
    ///
    /// Reports only; nothing is auto-disabled. Enforcement is the caller's
    /// policy choice.
    pub async fn validate(&self) -> ValidationReport {
        resolver::validate_combination(&self.effective_features().await)
    }

    /// Current snapshot of the per-user override layer.
    pub async fn user_overrides(&self) -> FeatureMap {
        self.state.read().await.user_overrides.clone()
    }

    /// Current snapshot of the global toggle layer.
    pub async fn global_toggles(&self) -> FeatureMap {
        self.state.read().await.global_toggles.clone()
    }

    // ── Write path ──────────────────────────────────────────────────────

    /// Set one per-user override.
    ///
    /// Local state changes only after the backend acknowledges. Concurrent
    /// calls for the same key race last-response-wins. The acknowledged value
    /// lands in this session's override layer; an admin session editing a
    /// different user should refresh before relying on its own layer.
    ///
    /// # Errors
    ///
    /// [`crate::errors::EntitlementError::UpdateRejected`] with the backend's
    /// message when the write fails; local state is left untouched.
    #[instrument(skip(self))]
    pub async fn update_user_feature(
        &self,
        user_id: Uuid,
        key: FeatureKey,
        enabled: bool,
    ) -> EntitlementResult<()> {
        self.backend
            .push_user_feature(user_id, key, enabled)
            .await?;

        let before = {
            let mut state = self.state.write().await;
            state.user_overrides.insert(key, enabled)
        };
        debug!(%user_id, %key, enabled, "user feature override applied");

        self.emit_audit(
            "update_user_feature",
            "user_feature",
            format!("{user_id}/{key}"),
            before,
            enabled,
        );
        Ok(())
    }

    /// Set one global toggle.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::update_user_feature`], global scope.
    #[instrument(skip(self))]
    pub async fn update_global_feature(
        &self,
        key: FeatureKey,
        enabled: bool,
    ) -> EntitlementResult<()> {
        self.backend.push_global_feature(key, enabled).await?;

        let before = {
            let mut state = self.state.write().await;
            state.global_toggles.insert(key, enabled)
        };
        debug!(%key, enabled, "global feature toggle applied");

        self.emit_audit(
            "update_global_feature",
            "global_feature",
            key.to_string(),
            before,
            enabled,
        );
        Ok(())
    }

    /// Set a batch of per-user overrides, all-or-nothing at the backend.
    ///
    /// Not atomic with respect to concurrent single-key updates for the same
    /// user: a racing `update_user_feature` may interleave.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::update_user_feature`]; on failure none of the
    /// batch is applied locally.
    #[instrument(skip(self, features))]
    pub async fn bulk_update_user_features(
        &self,
        user_id: Uuid,
        features: FeatureMap,
    ) -> EntitlementResult<()> {
        self.backend
            .push_user_features_bulk(user_id, &features)
            .await?;

        let before = {
            let mut state = self.state.write().await;
            let before = state.user_overrides.clone();
            state.user_overrides.extend(features.iter());
            before
        };
        debug!(%user_id, count = features.len(), "bulk user feature update applied");

        let record = AuditRecord::new("bulk_update_user_features", "user_feature")
            .with_resource_id(user_id.to_string())
            .with_details(json!({
                "before": feature_map_json(&before),
                "after": feature_map_json(&features),
            }));
        self.audit.record(self.attribute(record));
        Ok(())
    }

    /// Adoption analytics for the admin console.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; analytics reads have no fail-open
    /// default, the admin surface shows the error instead.
    pub async fn analytics(&self) -> Result<FeatureAnalytics, FetchError> {
        self.backend.fetch_analytics().await
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn emit_audit(
        &self,
        action: &str,
        resource: &str,
        resource_id: String,
        before: Option<bool>,
        after: bool,
    ) {
        let record = AuditRecord::new(action, resource)
            .with_resource_id(resource_id)
            .with_details(json!({ "before": before, "after": after }));
        self.audit.record(self.attribute(record));
    }

    fn attribute(&self, record: AuditRecord) -> AuditRecord {
        match self.session_user {
            Some(user_id) => record.with_user_id(user_id),
            None => record,
        }
    }
}

/// Serialize a feature map with wire names as keys, for audit details.
fn feature_map_json(map: &FeatureMap) -> serde_json::Value {
    let mut object = serde_json::Map::with_capacity(map.len());
    for key in FeatureKey::ALL {
        if let Some(&enabled) = map.get(&key) {
            object.insert(key.as_str().to_owned(), serde_json::Value::Bool(enabled));
        }
    }
    serde_json::Value::Object(object)
}
