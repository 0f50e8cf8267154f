// ABOUTME: Best-effort audit trail emission for entitlement mutations
// ABOUTME: Fire-and-forget sink whose failures never reach the primary operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Audit Sink
//!
//! Every entitlement mutation emits an audit record describing the action,
//! the touched resource, and the before/after values. Emission is a one-way
//! notification: [`AuditSink::record`] returns nothing, never blocks the
//! mutation, and guarantees its own failures do not propagate.
//!
//! The HTTP sink posts records to the platform audit endpoint on a spawned
//! task; a missing session token drops the record silently, and transport
//! failures are logged at debug level and swallowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::TokenProvider;

/// One audit-trail entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Action name, e.g. `"update_user_feature"`.
    pub action: String,
    /// Resource type, e.g. `"user_feature"` or `"global_feature"`.
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Structured context, typically before/after values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    /// The acting user, when a session is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl AuditRecord {
    /// Record for the given action/resource pair, stamped now.
    #[must_use]
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            resource_id: None,
            details: None,
            timestamp: Utc::now(),
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub const fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Best-effort notification interface for audit records.
///
/// Implementations must not block the caller and must swallow their own
/// failures; the primary mutation has already happened by the time a record
/// is emitted.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Sink that discards every record. Useful for embedding contexts without an
/// audit endpoint and for tests that don't assert on auditing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: AuditRecord) {}
}

/// Sink posting records to `POST /api/audit/log`, fire-and-forget.
///
/// `record` spawns the send on the ambient Tokio runtime, so it must be called
/// from within one (the store's async mutation paths always are).
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpAuditSink {
    /// Sink targeting `{base_url}/api/audit/log`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/audit/log", base_url.trim_end_matches('/')),
            tokens,
        }
    }
}

impl AuditSink for HttpAuditSink {
    fn record(&self, record: AuditRecord) {
        // No token means no session to attribute the record to; drop it.
        let Some(token) = self.tokens.bearer_token() else {
            debug!(action = %record.action, "audit record dropped: no session token");
            return;
        };

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&record);

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "audit log write rejected");
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(error = %err, "audit log write failed");
                }
            }
        });
    }
}
