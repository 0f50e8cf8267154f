// ABOUTME: Unified error taxonomy for the entitlement engine
// ABOUTME: Separates transport-boundary failures from engine-level errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Error Handling
//!
//! Two error layers with an explicit boundary between them:
//!
//! - [`FetchError`] lives at the transport boundary ([`crate::backend`]). Read-path
//!   fetch errors never cross the store boundary: they are absorbed by the named
//!   fail-open converters in [`crate::backend`] and degrade to safe defaults.
//! - [`EntitlementError`] is what callers of the engine see. Write-path transport
//!   failures convert into [`EntitlementError::UpdateRejected`], carrying the
//!   backend-provided message when one was present.
//!
//! The fail-open read path is a deliberate availability-over-strictness choice
//! inherited from the product behavior; see the crate-level documentation.

use thiserror::Error;

/// Failures at the HTTP transport boundary.
///
/// Produced only by [`crate::backend`] implementations. Read paths convert these
/// into safe defaults via the fail-open converters; write paths convert them
/// into [`EntitlementError::UpdateRejected`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// No bearer token was available, so the call was skipped entirely.
    #[error("no bearer token available, request skipped")]
    MissingToken,

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Http {
        status: u16,
        /// Error message extracted from the backend `{ "message": ... }` body.
        message: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors surfaced to consumers of the entitlement engine.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// A feature name outside the closed catalog enumeration was used.
    ///
    /// This is a programming error (or stale persisted data from a previous
    /// deployment). Query paths never raise it: they resolve unknown names as
    /// disabled. It only surfaces from explicit catalog lookups.
    #[error("unknown feature: {name}")]
    UnknownFeature { name: String },

    /// A backend mutation was rejected or failed in transit.
    ///
    /// Always recoverable: local state is untouched and the caller decides
    /// whether to retry, surface the message, or ignore it.
    #[error("feature update rejected: {message}")]
    UpdateRejected { message: String },

    /// Engine configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] anyhow::Error),
}

impl EntitlementError {
    /// Unknown-feature error for the given wire name.
    pub fn unknown_feature(name: impl Into<String>) -> Self {
        Self::UnknownFeature { name: name.into() }
    }
}

impl From<FetchError> for EntitlementError {
    fn from(err: FetchError) -> Self {
        let message = match err {
            FetchError::Http {
                message: Some(message),
                ..
            } => message,
            FetchError::Http {
                status,
                message: None,
            } => format!("feature update failed (HTTP {status})"),
            FetchError::MissingToken => "no session token available".to_owned(),
            other => other.to_string(),
        };
        Self::UpdateRejected { message }
    }
}

/// Result alias for engine operations.
pub type EntitlementResult<T> = Result<T, EntitlementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejected_prefers_backend_message() {
        let err = EntitlementError::from(FetchError::Http {
            status: 500,
            message: Some("tenant suspended".to_owned()),
        });
        match err {
            EntitlementError::UpdateRejected { message } => {
                assert_eq!(message, "tenant suspended");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn update_rejected_falls_back_to_generic_message() {
        let err = EntitlementError::from(FetchError::Http {
            status: 503,
            message: None,
        });
        assert!(err.to_string().contains("HTTP 503"));
    }
}
