// ABOUTME: Bearer-token provider abstraction for backend calls
// ABOUTME: Tokens are opaque strings owned by the host application session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Session Token Access
//!
//! The engine never mints or validates tokens; the host application owns the
//! session and hands the engine whatever bearer token its persisted session
//! storage currently holds. Absence of a token is a normal state (logged-out
//! session): feature calls are skipped and audit posts are silently dropped.

use std::sync::RwLock;

/// Source of the bearer token attached to every backend call.
pub trait TokenProvider: Send + Sync {
    /// The current bearer token, or `None` when no session is active.
    fn bearer_token(&self) -> Option<String>;
}

/// Token provider backed by an in-memory slot the host updates on
/// login/logout/refresh.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    /// Provider holding the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Provider with no active session.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the stored token (login or refresh).
    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    /// Drop the stored token (logout).
    pub fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lifecycle() {
        let provider = StaticTokenProvider::empty();
        assert!(provider.bearer_token().is_none());

        provider.set_token("jwt-abc");
        assert_eq!(provider.bearer_token().as_deref(), Some("jwt-abc"));

        provider.clear();
        assert!(provider.bearer_token().is_none());
    }
}
