// ABOUTME: Client-side rolling-window limiter for administrative mutations
// ABOUTME: Advisory throttle that short-circuits locally before the backend is contacted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Admin Rate Limiter
//!
//! Administrative mutation entry points (invite user, approve tenant,
//! suspend/delete tenant, role and status updates) run through this limiter
//! before any request leaves the client. Exceeding the budget short-circuits
//! the operation locally and invokes the caller-supplied rejection callback;
//! the backend is never contacted for a rejected call.
//!
//! This is advisory, UX-level throttling. It does not replace server-side
//! rate limiting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling-window request limiter.
///
/// Admits at most `max_requests` acquisitions per `window`, measured from each
/// admitted call's timestamp. Shareable across tasks; the interior lock is
/// held only to prune and record.
#[derive(Debug)]
pub struct AdminRateLimiter {
    admitted: Mutex<Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl AdminRateLimiter {
    /// Limiter admitting `max_requests` per rolling `window`.
    #[must_use]
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            admitted: Mutex::new(Vec::new()),
            max_requests,
            window,
        }
    }

    /// Try to admit one operation, recording it when admitted.
    ///
    /// Expired entries are pruned first, so the window rolls rather than
    /// resetting in fixed buckets.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let Ok(mut admitted) = self.admitted.lock() else {
            // Poisoned lock: a panic mid-prune. Advisory limiter, so admit.
            return true;
        };
        admitted.retain(|&t| now.duration_since(t) < self.window);
        if admitted.len() < self.max_requests as usize {
            admitted.push(now);
            true
        } else {
            false
        }
    }

    /// Run `op` if the window has budget; otherwise invoke `on_rate_limited`
    /// exactly once and return `None` without running `op`.
    pub fn guard<T>(&self, op: impl FnOnce() -> T, on_rate_limited: impl FnOnce()) -> Option<T> {
        if self.try_acquire() {
            Some(op())
        } else {
            on_rate_limited();
            None
        }
    }

    /// Remaining budget in the current window.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        let now = Instant::now();
        let Ok(mut admitted) = self.admitted.lock() else {
            return self.max_requests;
        };
        admitted.retain(|&t| now.duration_since(t) < self.window);
        let used = u32::try_from(admitted.len()).unwrap_or(u32::MAX);
        self.max_requests.saturating_sub(used)
    }
}
