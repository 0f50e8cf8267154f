// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Scripted mock backend, recording audit sink, and quiet logging setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM
#![allow(dead_code, clippy::missing_panics_doc, clippy::must_use_candidate)]

//! Shared test utilities for `lumen_entitlements`
//!
//! Provides a scripted [`MockBackend`] so store tests run against controlled
//! transport outcomes without a live server, plus a recording audit sink for
//! asserting on emitted records.

use std::collections::HashMap;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use uuid::Uuid;

use lumen_entitlements::audit::{AuditRecord, AuditSink};
use lumen_entitlements::backend::{FeatureAnalytics, FeatureBackend};
use lumen_entitlements::errors::FetchError;
use lumen_entitlements::registry::{FeatureKey, FeatureMap};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A write observed by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushedWrite {
    User {
        user_id: Uuid,
        key: FeatureKey,
        enabled: bool,
    },
    Global {
        key: FeatureKey,
        enabled: bool,
    },
    Bulk {
        user_id: Uuid,
        count: usize,
    },
}

/// Failure the mock should produce, stored as data because [`FetchError`]
/// is not `Clone`.
#[derive(Debug, Clone)]
enum ScriptedFailure {
    Network(String),
    Http { status: u16, message: Option<String> },
}

impl ScriptedFailure {
    fn to_error(&self) -> FetchError {
        match self {
            Self::Network(message) => FetchError::Network(message.clone()),
            Self::Http { status, message } => FetchError::Http {
                status: *status,
                message: message.clone(),
            },
        }
    }
}

/// Scripted in-memory [`FeatureBackend`] for store tests.
#[derive(Default)]
pub struct MockBackend {
    user_features: Mutex<HashMap<Uuid, FeatureMap>>,
    global_features: Mutex<FeatureMap>,
    read_failure: Mutex<Option<ScriptedFailure>>,
    write_failure: Mutex<Option<ScriptedFailure>>,
    writes: Mutex<Vec<PushedWrite>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the global toggle layer.
    pub fn with_global(self, map: FeatureMap) -> Self {
        *self.global_features.lock().unwrap() = map;
        self
    }

    /// Seed one user's override layer.
    pub fn with_user(self, user_id: Uuid, map: FeatureMap) -> Self {
        self.user_features.lock().unwrap().insert(user_id, map);
        self
    }

    /// Make every read fail with a simulated network error.
    pub fn fail_reads_with_network_error(&self) {
        *self.read_failure.lock().unwrap() =
            Some(ScriptedFailure::Network("simulated connection reset".to_owned()));
    }

    /// Make every write fail with the given HTTP status and optional message.
    pub fn reject_writes(&self, status: u16, message: Option<&str>) {
        *self.write_failure.lock().unwrap() = Some(ScriptedFailure::Http {
            status,
            message: message.map(str::to_owned),
        });
    }

    /// Every write the backend accepted, in order.
    pub fn writes(&self) -> Vec<PushedWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn read_guard(&self) -> Result<(), FetchError> {
        match self.read_failure.lock().unwrap().as_ref() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn write_guard(&self) -> Result<(), FetchError> {
        match self.write_failure.lock().unwrap().as_ref() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeatureBackend for MockBackend {
    async fn fetch_user_features(&self, user_id: Uuid) -> Result<FeatureMap, FetchError> {
        self.read_guard()?;
        Ok(self
            .user_features
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_global_features(&self) -> Result<FeatureMap, FetchError> {
        self.read_guard()?;
        Ok(self.global_features.lock().unwrap().clone())
    }

    async fn push_user_feature(
        &self,
        user_id: Uuid,
        key: FeatureKey,
        enabled: bool,
    ) -> Result<(), FetchError> {
        self.write_guard()?;
        self.user_features
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .insert(key, enabled);
        self.writes.lock().unwrap().push(PushedWrite::User {
            user_id,
            key,
            enabled,
        });
        Ok(())
    }

    async fn push_global_feature(&self, key: FeatureKey, enabled: bool) -> Result<(), FetchError> {
        self.write_guard()?;
        self.global_features.lock().unwrap().insert(key, enabled);
        self.writes
            .lock()
            .unwrap()
            .push(PushedWrite::Global { key, enabled });
        Ok(())
    }

    async fn push_user_features_bulk(
        &self,
        user_id: Uuid,
        features: &FeatureMap,
    ) -> Result<(), FetchError> {
        self.write_guard()?;
        self.user_features
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .extend(features.iter());
        self.writes.lock().unwrap().push(PushedWrite::Bulk {
            user_id,
            count: features.len(),
        });
        Ok(())
    }

    async fn fetch_analytics(&self) -> Result<FeatureAnalytics, FetchError> {
        self.read_guard()?;
        Ok(FeatureAnalytics {
            total_users: self.user_features.lock().unwrap().len() as u64,
            feature_usage: HashMap::new(),
            global_features: self.global_features.lock().unwrap().clone(),
        })
    }
}

/// Audit sink that records everything for assertions.
#[derive(Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}
