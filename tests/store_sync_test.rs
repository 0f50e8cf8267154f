// ABOUTME: Store and sync tests against a scripted mock backend
// ABOUTME: Fail-open reads, apply-after-ack writes, audit emission, token skipping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! Session store behavior against controlled transport outcomes.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use common::{init_test_logging, MockBackend, PushedWrite, RecordingAuditSink};
use lumen_entitlements::audit::NoopAuditSink;
use lumen_entitlements::auth::StaticTokenProvider;
use lumen_entitlements::backend::{FeatureBackend, HttpFeatureBackend};
use lumen_entitlements::errors::{EntitlementError, FetchError};
use lumen_entitlements::registry::{self, FeatureKey, FeatureMap};
use lumen_entitlements::store::FeatureStore;

fn store_with(backend: Arc<MockBackend>) -> FeatureStore {
    FeatureStore::new(backend, Arc::new(NoopAuditSink))
}

#[tokio::test]
async fn refresh_pulls_both_layers_from_backend() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let backend = Arc::new(
        MockBackend::new()
            .with_global(FeatureMap::from([(FeatureKey::Pipeline, true)]))
            .with_user(user_id, FeatureMap::from([(FeatureKey::AiTools, true)])),
    );
    let store = store_with(backend);

    store.refresh_global_features().await;
    store.refresh_user_features(user_id).await;

    assert!(store.is_enabled(FeatureKey::Pipeline).await);
    assert!(store.is_enabled(FeatureKey::AiTools).await);
    assert!(!store.is_enabled(FeatureKey::Sso).await);
}

#[tokio::test]
async fn user_read_failure_degrades_to_global_toggles() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let backend = Arc::new(
        MockBackend::new()
            .with_global(FeatureMap::from([(FeatureKey::VideoCalls, true)]))
            .with_user(user_id, FeatureMap::from([(FeatureKey::VideoCalls, false)])),
    );
    let store = store_with(backend.clone());
    store.refresh_global_features().await;

    backend.fail_reads_with_network_error();
    store.refresh_user_features(user_id).await;

    // Override layer is empty, so the global toggle shows through.
    assert!(store.user_overrides().await.is_empty());
    assert!(store.is_enabled(FeatureKey::VideoCalls).await);
}

#[tokio::test]
async fn global_read_failure_degrades_to_conservative_baseline() {
    init_test_logging();
    let backend = Arc::new(MockBackend::new());
    backend.fail_reads_with_network_error();
    let store = store_with(backend);

    store.refresh_global_features().await;

    assert_eq!(
        store.global_toggles().await,
        registry::conservative_global_defaults()
    );
    assert!(store.is_enabled(FeatureKey::Contacts).await);
    assert!(!store.is_enabled(FeatureKey::AiTools).await);
}

#[tokio::test]
async fn update_applies_locally_only_after_ack() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let backend = Arc::new(MockBackend::new());
    let store = store_with(backend.clone());

    store
        .update_user_feature(user_id, FeatureKey::AiTools, true)
        .await
        .expect("update should succeed");

    assert!(store.is_enabled(FeatureKey::AiTools).await);
    assert_eq!(
        backend.writes(),
        vec![PushedWrite::User {
            user_id,
            key: FeatureKey::AiTools,
            enabled: true,
        }]
    );
}

#[tokio::test]
async fn rejected_update_leaves_state_unchanged_and_carries_message() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let backend = Arc::new(
        MockBackend::new().with_global(FeatureMap::from([(FeatureKey::AiTools, false)])),
    );
    let store = store_with(backend.clone());
    store.refresh_global_features().await;
    assert!(!store.is_enabled(FeatureKey::AiTools).await);

    backend.reject_writes(500, Some("tenant is suspended"));
    let err = store
        .update_user_feature(user_id, FeatureKey::AiTools, true)
        .await
        .expect_err("update should be rejected");

    match err {
        EntitlementError::UpdateRejected { message } => {
            assert_eq!(message, "tenant is suspended");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Previously-resolved answer is untouched.
    assert!(!store.is_enabled(FeatureKey::AiTools).await);
    assert!(store.user_overrides().await.is_empty());
}

#[tokio::test]
async fn rejected_update_without_body_message_gets_generic_one() {
    init_test_logging();
    let backend = Arc::new(MockBackend::new());
    backend.reject_writes(503, None);
    let store = store_with(backend);

    let err = store
        .update_global_feature(FeatureKey::Pipeline, false)
        .await
        .expect_err("update should be rejected");
    assert!(err.to_string().contains("HTTP 503"));
}

#[tokio::test]
async fn bulk_update_is_all_or_nothing_locally() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let batch = FeatureMap::from([
        (FeatureKey::AiTools, true),
        (FeatureKey::WorkflowAutomation, true),
    ]);

    let backend = Arc::new(MockBackend::new());
    backend.reject_writes(422, Some("invalid combination"));
    let store = store_with(backend.clone());

    let err = store
        .bulk_update_user_features(user_id, batch.clone())
        .await
        .expect_err("bulk update should be rejected");
    assert!(matches!(err, EntitlementError::UpdateRejected { .. }));
    assert!(store.user_overrides().await.is_empty());

    // Same batch succeeds once the backend accepts writes again.
    let backend = Arc::new(MockBackend::new());
    let store = store_with(backend.clone());
    store
        .bulk_update_user_features(user_id, batch)
        .await
        .expect("bulk update should succeed");
    assert!(store.is_enabled(FeatureKey::AiTools).await);
    assert!(store.is_enabled(FeatureKey::WorkflowAutomation).await);
    assert_eq!(
        backend.writes(),
        vec![PushedWrite::Bulk { user_id, count: 2 }]
    );
}

#[tokio::test]
async fn mutations_emit_attributed_audit_records() {
    init_test_logging();
    let admin = Uuid::new_v4();
    let target = Uuid::new_v4();
    let audit = Arc::new(RecordingAuditSink::new());
    let store = FeatureStore::new(Arc::new(MockBackend::new()), audit.clone())
        .with_session_user(admin);

    store
        .update_user_feature(target, FeatureKey::CustomFields, true)
        .await
        .expect("update should succeed");

    let records = audit.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.action, "update_user_feature");
    assert_eq!(record.resource, "user_feature");
    assert_eq!(
        record.resource_id.as_deref(),
        Some(format!("{target}/customFields").as_str())
    );
    assert_eq!(record.user_id, Some(admin));
    let details = record.details.as_ref().expect("details");
    assert_eq!(details["before"], serde_json::Value::Null);
    assert_eq!(details["after"], serde_json::Value::Bool(true));
}

#[tokio::test]
async fn failed_mutation_emits_no_audit_record() {
    init_test_logging();
    let audit = Arc::new(RecordingAuditSink::new());
    let backend = Arc::new(MockBackend::new());
    backend.reject_writes(500, None);
    let store = FeatureStore::new(backend, audit.clone());

    let _ = store
        .update_global_feature(FeatureKey::Search, false)
        .await;
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn validate_reflects_current_session_state() {
    init_test_logging();
    let backend = Arc::new(MockBackend::new().with_global(FeatureMap::from([
        (FeatureKey::AdvancedAnalytics, true),
        (FeatureKey::Analytics, false),
    ])));
    let store = store_with(backend);
    store.refresh_global_features().await;

    let report = store.validate().await;
    assert!(!report.valid);
    assert!(report
        .missing_dependencies
        .iter()
        .any(|finding| finding.feature == FeatureKey::AdvancedAnalytics));
}

#[tokio::test]
async fn missing_token_skips_http_calls_entirely() {
    init_test_logging();
    // Unroutable port: if the client ever sent a request this would error
    // differently (and slowly); MissingToken proves the call was skipped.
    let backend = HttpFeatureBackend::with_client(
        reqwest::Client::new(),
        "http://127.0.0.1:1",
        Arc::new(StaticTokenProvider::empty()),
    );

    let err = backend
        .fetch_user_features(Uuid::new_v4())
        .await
        .expect_err("fetch should be skipped");
    assert!(matches!(err, FetchError::MissingToken));

    let err = backend
        .push_global_feature(FeatureKey::Pipeline, true)
        .await
        .expect_err("push should be skipped");
    assert!(matches!(err, FetchError::MissingToken));
}

#[tokio::test]
async fn analytics_passthrough_reports_backend_state() {
    init_test_logging();
    let user_id = Uuid::new_v4();
    let backend = Arc::new(
        MockBackend::new()
            .with_global(FeatureMap::from([(FeatureKey::Dashboard, true)]))
            .with_user(user_id, FeatureMap::new()),
    );
    let store = store_with(backend);

    let analytics = store.analytics().await.expect("analytics should succeed");
    assert_eq!(analytics.total_users, 1);
    assert_eq!(
        analytics.global_features.get(&FeatureKey::Dashboard),
        Some(&true)
    );
}
