// ABOUTME: Static feature catalog for all gateable CRM capabilities
// ABOUTME: Closed key enumeration with category, dependency, conflict, and default rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Feature Registry
//!
//! The compiled-in catalog of every gateable capability in the Lumen CRM
//! platform. The catalog is a closed enumeration: feature keys are defined
//! here once, at build time, and are immutable at runtime.
//!
//! Each entry declares:
//! - the wire name used by the backend API (camelCase),
//! - an informational [`FeatureCategory`],
//! - dependency edges (features that must be enabled for this one to be
//!   meaningfully enabled),
//! - conflict edges (features that must not be simultaneously enabled),
//! - a default-enabled flag.
//!
//! Default flags are not consulted during live resolution (see
//! [`crate::resolver`]); they seed the conservative fallback set used when the
//! global toggle fetch fails.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EntitlementError;

/// A feature's enabled/disabled state per catalog key.
pub type FeatureMap = HashMap<FeatureKey, bool>;

/// Closed enumeration of every gateable capability.
///
/// Serialized with the backend's camelCase wire names (`"aiTools"`,
/// `"advancedAnalytics"`, ...). Parsing a name outside this enumeration fails;
/// callers on query paths treat that as "feature disabled" rather than an
/// error (stale persisted data from a removed deployment must not break
/// resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    // Core workspace
    Contacts,
    Deals,
    Tasks,
    Dashboard,
    Search,
    Notifications,
    // Advanced workflow
    Pipeline,
    Analytics,
    CustomFields,
    BulkOperations,
    EmailIntegration,
    CalendarSync,
    LegacyReports,
    // Premium
    AiTools,
    AdvancedAnalytics,
    WorkflowAutomation,
    VideoCalls,
    // Enterprise
    ApiAccess,
    Sso,
    AuditTrail,
}

impl FeatureKey {
    /// Every catalog key, in catalog order.
    pub const ALL: [Self; 20] = [
        Self::Contacts,
        Self::Deals,
        Self::Tasks,
        Self::Dashboard,
        Self::Search,
        Self::Notifications,
        Self::Pipeline,
        Self::Analytics,
        Self::CustomFields,
        Self::BulkOperations,
        Self::EmailIntegration,
        Self::CalendarSync,
        Self::LegacyReports,
        Self::AiTools,
        Self::AdvancedAnalytics,
        Self::WorkflowAutomation,
        Self::VideoCalls,
        Self::ApiAccess,
        Self::Sso,
        Self::AuditTrail,
    ];

    /// The backend wire name for this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Deals => "deals",
            Self::Tasks => "tasks",
            Self::Dashboard => "dashboard",
            Self::Search => "search",
            Self::Notifications => "notifications",
            Self::Pipeline => "pipeline",
            Self::Analytics => "analytics",
            Self::CustomFields => "customFields",
            Self::BulkOperations => "bulkOperations",
            Self::EmailIntegration => "emailIntegration",
            Self::CalendarSync => "calendarSync",
            Self::LegacyReports => "legacyReports",
            Self::AiTools => "aiTools",
            Self::AdvancedAnalytics => "advancedAnalytics",
            Self::WorkflowAutomation => "workflowAutomation",
            Self::VideoCalls => "videoCalls",
            Self::ApiAccess => "apiAccess",
            Self::Sso => "sso",
            Self::AuditTrail => "auditTrail",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKey {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| EntitlementError::unknown_feature(s))
    }
}

/// Informational grouping of catalog entries. Carries no gating semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Core,
    Advanced,
    Premium,
    Enterprise,
}

/// One catalog entry. Defined once at build time, immutable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDefinition {
    pub key: FeatureKey,
    pub category: FeatureCategory,
    /// Features that must be enabled for this one to be meaningfully enabled.
    pub dependencies: &'static [FeatureKey],
    /// Features that must not be simultaneously enabled.
    pub conflicts: &'static [FeatureKey],
    /// Default when no override exists. Seed-only; not consulted at query time.
    pub default_enabled: bool,
}

/// The full catalog, in [`FeatureKey::ALL`] order.
pub static FEATURE_DEFINITIONS: [FeatureDefinition; 20] = [
    FeatureDefinition {
        key: FeatureKey::Contacts,
        category: FeatureCategory::Core,
        dependencies: &[],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Deals,
        category: FeatureCategory::Core,
        dependencies: &[FeatureKey::Contacts],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Tasks,
        category: FeatureCategory::Core,
        dependencies: &[],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Dashboard,
        category: FeatureCategory::Core,
        dependencies: &[],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Search,
        category: FeatureCategory::Core,
        dependencies: &[],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Notifications,
        category: FeatureCategory::Core,
        dependencies: &[],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Pipeline,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Deals],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::Analytics,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Dashboard],
        conflicts: &[],
        default_enabled: true,
    },
    FeatureDefinition {
        key: FeatureKey::CustomFields,
        category: FeatureCategory::Advanced,
        dependencies: &[],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::BulkOperations,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Contacts],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::EmailIntegration,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Contacts],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::CalendarSync,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Tasks],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::LegacyReports,
        category: FeatureCategory::Advanced,
        dependencies: &[FeatureKey::Dashboard],
        conflicts: &[FeatureKey::AdvancedAnalytics],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::AiTools,
        category: FeatureCategory::Premium,
        dependencies: &[FeatureKey::Contacts],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::AdvancedAnalytics,
        category: FeatureCategory::Premium,
        dependencies: &[FeatureKey::Analytics],
        conflicts: &[FeatureKey::LegacyReports],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::WorkflowAutomation,
        category: FeatureCategory::Premium,
        dependencies: &[FeatureKey::Tasks],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::VideoCalls,
        category: FeatureCategory::Premium,
        dependencies: &[FeatureKey::Contacts],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::ApiAccess,
        category: FeatureCategory::Enterprise,
        dependencies: &[],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::Sso,
        category: FeatureCategory::Enterprise,
        dependencies: &[],
        conflicts: &[],
        default_enabled: false,
    },
    FeatureDefinition {
        key: FeatureKey::AuditTrail,
        category: FeatureCategory::Enterprise,
        dependencies: &[],
        conflicts: &[],
        default_enabled: false,
    },
];

/// Catalog entry for a key. Total over the closed enumeration.
#[must_use]
pub fn definition(key: FeatureKey) -> &'static FeatureDefinition {
    // Table order matches FeatureKey::ALL order (verified by catalog tests).
    &FEATURE_DEFINITIONS[key as usize]
}

/// Catalog entry looked up by wire name.
///
/// # Errors
///
/// Returns [`EntitlementError::UnknownFeature`] when the name is outside the
/// closed enumeration.
pub fn definition_by_name(name: &str) -> Result<&'static FeatureDefinition, EntitlementError> {
    let key = FeatureKey::from_str(name)?;
    Ok(definition(key))
}

/// Dependency edges for a key. Empty slice when none declared.
#[must_use]
pub fn dependencies(key: FeatureKey) -> &'static [FeatureKey] {
    definition(key).dependencies
}

/// Conflict edges for a key. Empty slice when none declared.
#[must_use]
pub fn conflicts(key: FeatureKey) -> &'static [FeatureKey] {
    definition(key).conflicts
}

/// Default-enabled flag for a key.
#[must_use]
pub fn default_enabled(key: FeatureKey) -> bool {
    definition(key).default_enabled
}

/// All catalog entries in the given category, in catalog order.
#[must_use]
pub fn list_by_category(category: FeatureCategory) -> Vec<&'static FeatureDefinition> {
    FEATURE_DEFINITIONS
        .iter()
        .filter(|def| def.category == category)
        .collect()
}

/// Conservative fallback set used when the global toggle fetch fails: the
/// core-category features that default to enabled. Gates broad platform
/// behavior, so an outage degrades to the baseline workspace instead of an
/// empty one.
#[must_use]
pub fn conservative_global_defaults() -> FeatureMap {
    FEATURE_DEFINITIONS
        .iter()
        .filter(|def| def.category == FeatureCategory::Core && def.default_enabled)
        .map(|def| (def.key, true))
        .collect()
}
