// ABOUTME: Pure effective-state resolution and combination validation
// ABOUTME: Three-tier lookup (user override, global toggle, disabled) plus rule checking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Lumen CRM

//! # Feature Resolver
//!
//! Pure functions over the two entitlement layers. No I/O, no interior state:
//! everything here is computed from the maps passed in, so isolated instances
//! are trivial to construct in tests.
//!
//! Resolution precedence per key: user override, then global toggle, then
//! disabled. Registry `default_enabled` flags are deliberately not consulted
//! at query time; they only seed the conservative fallback set applied when
//! the global fetch fails (see [`crate::backend`]). A feature absent from both
//! maps is disabled, full stop.
//!
//! Validation reports invalid combinations; it never enforces. Blocking an
//! update or cascade-disabling dependents is a policy the caller layers on
//! top of the report.

use std::str::FromStr;

use serde::Serialize;

use crate::registry::{self, FeatureKey, FeatureMap};

/// Effective state for one key: `user[key]`, else `global[key]`, else `false`.
#[must_use]
pub fn effective(user: &FeatureMap, global: &FeatureMap, key: FeatureKey) -> bool {
    user.get(&key)
        .or_else(|| global.get(&key))
        .copied()
        .unwrap_or(false)
}

/// Effective state looked up by wire name. Never fails: names outside the
/// catalog resolve to disabled, which keeps stale persisted keys from a
/// previous deployment harmless.
#[must_use]
pub fn effective_by_name(user: &FeatureMap, global: &FeatureMap, name: &str) -> bool {
    match FeatureKey::from_str(name) {
        Ok(key) => effective(user, global, key),
        Err(_) => false,
    }
}

/// Effective state for every catalog key.
#[must_use]
pub fn effective_map(user: &FeatureMap, global: &FeatureMap) -> FeatureMap {
    FeatureKey::ALL
        .iter()
        .map(|&key| (key, effective(user, global, key)))
        .collect()
}

/// An enabled feature whose conflict partners are also enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictFinding {
    pub feature: FeatureKey,
    pub conflicting_with: Vec<FeatureKey>,
}

/// An enabled feature with not-enabled dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependencyFinding {
    pub feature: FeatureKey,
    pub requires: Vec<FeatureKey>,
}

/// Structured result of [`validate_combination`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub conflicts: Vec<ConflictFinding>,
    pub missing_dependencies: Vec<MissingDependencyFinding>,
}

impl ValidationReport {
    /// Report with no findings.
    #[must_use]
    pub const fn passing() -> Self {
        Self {
            valid: true,
            conflicts: Vec::new(),
            missing_dependencies: Vec::new(),
        }
    }
}

/// Check an effective-state map against the catalog's dependency and conflict
/// rules.
///
/// For every feature flagged `true`: any conflict partner also flagged `true`
/// is recorded, and any dependency not flagged `true` (or absent) is recorded
/// as missing. A feature can appear in both lists; nothing short-circuits.
/// `valid` is true iff both lists are empty.
///
/// Findings are emitted in catalog order, so the output is identical no matter
/// how the input map was built or iterated.
#[must_use]
pub fn validate_combination(state: &FeatureMap) -> ValidationReport {
    let enabled = |key: FeatureKey| state.get(&key).copied().unwrap_or(false);

    let mut conflicts = Vec::new();
    let mut missing_dependencies = Vec::new();

    for key in FeatureKey::ALL {
        if !enabled(key) {
            continue;
        }

        let conflicting_with: Vec<FeatureKey> = registry::conflicts(key)
            .iter()
            .copied()
            .filter(|&other| enabled(other))
            .collect();
        if !conflicting_with.is_empty() {
            conflicts.push(ConflictFinding {
                feature: key,
                conflicting_with,
            });
        }

        let requires: Vec<FeatureKey> = registry::dependencies(key)
            .iter()
            .copied()
            .filter(|&dep| !enabled(dep))
            .collect();
        if !requires.is_empty() {
            missing_dependencies.push(MissingDependencyFinding {
                feature: key,
                requires,
            });
        }
    }

    ValidationReport {
        valid: conflicts.is_empty() && missing_dependencies.is_empty(),
        conflicts,
        missing_dependencies,
    }
}
