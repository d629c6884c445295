// ABOUTME: Helpers for space-delimited OAuth scope strings
// ABOUTME: Subset checks for downscoping and membership tests for offline_access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use std::collections::HashSet;

/// Whether every token of `requested` appears in `original`.
///
/// The empty request is a subset of anything; refreshing without a `scope`
/// parameter keeps the original grant.
#[must_use]
pub fn is_scope_subset(requested: &str, original: &str) -> bool {
    if requested.is_empty() {
        return true;
    }
    let original: HashSet<&str> = original.split_whitespace().collect();
    requested
        .split_whitespace()
        .all(|scope| original.contains(scope))
}

/// Whether `scope_str` contains `target` as a whole token
#[must_use]
pub fn has_scope(scope_str: &str, target: &str) -> bool {
    scope_str.split_whitespace().any(|scope| scope == target)
}
