// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge-style annotation patches
//!
//! A patch is the diff of a mutated object against the base it was derived
//! from. Applying it touches only the keys that differ, so concurrent writers
//! of unrelated annotations do not clobber each other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation changes: `Some(value)` sets a key, `None` removes it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    changes: BTreeMap<String, Option<String>>,
}

impl AnnotationPatch {
    /// Compute the patch that turns `base` into `mutated`
    pub fn diff(base: &BTreeMap<String, String>, mutated: &BTreeMap<String, String>) -> Self {
        let mut changes = BTreeMap::new();

        for (key, value) in mutated {
            if base.get(key) != Some(value) {
                changes.insert(key.clone(), Some(value.clone()));
            }
        }
        for key in base.keys() {
            if !mutated.contains_key(key) {
                changes.insert(key.clone(), None);
            }
        }

        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Value the patch writes for `key`, if it touches it
    pub fn change(&self, key: &str) -> Option<Option<&str>> {
        self.changes.get(key).map(|v| v.as_deref())
    }

    /// Apply to `target` in place
    pub fn apply(&self, target: &mut BTreeMap<String, String>) {
        for (key, value) in &self.changes {
            match value {
                Some(value) => {
                    target.insert(key.clone(), value.clone());
                }
                None => {
                    target.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
