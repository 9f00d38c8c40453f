// src/engine/resolve.rs

use std::collections::HashMap;

use crate::models::{Severity, SlaThreshold};

use super::normalize::company_join_key;

/// Exact-match lookup over the threshold matrix, keyed by
/// (normalized company, severity). No fuzzy matching, no default severity.
pub struct ThresholdIndex<'a> {
    by_key: HashMap<(String, Severity), &'a SlaThreshold>,
}

impl<'a> ThresholdIndex<'a> {
    /// Duplicate (company, severity) rows: last wins.
    pub fn build(rows: &'a [SlaThreshold]) -> Self {
        let mut by_key = HashMap::with_capacity(rows.len());
        for row in rows {
            by_key.insert((company_join_key(&row.company), row.severity), row);
        }
        Self { by_key }
    }

    /// `None` is a first-class outcome (no threshold for this pair), not
    /// an error; it surfaces downstream as indeterminate compliance.
    pub fn resolve(&self, join_key: &str, severity: Severity) -> Option<&'a SlaThreshold> {
        self.by_key.get(&(join_key.to_string(), severity)).copied()
    }
}
