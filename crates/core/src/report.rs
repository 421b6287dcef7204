//! Report assembler: merges rules-engine and structure-analyzer output into
//! one deterministic, de-duplicated list with per-kind summary counts.
//! Performs no I/O; given the same inputs it produces byte-identical output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Recommendation, RecommendationKind};

/// Final merged view handed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogReport {
    /// All surviving recommendations in report order.
    pub recommendations: Vec<Recommendation>,
    /// Recommendation count per kind, keyed by kind name.
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

/// Merge, filter, de-duplicate, and order.
///
/// `requested` restricts the report to the given kinds; `None` keeps
/// everything. Duplicates are recommendations with the same kind and the same
/// affected set, which can happen when both engines flag the same records.
pub fn assemble(
    rule_recommendations: Vec<Recommendation>,
    structure_recommendations: Vec<Recommendation>,
    requested: Option<&BTreeSet<RecommendationKind>>,
) -> CatalogReport {
    let mut merged: Vec<Recommendation> = rule_recommendations
        .into_iter()
        .chain(structure_recommendations)
        .filter(|rec| requested.map_or(true, |kinds| kinds.contains(&rec.kind)))
        .collect();

    merged.sort_by(Recommendation::report_ordering);
    merged.dedup_by(|a, b| a.kind == b.kind && a.items == b.items);

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rec in &merged {
        *counts.entry(rec.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let total = merged.len();
    CatalogReport { recommendations: merged, counts, total }
}
