//! Structure analyzer: defects in the category tree and item set that exist
//! independently of usage data.
//!
//! The category tree is never trusted to be well-formed. Parent references
//! are resolved through an explicit arena keyed by identifier, and every walk
//! is guarded by a visited set, so dangling parents and cycles surface as
//! findings instead of hangs or crashes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::config::{NamingStyle, StructureThresholds};
use crate::domain::{
    CatalogCategory, CatalogItem, Effort, Impact, Recommendation, RecommendationKind, Warning,
    WarningKind,
};

/// Run every structural check over the supplied scope. The caller decides
/// whether inactive records are part of the scope.
pub fn analyze_structure(
    categories: &[CatalogCategory],
    items: &[CatalogItem],
    thresholds: &StructureThresholds,
) -> (Vec<Recommendation>, Vec<Warning>) {
    let arena = CategoryArena::build(categories);
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    let walks = arena.walk_all();
    for category_id in &walks.orphaned {
        warnings.push(Warning::new(
            WarningKind::OrphanedCategory,
            format!("category `{category_id}` references a parent that is missing from the catalog"),
        ));
    }
    for category_id in &walks.cyclic {
        warnings.push(Warning::new(
            WarningKind::CategoryCycle,
            format!("category `{category_id}` sits on a parent chain that loops back on itself"),
        ));
    }

    if !walks.orphaned.is_empty() {
        recommendations.push(grouped(
            RecommendationKind::OrphanedCategory,
            "Orphaned categories",
            "These categories reference a parent that does not exist or is excluded",
            "Reparent these categories or restore their parent",
            Impact::High,
            Effort::Low,
            walks.orphaned.iter().cloned().collect(),
        ));
    }

    let deep: Vec<String> = walks
        .depths
        .iter()
        .filter(|(_, depth)| **depth > thresholds.max_depth)
        .map(|(category_id, _)| category_id.clone())
        .collect();
    if !deep.is_empty() {
        recommendations.push(grouped(
            RecommendationKind::DeepNesting,
            "Deeply nested categories",
            "These categories sit deeper than the configured maximum nesting depth",
            "Flatten the category hierarchy so items stay discoverable",
            Impact::Medium,
            Effort::High,
            deep,
        ));
    }

    recommendations.extend(size_band_defects(&arena, items, thresholds));
    recommendations.extend(naming_defects(categories, items, thresholds.naming_style));
    recommendations.extend(duplicate_defects(items, thresholds.duplicate_similarity));

    debug!(
        recommendations = recommendations.len(),
        warnings = warnings.len(),
        "structure analysis complete"
    );
    (recommendations, warnings)
}

/// Adjacency view of the category tree, keyed by identifier. Parents are
/// looked up through the index, never through object references.
struct CategoryArena<'a> {
    by_id: HashMap<&'a str, &'a CatalogCategory>,
    ordered_ids: Vec<&'a str>,
}

/// Outcome of walking every parent chain once.
struct WalkReport {
    /// Distance from a root, for every category with an intact chain.
    depths: BTreeMap<String, u32>,
    /// Categories whose chain hits a missing parent.
    orphaned: BTreeSet<String>,
    /// Categories whose chain revisits a node.
    cyclic: BTreeSet<String>,
}

enum Walk {
    Depth(u32),
    Orphaned,
    Cyclic,
}

impl<'a> CategoryArena<'a> {
    fn build(categories: &'a [CatalogCategory]) -> Self {
        let by_id: HashMap<&str, &CatalogCategory> =
            categories.iter().map(|category| (category.sys_id.as_str(), category)).collect();
        let mut ordered_ids: Vec<&str> =
            categories.iter().map(|category| category.sys_id.as_str()).collect();
        ordered_ids.sort_unstable();
        ordered_ids.dedup();
        Self { by_id, ordered_ids }
    }

    fn walk_all(&self) -> WalkReport {
        let mut report = WalkReport {
            depths: BTreeMap::new(),
            orphaned: BTreeSet::new(),
            cyclic: BTreeSet::new(),
        };

        for category_id in &self.ordered_ids {
            match self.walk_to_root(category_id) {
                Walk::Depth(depth) => {
                    report.depths.insert((*category_id).to_string(), depth);
                }
                Walk::Orphaned => {
                    // Only the category whose own parent dangles is orphaned;
                    // descendants of a broken chain just lose their depth
                    // reading.
                    let direct = self
                        .by_id
                        .get(*category_id)
                        .and_then(|category| category.parent.as_deref())
                        .is_some_and(|parent_id| !self.by_id.contains_key(parent_id));
                    if direct {
                        report.orphaned.insert((*category_id).to_string());
                    }
                }
                Walk::Cyclic => {
                    report.cyclic.insert((*category_id).to_string());
                }
            }
        }
        report
    }

    /// Bounded walk up the parent chain with a visited-set guard. A broken
    /// link is reported, never followed.
    fn walk_to_root(&self, start: &str) -> Walk {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut current = start;
        let mut depth = 0u32;

        loop {
            if !visited.insert(current) {
                return Walk::Cyclic;
            }
            let Some(category) = self.by_id.get(current) else {
                return Walk::Orphaned;
            };
            match category.parent.as_deref() {
                None => return Walk::Depth(depth),
                Some(parent_id) => {
                    depth += 1;
                    current = parent_id;
                }
            }
        }
    }
}

fn size_band_defects(
    arena: &CategoryArena<'_>,
    items: &[CatalogItem],
    thresholds: &StructureThresholds,
) -> Vec<Recommendation> {
    let mut counts: BTreeMap<&str, usize> =
        arena.ordered_ids.iter().map(|category_id| (*category_id, 0usize)).collect();
    for item in items {
        if let Some(count) =
            item.category.as_deref().and_then(|category_id| counts.get_mut(category_id))
        {
            *count += 1;
        }
    }

    let too_few: Vec<String> = counts
        .iter()
        .filter(|(_, count)| **count < thresholds.min_items_per_category)
        .map(|(category_id, _)| (*category_id).to_string())
        .collect();
    let too_many: Vec<String> = counts
        .iter()
        .filter(|(_, count)| **count > thresholds.max_items_per_category)
        .map(|(category_id, _)| (*category_id).to_string())
        .collect();

    let mut recommendations = Vec::new();
    if !too_few.is_empty() {
        recommendations.push(grouped(
            RecommendationKind::TooFewItems,
            "Categories with too few items",
            "These categories hold fewer items than the configured minimum",
            "Consider merging these categories or moving relevant items into them",
            Impact::Low,
            Effort::Low,
            too_few,
        ));
    }
    if !too_many.is_empty() {
        recommendations.push(grouped(
            RecommendationKind::TooManyItems,
            "Categories with too many items",
            "These categories hold more items than users can comfortably browse",
            "Split these categories into smaller, more specific ones",
            Impact::Medium,
            Effort::Medium,
            too_many,
        ));
    }
    recommendations
}

fn naming_defects(
    categories: &[CatalogCategory],
    items: &[CatalogItem],
    style: NamingStyle,
) -> Vec<Recommendation> {
    let mut offenders: Vec<String> = categories
        .iter()
        .filter(|category| !follows_style(&category.title, style))
        .map(|category| category.sys_id.clone())
        .chain(
            items
                .iter()
                .filter(|item| !follows_style(&item.name, style))
                .map(|item| item.sys_id.clone()),
        )
        .collect();
    offenders.sort();
    offenders.dedup();

    if offenders.is_empty() {
        return Vec::new();
    }
    vec![grouped(
        RecommendationKind::NamingInconsistency,
        "Inconsistent naming",
        "These titles do not follow the catalog naming convention",
        "Rename these records to match the configured convention",
        Impact::Low,
        Effort::Low,
        offenders,
    )]
}

/// Best-effort casing check. Tokens with digits or interior capitals
/// (acronyms, SKUs) are left alone; only plainly lowercase or miscapitalized
/// words count against a title.
fn follows_style(title: &str, style: NamingStyle) -> bool {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.is_empty() {
        return false;
    }

    match style {
        NamingStyle::TitleCase => tokens.iter().enumerate().all(|(position, token)| {
            if !token.chars().all(|c| c.is_ascii_alphabetic()) {
                return true;
            }
            if position > 0 && is_stopword(token) {
                return true;
            }
            token.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        }),
        NamingStyle::SentenceCase => tokens.iter().enumerate().all(|(position, token)| {
            if !token.chars().all(|c| c.is_ascii_alphabetic()) {
                return true;
            }
            let first_upper = token.chars().next().is_some_and(|c| c.is_ascii_uppercase());
            if position == 0 {
                first_upper
            } else {
                // Later words stay lowercase unless they are acronyms.
                !first_upper || token.chars().all(|c| c.is_ascii_uppercase())
            }
        }),
    }
}

fn is_stopword(token: &str) -> bool {
    matches!(
        token.to_ascii_lowercase().as_str(),
        "a" | "an" | "and" | "for" | "in" | "of" | "or" | "the" | "to" | "with"
    )
}

/// Pairwise near-duplicate detection over normalized short descriptions,
/// using the Jaccard coefficient of character trigrams. One recommendation
/// per pair, naming both items.
fn duplicate_defects(items: &[CatalogItem], threshold: f64) -> Vec<Recommendation> {
    let mut described: Vec<(&str, Vec<String>)> = items
        .iter()
        .filter_map(|item| {
            item.short_description_text()
                .map(|text| (item.sys_id.as_str(), trigrams(&normalize(text))))
        })
        .filter(|(_, grams)| !grams.is_empty())
        .collect();
    described.sort_by(|a, b| a.0.cmp(b.0));

    let mut recommendations = Vec::new();
    for (index, (left_id, left_grams)) in described.iter().enumerate() {
        for (right_id, right_grams) in described.iter().skip(index + 1) {
            let similarity = jaccard(left_grams, right_grams);
            if similarity >= threshold {
                recommendations.push(grouped(
                    RecommendationKind::PossibleDuplicate,
                    "Possible duplicate items",
                    "These items have nearly identical short descriptions",
                    "Review the pair and consolidate or differentiate them",
                    Impact::Medium,
                    Effort::Medium,
                    vec![(*left_id).to_string(), (*right_id).to_string()],
                ));
            }
        }
    }
    recommendations
}

fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn trigrams(normalized: &str) -> Vec<String> {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() < 3 {
        return vec![normalized.to_string()];
    }
    let mut grams: Vec<String> =
        chars.windows(3).map(|window| window.iter().collect()).collect();
    grams.sort();
    grams.dedup();
    grams
}

fn jaccard(left: &[String], right: &[String]) -> f64 {
    let left_set: BTreeSet<&String> = left.iter().collect();
    let right_set: BTreeSet<&String> = right.iter().collect();
    let union = left_set.union(&right_set).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left_set.intersection(&right_set).count();
    intersection as f64 / union as f64
}

#[allow(clippy::too_many_arguments)]
fn grouped(
    kind: RecommendationKind,
    title: &str,
    description: &str,
    action: &str,
    impact: Impact,
    effort: Effort,
    items: Vec<String>,
) -> Recommendation {
    Recommendation {
        kind,
        title: title.to_string(),
        description: description.to_string(),
        action: action.to_string(),
        impact,
        effort,
        items,
    }
}
