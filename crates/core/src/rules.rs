//! Recommendation rules engine.
//!
//! Each rule family is a variant of the closed [`RuleFamily`] enum bound to a
//! pure evaluator over the item population and its usage snapshots. An
//! evaluator returns at most one recommendation, listing every item the rule
//! applies to. Families never merge their findings: an item with both high
//! abandonment and a weak description shows up under both, so the caller sees
//! every applicable concern.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::RuleThresholds;
use crate::domain::{
    CatalogItem, Effort, Impact, Recommendation, RuleFamily, UsageMetricSnapshot,
};

/// Inputs shared by every rule evaluator for one run. The item slice carries
/// the whole scope under analysis (inactive records included, so the
/// inactive-items rule can see them); snapshots are keyed by item id.
pub struct RulePopulation<'a> {
    pub items: &'a [CatalogItem],
    pub snapshots: &'a HashMap<String, UsageMetricSnapshot>,
}

impl<'a> RulePopulation<'a> {
    fn order_count(&self, item_id: &str) -> u32 {
        self.snapshots.get(item_id).map_or(0, |snapshot| snapshot.order_count)
    }

    fn activity(&self, item_id: &str) -> u32 {
        self.snapshots.get(item_id).map_or(0, |snapshot| snapshot.activity())
    }
}

/// Run the requested families in their canonical order.
pub fn evaluate_rules(
    families: &BTreeSet<RuleFamily>,
    population: &RulePopulation<'_>,
    thresholds: &RuleThresholds,
) -> Vec<Recommendation> {
    let recommendations: Vec<Recommendation> = RuleFamily::ALL
        .iter()
        .filter(|family| families.contains(*family))
        .filter_map(|family| family.evaluate(population, thresholds))
        .collect();

    debug!(
        families = families.len(),
        fired = recommendations.len(),
        "rule evaluation complete"
    );
    recommendations
}

impl RuleFamily {
    /// Pure evaluation of one family. Zero-or-one recommendation; the item
    /// list inside is sorted for determinism.
    pub fn evaluate(
        &self,
        population: &RulePopulation<'_>,
        thresholds: &RuleThresholds,
    ) -> Option<Recommendation> {
        let mut affected = match self {
            RuleFamily::InactiveItems => inactive_items(population),
            RuleFamily::LowUsage => low_usage(population, thresholds),
            RuleFamily::HighAbandonment => high_abandonment(population, thresholds),
            RuleFamily::SlowFulfillment => slow_fulfillment(population, thresholds),
            RuleFamily::DescriptionQuality => description_quality(population, thresholds),
        };

        if affected.is_empty() {
            return None;
        }
        affected.sort();
        affected.dedup();

        let (title, description, action, impact, effort) = self.metadata();
        Some(Recommendation {
            kind: self.kind(),
            title: title.to_string(),
            description: description.to_string(),
            action: action.to_string(),
            impact,
            effort,
            items: affected,
        })
    }

    fn metadata(&self) -> (&'static str, &'static str, &'static str, Impact, Effort) {
        match self {
            RuleFamily::InactiveItems => (
                "Consider retiring inactive catalog items",
                "These items are marked as inactive but still exist in the catalog",
                "Review these items and consider removing them from the catalog",
                Impact::Low,
                Effort::Low,
            ),
            RuleFamily::LowUsage => (
                "Items with low usage",
                "These items were ordered rarely compared to the rest of the catalog in the analysis window",
                "Consider promoting these items, improving their descriptions, or retiring them",
                Impact::Medium,
                Effort::Medium,
            ),
            RuleFamily::HighAbandonment => (
                "Items with high abandonment rates",
                "These items are frequently added to carts but not ordered",
                "Review the item variables and simplify the ordering process",
                Impact::High,
                Effort::Medium,
            ),
            RuleFamily::SlowFulfillment => (
                "Items with slow fulfillment times",
                "These items take much longer than their category median to fulfill",
                "Review the fulfillment workflow and identify bottlenecks",
                Impact::High,
                Effort::High,
            ),
            RuleFamily::DescriptionQuality => (
                "Items with poor description quality",
                "These items have short or generic descriptions that may confuse users",
                "Improve the descriptions to be more detailed and specific",
                Impact::Low,
                Effort::Low,
            ),
        }
    }
}

fn inactive_items(population: &RulePopulation<'_>) -> Vec<String> {
    population
        .items
        .iter()
        .filter(|item| !item.active && population.order_count(&item.sys_id) == 0)
        .map(|item| item.sys_id.clone())
        .collect()
}

/// Rank-based percentile over active items with any cart activity. Ties share
/// the same bucket: an item's percentile is the fraction of the population
/// with a strictly smaller order count.
fn low_usage(population: &RulePopulation<'_>, thresholds: &RuleThresholds) -> Vec<String> {
    let ranked: Vec<(&str, u32)> = population
        .items
        .iter()
        .filter(|item| item.active && population.activity(&item.sys_id) > 0)
        .map(|item| (item.sys_id.as_str(), population.order_count(&item.sys_id)))
        .collect();

    if ranked.len() < 2 {
        // A population of one has no meaningful rank.
        return Vec::new();
    }

    let total = ranked.len() as f64;
    ranked
        .iter()
        .filter(|(_, count)| {
            let below = ranked.iter().filter(|(_, other)| other < count).count();
            (below as f64 / total) < thresholds.low_usage_percentile
        })
        .map(|(item_id, _)| item_id.to_string())
        .collect()
}

fn high_abandonment(
    population: &RulePopulation<'_>,
    thresholds: &RuleThresholds,
) -> Vec<String> {
    population
        .snapshots
        .values()
        .filter(|snapshot| snapshot.activity() >= thresholds.min_sample_size)
        .filter(|snapshot| snapshot.abandonment_rate >= thresholds.abandonment_threshold)
        .map(|snapshot| snapshot.item_id.clone())
        .collect()
}

/// An item is slow when its mean fulfillment time exceeds the configured
/// multiple of the median of per-item means within the same category.
fn slow_fulfillment(
    population: &RulePopulation<'_>,
    thresholds: &RuleThresholds,
) -> Vec<String> {
    let mut by_category: HashMap<Option<&str>, Vec<(&str, f64)>> = HashMap::new();
    for item in population.items {
        if let Some(mean) = population
            .snapshots
            .get(&item.sys_id)
            .and_then(|snapshot| snapshot.mean_fulfillment_secs)
        {
            by_category
                .entry(item.category.as_deref())
                .or_default()
                .push((item.sys_id.as_str(), mean));
        }
    }

    let mut affected = Vec::new();
    for members in by_category.values() {
        let mut means: Vec<f64> = members.iter().map(|(_, mean)| *mean).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let Some(category_median) = median_f64(&means) else { continue };
        if category_median <= 0.0 {
            continue;
        }

        for (item_id, mean) in members {
            if *mean > thresholds.slow_fulfillment_ratio * category_median {
                affected.push(item_id.to_string());
            }
        }
    }
    affected
}

fn description_quality(
    population: &RulePopulation<'_>,
    thresholds: &RuleThresholds,
) -> Vec<String> {
    population
        .items
        .iter()
        .filter(|item| item.active)
        .filter(|item| match item.short_description_text() {
            None => true,
            Some(text) => {
                text.chars().count() < thresholds.min_description_chars
                    || is_instructional_boilerplate(text)
            }
        })
        .map(|item| item.sys_id.clone())
        .collect()
}

/// Descriptions that instruct instead of describing ("please submit...",
/// "click here to...") confuse catalog search and get flagged alongside
/// too-short ones.
fn is_instructional_boilerplate(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    ["please", "click here", "use this form"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn median_f64(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::domain::{RecommendationKind, TimeWindow};

    use super::*;

    fn item(sys_id: &str, active: bool, short_description: Option<&str>) -> CatalogItem {
        CatalogItem {
            sys_id: sys_id.to_string(),
            name: sys_id.to_string(),
            short_description: short_description.map(str::to_string),
            description: None,
            category: Some("cat_hw".to_string()),
            active,
            price: None,
            order: None,
        }
    }

    fn snapshot(item_id: &str, order_count: u32, abandoned_count: u32) -> UsageMetricSnapshot {
        let window = TimeWindow::Last30Days
            .resolve(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let activity = order_count + abandoned_count;
        UsageMetricSnapshot {
            item_id: item_id.to_string(),
            window_start: window.start,
            window_end: window.end,
            order_count,
            abandoned_count,
            abandonment_rate: if activity == 0 {
                0.0
            } else {
                f64::from(abandoned_count) / f64::from(activity)
            },
            mean_fulfillment_secs: None,
            median_fulfillment_secs: None,
            approval_rate: None,
        }
    }

    fn snapshots(entries: Vec<UsageMetricSnapshot>) -> HashMap<String, UsageMetricSnapshot> {
        entries.into_iter().map(|s| (s.item_id.clone(), s)).collect()
    }

    fn all_families() -> BTreeSet<RuleFamily> {
        RuleFamily::ALL.into_iter().collect()
    }

    #[test]
    fn inactive_rule_requires_zero_orders() {
        let items = vec![item("dusty", false, None), item("retired_but_used", false, None)];
        let snaps = snapshots(vec![snapshot("retired_but_used", 3, 0)]);
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let rec = RuleFamily::InactiveItems
            .evaluate(&population, &RuleThresholds::default())
            .expect("inactive rule should fire");
        assert_eq!(rec.items, vec!["dusty".to_string()]);
    }

    #[test]
    fn high_abandonment_fires_at_threshold_with_enough_samples() {
        // 10 ordered + 10 abandoned: rate exactly 0.5 at default threshold 0.5.
        let items = vec![item("a", true, None)];
        let snaps = snapshots(vec![snapshot("a", 10, 10)]);
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let rec = RuleFamily::HighAbandonment
            .evaluate(&population, &RuleThresholds::default())
            .expect("rule should fire at the threshold");
        assert_eq!(rec.kind, RecommendationKind::HighAbandonment);
        assert_eq!(rec.impact, Impact::High);
    }

    #[test]
    fn high_abandonment_sample_gate_counts_total_activity() {
        // 2 ordered + 8 abandoned = 10 qualifying events, meeting the minimum
        // exactly even though only 2 were submitted.
        let items = vec![item("a", true, None)];
        let snaps = snapshots(vec![snapshot("a", 2, 8)]);
        let population = RulePopulation { items: &items, snapshots: &snaps };
        let thresholds = RuleThresholds { min_sample_size: 10, ..RuleThresholds::default() };

        assert!(RuleFamily::HighAbandonment.evaluate(&population, &thresholds).is_some());
    }

    #[test]
    fn high_abandonment_never_fires_below_the_sample_gate() {
        // Total rate 1.0 but only 3 events against a minimum of 5.
        let items = vec![item("a", true, None)];
        let snaps = snapshots(vec![snapshot("a", 0, 3)]);
        let population = RulePopulation { items: &items, snapshots: &snaps };

        assert!(RuleFamily::HighAbandonment
            .evaluate(&population, &RuleThresholds::default())
            .is_none());
    }

    #[test]
    fn low_usage_flags_the_bottom_of_the_ranking() {
        let items: Vec<CatalogItem> =
            (0..10).map(|n| item(&format!("item_{n}"), true, None)).collect();
        let snaps = snapshots(
            (0..10).map(|n| snapshot(&format!("item_{n}"), (n as u32 + 1) * 10, 0)).collect(),
        );
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let rec = RuleFamily::LowUsage
            .evaluate(&population, &RuleThresholds::default())
            .expect("bottom decile should fire");
        // Only item_0 (10 orders) has no one strictly below it within 10%.
        assert_eq!(rec.items, vec!["item_0".to_string()]);
    }

    #[test]
    fn low_usage_ignores_zero_activity_items() {
        let items = vec![item("quiet", true, None), item("busy", true, None)];
        let snaps = snapshots(vec![snapshot("busy", 50, 0)]);
        let population = RulePopulation { items: &items, snapshots: &snaps };

        // "quiet" has no events at all: it signals "no data", not low usage,
        // and a population of one cannot be ranked.
        assert!(RuleFamily::LowUsage
            .evaluate(&population, &RuleThresholds::default())
            .is_none());
    }

    #[test]
    fn slow_fulfillment_compares_against_category_median() {
        let items = vec![
            item("fast_1", true, None),
            item("fast_2", true, None),
            item("fast_3", true, None),
            item("slow", true, None),
        ];
        let mut entries = vec![
            snapshot("fast_1", 5, 0),
            snapshot("fast_2", 5, 0),
            snapshot("fast_3", 5, 0),
            snapshot("slow", 5, 0),
        ];
        entries[0].mean_fulfillment_secs = Some(3_600.0);
        entries[1].mean_fulfillment_secs = Some(4_000.0);
        entries[2].mean_fulfillment_secs = Some(4_400.0);
        entries[3].mean_fulfillment_secs = Some(40_000.0);
        let snaps = snapshots(entries);
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let rec = RuleFamily::SlowFulfillment
            .evaluate(&population, &RuleThresholds::default())
            .expect("outlier should fire");
        assert_eq!(rec.items, vec!["slow".to_string()]);
    }

    #[test]
    fn description_quality_flags_short_missing_and_boilerplate() {
        let items = vec![
            item("missing", true, None),
            item("short", true, Some("A laptop")),
            item("boilerplate", true, Some("Please click here to request your hardware")),
            item("fine", true, Some("Standard issue 14-inch developer laptop with dock")),
            item("inactive", false, None),
        ];
        let snaps = snapshots(Vec::new());
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let rec = RuleFamily::DescriptionQuality
            .evaluate(&population, &RuleThresholds::default())
            .expect("weak descriptions should fire");
        assert_eq!(
            rec.items,
            vec!["boilerplate".to_string(), "missing".to_string(), "short".to_string()]
        );
    }

    #[test]
    fn evaluate_rules_runs_only_requested_families() {
        let items = vec![item("dusty", false, None)];
        let snaps = snapshots(Vec::new());
        let population = RulePopulation { items: &items, snapshots: &snaps };

        let only_low_usage: BTreeSet<RuleFamily> = [RuleFamily::LowUsage].into_iter().collect();
        assert!(evaluate_rules(&only_low_usage, &population, &RuleThresholds::default())
            .is_empty());

        let fired = evaluate_rules(&all_families(), &population, &RuleThresholds::default());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, RecommendationKind::InactiveItems);
    }
}
