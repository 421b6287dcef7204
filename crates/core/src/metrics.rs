//! Metrics aggregator: raw order events in, per-item usage snapshots out.
//!
//! Aggregation is pure and order-independent; the orchestrator fetches the
//! inputs and this module only folds them. Per-item grouping is associative,
//! so upstream fetches may be split and parallelized freely without changing
//! the result.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{
    ApprovalOutcome, CatalogItem, OrderEvent, OrderOutcome, ResolvedWindow, UsageMetricSnapshot,
    Warning, WarningKind,
};

/// Aggregate events into one snapshot per item referenced in the window.
///
/// Items present in `item_index` but without events receive an all-zero
/// snapshot only when `include_zero_activity` is set; otherwise they are
/// omitted so "no data" stays distinguishable from "data of zero". Events
/// referencing an item the gateway could not resolve produce a warning and no
/// snapshot.
pub fn aggregate_usage(
    events: &[OrderEvent],
    item_index: &HashMap<String, CatalogItem>,
    window: &ResolvedWindow,
    include_zero_activity: bool,
) -> (Vec<UsageMetricSnapshot>, Vec<Warning>) {
    let mut by_item: BTreeMap<&str, Vec<&OrderEvent>> = BTreeMap::new();
    let mut orphaned: BTreeSet<&str> = BTreeSet::new();

    for event in events {
        if item_index.contains_key(&event.item_id) {
            by_item.entry(event.item_id.as_str()).or_default().push(event);
        } else {
            orphaned.insert(event.item_id.as_str());
        }
    }

    if include_zero_activity {
        for item_id in item_index.keys() {
            by_item.entry(item_id.as_str()).or_default();
        }
    }

    let warnings: Vec<Warning> = orphaned
        .iter()
        .map(|item_id| {
            Warning::new(
                WarningKind::OrphanedItem,
                format!("order events reference unknown catalog item `{item_id}`"),
            )
        })
        .collect();

    let snapshots: Vec<UsageMetricSnapshot> = by_item
        .into_iter()
        .map(|(item_id, item_events)| snapshot_for(item_id, &item_events, window))
        .collect();

    debug!(
        snapshots = snapshots.len(),
        orphaned = warnings.len(),
        "aggregated usage metrics"
    );

    (snapshots, warnings)
}

fn snapshot_for(
    item_id: &str,
    events: &[&OrderEvent],
    window: &ResolvedWindow,
) -> UsageMetricSnapshot {
    let order_count = events.iter().filter(|e| e.outcome == OrderOutcome::Ordered).count() as u32;
    let abandoned_count =
        events.iter().filter(|e| e.outcome == OrderOutcome::Abandoned).count() as u32;

    let activity = order_count + abandoned_count;
    let abandonment_rate =
        if activity == 0 { 0.0 } else { f64::from(abandoned_count) / f64::from(activity) };

    let mut durations: Vec<u64> = events
        .iter()
        .filter(|e| e.outcome == OrderOutcome::Ordered)
        .filter_map(|e| e.fulfillment_secs)
        .collect();
    durations.sort_unstable();

    let mean_fulfillment_secs = (!durations.is_empty())
        .then(|| durations.iter().sum::<u64>() as f64 / durations.len() as f64);
    let median_fulfillment_secs = median(&durations);

    let approved = events.iter().filter(|e| e.approval == ApprovalOutcome::Approved).count();
    let rejected = events.iter().filter(|e| e.approval == ApprovalOutcome::Rejected).count();
    let approval_rate = (approved + rejected > 0)
        .then(|| approved as f64 / (approved + rejected) as f64);

    UsageMetricSnapshot {
        item_id: item_id.to_string(),
        window_start: window.start,
        window_end: window.end,
        order_count,
        abandoned_count,
        abandonment_rate,
        mean_fulfillment_secs,
        median_fulfillment_secs,
        approval_rate,
    }
}

fn median(sorted: &[u64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid] as f64)
    } else {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::TimeWindow;

    use super::*;

    fn window() -> ResolvedWindow {
        TimeWindow::Last30Days.resolve(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
    }

    fn item(sys_id: &str) -> CatalogItem {
        CatalogItem {
            sys_id: sys_id.to_string(),
            name: sys_id.to_string(),
            short_description: None,
            description: None,
            category: None,
            active: true,
            price: None,
            order: None,
        }
    }

    fn index(ids: &[&str]) -> HashMap<String, CatalogItem> {
        ids.iter().map(|id| (id.to_string(), item(id))).collect()
    }

    fn event(
        item_id: &str,
        outcome: OrderOutcome,
        fulfillment_secs: Option<u64>,
        approval: ApprovalOutcome,
    ) -> OrderEvent {
        OrderEvent {
            item_id: item_id.to_string(),
            occurred_at: window().start + Duration::days(1),
            outcome,
            fulfillment_secs,
            approval,
        }
    }

    #[test]
    fn abandonment_rate_covers_ordered_and_abandoned() {
        let events: Vec<OrderEvent> = std::iter::repeat_with(|| {
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable)
        })
        .take(10)
        .chain(std::iter::repeat_with(|| {
            event("a", OrderOutcome::Abandoned, None, ApprovalOutcome::NotApplicable)
        })
        .take(10))
        .collect();

        let (snapshots, warnings) = aggregate_usage(&events, &index(&["a"]), &window(), false);
        assert!(warnings.is_empty());
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].order_count, 10);
        assert_eq!(snapshots[0].abandoned_count, 10);
        assert!((snapshots[0].abandonment_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn no_activity_means_rate_zero_not_an_error() {
        let (snapshots, _) = aggregate_usage(&[], &index(&["a"]), &window(), true);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].abandonment_rate, 0.0);
        assert_eq!(snapshots[0].order_count, 0);
    }

    #[test]
    fn zero_activity_items_are_omitted_by_default() {
        let (snapshots, _) = aggregate_usage(&[], &index(&["a"]), &window(), false);
        assert!(snapshots.is_empty());
    }

    #[test]
    fn fulfillment_metrics_are_absent_without_completed_fulfillments() {
        let events =
            vec![event("a", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable)];
        let (snapshots, _) = aggregate_usage(&events, &index(&["a"]), &window(), false);
        assert_eq!(snapshots[0].mean_fulfillment_secs, None);
        assert_eq!(snapshots[0].median_fulfillment_secs, None);
    }

    #[test]
    fn fulfillment_mean_and_median_ignore_abandoned_events() {
        let events = vec![
            event("a", OrderOutcome::Ordered, Some(100), ApprovalOutcome::NotApplicable),
            event("a", OrderOutcome::Ordered, Some(200), ApprovalOutcome::NotApplicable),
            event("a", OrderOutcome::Ordered, Some(600), ApprovalOutcome::NotApplicable),
            // Abandoned carts carry no fulfillment signal even if populated.
            event("a", OrderOutcome::Abandoned, Some(9_999), ApprovalOutcome::NotApplicable),
        ];
        let (snapshots, _) = aggregate_usage(&events, &index(&["a"]), &window(), false);
        assert_eq!(snapshots[0].mean_fulfillment_secs, Some(300.0));
        assert_eq!(snapshots[0].median_fulfillment_secs, Some(200.0));
    }

    #[test]
    fn approval_rate_counts_only_approval_bearing_events() {
        let events = vec![
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::Approved),
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::Approved),
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::Rejected),
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable),
        ];
        let (snapshots, _) = aggregate_usage(&events, &index(&["a"]), &window(), false);
        let rate = snapshots[0].approval_rate.expect("approval-bearing events exist");
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn orphaned_references_warn_without_aborting() {
        let events = vec![
            event("ghost", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable),
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable),
        ];
        let (snapshots, warnings) = aggregate_usage(&events, &index(&["a"]), &window(), false);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::OrphanedItem);
        assert!(warnings[0].message.contains("ghost"));
    }

    #[test]
    fn snapshots_come_back_sorted_by_item_id() {
        let events = vec![
            event("b", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable),
            event("a", OrderOutcome::Ordered, None, ApprovalOutcome::NotApplicable),
        ];
        let (snapshots, _) = aggregate_usage(&events, &index(&["a", "b"]), &window(), false);
        let ids: Vec<&str> = snapshots.iter().map(|s| s.item_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}
