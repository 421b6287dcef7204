use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-item usage statistics derived for one analysis window.
///
/// Created fresh by the metrics aggregator for each run and never mutated
/// afterward. The `Option` metrics distinguish "no qualifying events" from a
/// measured zero: an item with no completed fulfillments has
/// `mean_fulfillment_secs: None`, not `Some(0.0)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageMetricSnapshot {
    pub item_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Events with outcome `ordered`.
    pub order_count: u32,
    /// Events with outcome `abandoned`.
    pub abandoned_count: u32,
    /// abandoned / (ordered + abandoned); `0.0` when there was no activity.
    pub abandonment_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_fulfillment_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_fulfillment_secs: Option<f64>,
    /// approved / (approved + rejected) over approval-bearing events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_rate: Option<f64>,
}

impl UsageMetricSnapshot {
    /// Total cart activity in the window: submitted plus abandoned orders.
    /// This is the sample size the high-abandonment rule is gated on.
    pub fn activity(&self) -> u32 {
        self.order_count + self.abandoned_count
    }
}
