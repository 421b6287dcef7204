use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Terminal outcome of one cart-initiated order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderOutcome {
    /// The order was submitted.
    Ordered,
    /// The cart was started but never submitted.
    Abandoned,
}

/// Approval decision attached to an order event, where the item required one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
    /// The item does not route through approval.
    NotApplicable,
}

/// One usage event for a catalog item, supplied by the gateway for a bounded
/// time window. Append-only and immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub item_id: String,
    pub occurred_at: DateTime<Utc>,
    pub outcome: OrderOutcome,
    /// Elapsed seconds from order placement to completion. Present only for
    /// `ordered` events whose fulfillment actually completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_secs: Option<u64>,
    #[serde(default = "ApprovalOutcome::not_applicable")]
    pub approval: ApprovalOutcome,
}

impl ApprovalOutcome {
    fn not_applicable() -> Self {
        ApprovalOutcome::NotApplicable
    }
}

/// Requested analysis window. Named windows resolve against a supplied `now`
/// so a run is reproducible under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    LastYear,
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A window resolved to concrete half-open `[start, end)` bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedWindow {
        let (start, end) = match self {
            TimeWindow::Last7Days => (now - Duration::days(7), now),
            TimeWindow::Last30Days => (now - Duration::days(30), now),
            TimeWindow::Last90Days => (now - Duration::days(90), now),
            TimeWindow::LastYear => (now - Duration::days(365), now),
            TimeWindow::Custom { start, end } => (*start, *end),
        };
        ResolvedWindow { start, end }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Last7Days => "last_7_days",
            TimeWindow::Last30Days => "last_30_days",
            TimeWindow::Last90Days => "last_90_days",
            TimeWindow::LastYear => "last_year",
            TimeWindow::Custom { .. } => "custom",
        }
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last_7_days" => Ok(Self::Last7Days),
            "last_30_days" => Ok(Self::Last30Days),
            "last_90_days" => Ok(Self::Last90Days),
            "last_year" => Ok(Self::LastYear),
            other => Err(ConfigError::Validation(format!(
                "unsupported time window `{other}` (expected last_7_days|last_30_days|last_90_days|last_year)"
            ))),
        }
    }
}

impl ResolvedWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn named_window_resolves_to_half_open_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::Last7Days.resolve(now);

        assert!(window.contains(now - Duration::days(3)));
        assert!(window.contains(window.start));
        assert!(!window.contains(now));
        assert!(!window.contains(now - Duration::days(8)));
    }

    #[test]
    fn window_parses_from_snake_case_names() {
        assert_eq!("last_90_days".parse::<TimeWindow>().unwrap(), TimeWindow::Last90Days);
        assert_eq!(" LAST_YEAR ".parse::<TimeWindow>().unwrap(), TimeWindow::LastYear);
        assert!("fortnight".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn event_defaults_approval_to_not_applicable() {
        let parsed: OrderEvent = serde_json::from_str(
            r#"{"item_id":"item_1","occurred_at":"2025-05-01T00:00:00Z","outcome":"ordered"}"#,
        )
        .expect("event without approval should parse");
        assert_eq!(parsed.approval, ApprovalOutcome::NotApplicable);
        assert_eq!(parsed.fulfillment_secs, None);
    }
}
