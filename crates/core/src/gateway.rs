//! Data access gateway contract.
//!
//! The engine never talks to the record store directly; it consumes read-only
//! snapshots through [`CatalogGateway`]. How records move over the wire and
//! how credentials are obtained belong to the collaborator behind this trait.
//! The crate ships [`StaticGateway`], an in-memory implementation over owned
//! record vectors, used by the test suite and by the snapshot-backed server.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CatalogCategory, CatalogItem, OrderEvent, ResolvedWindow};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway rejected the query: {0}")]
    BadQuery(String),
}

/// Read-only access to catalog records and usage telemetry.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Catalog items, optionally restricted to one category. Inactive items
    /// are returned only when `include_inactive` is set.
    async fn fetch_items(
        &self,
        category_filter: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<CatalogItem>, GatewayError>;

    /// The full category set, with inactive categories filtered unless
    /// requested.
    async fn fetch_categories(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<CatalogCategory>, GatewayError>;

    /// Order/usage events inside the window, optionally restricted to items
    /// belonging to one category.
    async fn fetch_order_events(
        &self,
        window: &ResolvedWindow,
        category_filter: Option<&str>,
    ) -> Result<Vec<OrderEvent>, GatewayError>;
}

/// In-memory gateway over owned record vectors.
///
/// Filtering semantics match what the real record store would apply
/// server-side, so the engine sees the same shapes either way.
#[derive(Clone, Debug, Default)]
pub struct StaticGateway {
    items: Vec<CatalogItem>,
    categories: Vec<CatalogCategory>,
    events: Vec<OrderEvent>,
}

impl StaticGateway {
    pub fn new(
        items: Vec<CatalogItem>,
        categories: Vec<CatalogCategory>,
        events: Vec<OrderEvent>,
    ) -> Self {
        Self { items, categories, events }
    }

    fn item_categories(&self) -> HashMap<&str, Option<&str>> {
        self.items
            .iter()
            .map(|item| (item.sys_id.as_str(), item.category.as_deref()))
            .collect()
    }
}

#[async_trait]
impl CatalogGateway for StaticGateway {
    async fn fetch_items(
        &self,
        category_filter: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<CatalogItem>, GatewayError> {
        Ok(self
            .items
            .iter()
            .filter(|item| include_inactive || item.active)
            .filter(|item| match category_filter {
                Some(category) => item.category.as_deref() == Some(category),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn fetch_categories(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<CatalogCategory>, GatewayError> {
        Ok(self
            .categories
            .iter()
            .filter(|category| include_inactive || category.active)
            .cloned()
            .collect())
    }

    async fn fetch_order_events(
        &self,
        window: &ResolvedWindow,
        category_filter: Option<&str>,
    ) -> Result<Vec<OrderEvent>, GatewayError> {
        let item_categories = self.item_categories();

        Ok(self
            .events
            .iter()
            .filter(|event| window.contains(event.occurred_at))
            .filter(|event| match category_filter {
                Some(category) => {
                    // Events for unknown items pass through; the aggregator is
                    // responsible for reporting orphaned references.
                    match item_categories.get(event.item_id.as_str()) {
                        Some(item_category) => *item_category == Some(category),
                        None => true,
                    }
                }
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::{ApprovalOutcome, OrderOutcome, TimeWindow};

    use super::*;

    fn item(sys_id: &str, category: Option<&str>, active: bool) -> CatalogItem {
        CatalogItem {
            sys_id: sys_id.to_string(),
            name: sys_id.to_string(),
            short_description: None,
            description: None,
            category: category.map(str::to_string),
            active,
            price: None,
            order: None,
        }
    }

    fn event(item_id: &str, days_ago: i64) -> OrderEvent {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        OrderEvent {
            item_id: item_id.to_string(),
            occurred_at: now - Duration::days(days_ago),
            outcome: OrderOutcome::Ordered,
            fulfillment_secs: None,
            approval: ApprovalOutcome::NotApplicable,
        }
    }

    #[tokio::test]
    async fn inactive_items_are_hidden_unless_requested() {
        let gateway = StaticGateway::new(
            vec![item("a", None, true), item("b", None, false)],
            Vec::new(),
            Vec::new(),
        );

        let active_only = gateway.fetch_items(None, false).await.unwrap();
        assert_eq!(active_only.len(), 1);

        let all = gateway.fetch_items(None, true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn events_are_scoped_to_window_and_category() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let gateway = StaticGateway::new(
            vec![item("a", Some("cat_hw"), true), item("b", Some("cat_sw"), true)],
            Vec::new(),
            vec![event("a", 3), event("a", 40), event("b", 3)],
        );

        let window = TimeWindow::Last7Days.resolve(now);
        let scoped = gateway.fetch_order_events(&window, Some("cat_hw")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].item_id, "a");
    }

    #[tokio::test]
    async fn events_for_unknown_items_survive_category_filtering() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let gateway =
            StaticGateway::new(vec![item("a", Some("cat_hw"), true)], Vec::new(), vec![
                event("ghost", 1),
            ]);

        let window = TimeWindow::Last7Days.resolve(now);
        let events = gateway.fetch_order_events(&window, Some("cat_hw")).await.unwrap();
        assert_eq!(events.len(), 1, "orphaned events must reach the aggregator");
    }
}
