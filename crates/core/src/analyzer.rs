//! Top-level orchestration of one analysis run.
//!
//! [`CatalogAnalyzer`] wires the gateway, the metrics aggregator, the rules
//! engine, the structure analyzer, and the report assembler into the three
//! operations exposed to the tool layer. Each run is a single batch
//! computation over value objects it owns, so concurrent runs with different
//! configurations never interfere.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::domain::{
    AnalysisOutcome, CatalogItem, Recommendation, RecommendationKind, ResolvedWindow, RuleFamily,
    TimeWindow, UsageMetricSnapshot,
};
use crate::errors::AnalysisError;
use crate::gateway::{CatalogGateway, GatewayError};
use crate::metrics::aggregate_usage;
use crate::report::{assemble, CatalogReport};
use crate::rules::{evaluate_rules, RulePopulation};
use crate::structure::analyze_structure;

/// Parameters for `analyze_usage`.
#[derive(Clone, Debug, Default)]
pub struct UsageRequest {
    /// Analysis window; the configured default when omitted.
    pub window: Option<TimeWindow>,
    pub category_filter: Option<String>,
    /// Also emit all-zero snapshots for items without events.
    pub include_inactive: bool,
}

impl UsageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_filter = Some(category.into());
        self
    }

    pub fn with_inactive(mut self, include_inactive: bool) -> Self {
        self.include_inactive = include_inactive;
        self
    }
}

/// Parameters for `get_recommendations`.
#[derive(Clone, Debug, Default)]
pub struct RecommendationRequest {
    pub window: Option<TimeWindow>,
    pub category_filter: Option<String>,
    /// Rule families to run; `None` or an empty set means all of them.
    pub rule_families: Option<BTreeSet<RuleFamily>>,
    /// Merge structural defects into the report. On unless switched off.
    pub include_structure: Option<bool>,
}

impl RecommendationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_filter = Some(category.into());
        self
    }

    pub fn with_families(mut self, families: impl IntoIterator<Item = RuleFamily>) -> Self {
        self.rule_families = Some(families.into_iter().collect());
        self
    }

    pub fn with_structure(mut self, include_structure: bool) -> Self {
        self.include_structure = Some(include_structure);
        self
    }

    fn families(&self) -> BTreeSet<RuleFamily> {
        match &self.rule_families {
            Some(families) if !families.is_empty() => families.clone(),
            _ => RuleFamily::ALL.into_iter().collect(),
        }
    }
}

/// Parameters for `analyze_structure`.
#[derive(Clone, Debug, Default)]
pub struct StructureRequest {
    pub include_inactive: bool,
}

impl StructureRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inactive(mut self, include_inactive: bool) -> Self {
        self.include_inactive = include_inactive;
        self
    }
}

/// The analytics engine facade handed to the tool layer.
pub struct CatalogAnalyzer {
    gateway: Arc<dyn CatalogGateway>,
    config: AnalysisConfig,
}

impl CatalogAnalyzer {
    /// Build an analyzer, validating the configuration up front so invalid
    /// thresholds fail before any run starts.
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        config: AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { gateway, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compute per-item usage snapshots for the requested window.
    pub async fn analyze_usage(
        &self,
        request: UsageRequest,
    ) -> AnalysisOutcome<Vec<UsageMetricSnapshot>> {
        let run_id = Uuid::new_v4();
        let window = self.resolve_window(request.window);
        info!(%run_id, window = ?window, "analyze_usage starting");

        let category = request.category_filter.as_deref();
        let fetched = tokio::join!(
            self.bounded("catalog items", self.gateway.fetch_items(category, request.include_inactive)),
            self.bounded("order events", self.gateway.fetch_order_events(&window, category)),
        );
        let (items, events) = match fetched {
            (Ok(items), Ok(events)) => (items, events),
            (Err(error), _) | (_, Err(error)) => return fail(run_id, error),
        };

        let item_index = index_items(&items);
        let (snapshots, warnings) =
            aggregate_usage(&events, &item_index, &window, request.include_inactive);

        let message = if events.is_empty() {
            "No catalog activity in the requested window".to_string()
        } else {
            format!("Computed usage metrics for {} catalog items", snapshots.len())
        };
        info!(%run_id, snapshots = snapshots.len(), warnings = warnings.len(), "analyze_usage complete");
        AnalysisOutcome::ok(message, snapshots, warnings)
    }

    /// Produce the merged, ordered recommendation report.
    pub async fn get_recommendations(
        &self,
        request: RecommendationRequest,
    ) -> AnalysisOutcome<CatalogReport> {
        let run_id = Uuid::new_v4();
        let window = self.resolve_window(request.window);
        let families = request.families();
        let include_structure = request.include_structure.unwrap_or(true);
        info!(%run_id, families = families.len(), include_structure, "get_recommendations starting");

        let category = request.category_filter.as_deref();
        // Inactive records stay in scope here: the inactive-items rule needs
        // to see them even though structural checks run on the live catalog.
        let fetched = tokio::join!(
            self.bounded("catalog items", self.gateway.fetch_items(category, true)),
            self.bounded("catalog categories", self.gateway.fetch_categories(false)),
            self.bounded("order events", self.gateway.fetch_order_events(&window, category)),
        );
        let (items, categories, events) = match fetched {
            (Ok(items), Ok(categories), Ok(events)) => (items, categories, events),
            (Err(error), _, _) | (_, Err(error), _) | (_, _, Err(error)) => {
                return fail(run_id, error)
            }
        };

        let item_index = index_items(&items);
        let (snapshots, mut warnings) = aggregate_usage(&events, &item_index, &window, false);
        let snapshot_index: HashMap<String, UsageMetricSnapshot> =
            snapshots.into_iter().map(|snapshot| (snapshot.item_id.clone(), snapshot)).collect();

        let population = RulePopulation { items: &items, snapshots: &snapshot_index };
        let rule_recommendations = evaluate_rules(&families, &population, &self.config.rules);

        let structure_recommendations = if include_structure {
            let active_items: Vec<CatalogItem> =
                items.iter().filter(|item| item.active).cloned().collect();
            let (found, structure_warnings) =
                analyze_structure(&categories, &active_items, &self.config.structure);
            warnings.extend(structure_warnings);
            found
        } else {
            Vec::new()
        };

        let mut requested_kinds: BTreeSet<RecommendationKind> =
            families.iter().map(RuleFamily::kind).collect();
        if include_structure {
            requested_kinds.extend(STRUCTURAL_KINDS);
        }

        let report = assemble(rule_recommendations, structure_recommendations, Some(&requested_kinds));
        let message = if items.is_empty() {
            "The catalog has no items in scope; nothing to recommend".to_string()
        } else {
            format!("Found {} optimization recommendations", report.total)
        };
        info!(%run_id, total = report.total, warnings = warnings.len(), "get_recommendations complete");
        AnalysisOutcome::ok(message, report, warnings)
    }

    /// Inspect the category tree and item set for structural defects.
    pub async fn analyze_structure(
        &self,
        request: StructureRequest,
    ) -> AnalysisOutcome<Vec<Recommendation>> {
        let run_id = Uuid::new_v4();
        info!(%run_id, include_inactive = request.include_inactive, "analyze_structure starting");

        let fetched = tokio::join!(
            self.bounded("catalog categories", self.gateway.fetch_categories(request.include_inactive)),
            self.bounded("catalog items", self.gateway.fetch_items(None, request.include_inactive)),
        );
        let (categories, items) = match fetched {
            (Ok(categories), Ok(items)) => (categories, items),
            (Err(error), _) | (_, Err(error)) => return fail(run_id, error),
        };

        let (mut recommendations, warnings) =
            analyze_structure(&categories, &items, &self.config.structure);
        recommendations.sort_by(Recommendation::report_ordering);

        let message = if categories.is_empty() && items.is_empty() {
            "The catalog is empty; no structure to analyze".to_string()
        } else {
            format!("Found {} structural findings", recommendations.len())
        };
        info!(%run_id, findings = recommendations.len(), "analyze_structure complete");
        AnalysisOutcome::ok(message, recommendations, warnings)
    }

    fn resolve_window(&self, requested: Option<TimeWindow>) -> ResolvedWindow {
        requested.unwrap_or(self.config.default_window).resolve(Utc::now())
    }

    /// Wrap one gateway fetch in the configured timeout. A timeout or error
    /// on a whole fetch is fatal for the operation; everything downstream is
    /// pure computation with no further failure points.
    async fn bounded<T>(
        &self,
        what: &'static str,
        fetch: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, AnalysisError> {
        let timeout_secs = self.config.gateway_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(timeout_secs), fetch).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(AnalysisError::Gateway(error)),
            Err(_) => Err(AnalysisError::GatewayTimeout { what, timeout_secs }),
        }
    }
}

const STRUCTURAL_KINDS: [RecommendationKind; 6] = [
    RecommendationKind::TooFewItems,
    RecommendationKind::TooManyItems,
    RecommendationKind::DeepNesting,
    RecommendationKind::NamingInconsistency,
    RecommendationKind::PossibleDuplicate,
    RecommendationKind::OrphanedCategory,
];

fn index_items(items: &[CatalogItem]) -> HashMap<String, CatalogItem> {
    items.iter().map(|item| (item.sys_id.clone(), item.clone())).collect()
}

fn fail<T>(run_id: Uuid, error: AnalysisError) -> AnalysisOutcome<T> {
    warn!(%run_id, %error, "analysis run failed");
    AnalysisOutcome::failed(error.to_string())
}
