//! Domain model for catalog analytics.
//!
//! Everything here is a value object owned by the run that created it. Raw
//! records (`CatalogItem`, `CatalogCategory`, `OrderEvent`) come from the data
//! access gateway; derived values (`UsageMetricSnapshot`, `Recommendation`)
//! are produced fresh per analysis run and never mutated afterward.

mod catalog;
mod events;
mod outcome;
mod recommendation;
mod usage;

pub use catalog::{CatalogCategory, CatalogItem};
pub use events::{ApprovalOutcome, OrderEvent, OrderOutcome, ResolvedWindow, TimeWindow};
pub use outcome::{AnalysisOutcome, Warning, WarningKind};
pub use recommendation::{Effort, Impact, Recommendation, RecommendationKind, RuleFamily};
pub use usage::UsageMetricSnapshot;
