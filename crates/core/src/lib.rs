//! Catalens core: the catalog optimization analytics and recommendation
//! engine.
//!
//! The engine turns read-only catalog snapshots and order telemetry into a
//! ranked set of actionable recommendations. It is a stateless batch
//! computation: each run owns its derived values and nothing persists between
//! invocations. Record transport and credentials live behind the
//! [`gateway::CatalogGateway`] contract and are not implemented here.

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod metrics;
pub mod report;
pub mod rules;
pub mod structure;

pub use analyzer::{CatalogAnalyzer, RecommendationRequest, StructureRequest, UsageRequest};
pub use config::{AnalysisConfig, ConfigError, LoadOptions, NamingStyle, RuleThresholds, StructureThresholds};
pub use domain::{
    AnalysisOutcome, ApprovalOutcome, CatalogCategory, CatalogItem, Effort, Impact, OrderEvent,
    OrderOutcome, Recommendation, RecommendationKind, ResolvedWindow, RuleFamily, TimeWindow,
    UsageMetricSnapshot, Warning, WarningKind,
};
pub use errors::AnalysisError;
pub use gateway::{CatalogGateway, GatewayError, StaticGateway};
pub use report::CatalogReport;
