use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Estimated business value of acting on a recommendation.
///
/// Variant order matters: `Low < Medium < High`, and the report assembler
/// sorts on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// Estimated cost of acting on a recommendation. Same ordering contract as
/// [`Impact`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// The configurable usage-driven rule families. Closed set: adding a rule
/// means adding a variant and its evaluator in `rules`, not touching a
/// registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    InactiveItems,
    LowUsage,
    HighAbandonment,
    SlowFulfillment,
    DescriptionQuality,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 5] = [
        RuleFamily::InactiveItems,
        RuleFamily::LowUsage,
        RuleFamily::HighAbandonment,
        RuleFamily::SlowFulfillment,
        RuleFamily::DescriptionQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleFamily::InactiveItems => "inactive_items",
            RuleFamily::LowUsage => "low_usage",
            RuleFamily::HighAbandonment => "high_abandonment",
            RuleFamily::SlowFulfillment => "slow_fulfillment",
            RuleFamily::DescriptionQuality => "description_quality",
        }
    }

    pub fn kind(&self) -> RecommendationKind {
        match self {
            RuleFamily::InactiveItems => RecommendationKind::InactiveItems,
            RuleFamily::LowUsage => RecommendationKind::LowUsage,
            RuleFamily::HighAbandonment => RecommendationKind::HighAbandonment,
            RuleFamily::SlowFulfillment => RecommendationKind::SlowFulfillment,
            RuleFamily::DescriptionQuality => RecommendationKind::DescriptionQuality,
        }
    }
}

impl std::str::FromStr for RuleFamily {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inactive_items" => Ok(Self::InactiveItems),
            "low_usage" => Ok(Self::LowUsage),
            "high_abandonment" => Ok(Self::HighAbandonment),
            "slow_fulfillment" => Ok(Self::SlowFulfillment),
            "description_quality" => Ok(Self::DescriptionQuality),
            other => Err(ConfigError::Validation(format!(
                "unknown rule family `{other}` (expected inactive_items|low_usage|high_abandonment|slow_fulfillment|description_quality)"
            ))),
        }
    }
}

/// Tag identifying what a recommendation is about: one of the five rule
/// families, or a structural defect found without usage data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    InactiveItems,
    LowUsage,
    HighAbandonment,
    SlowFulfillment,
    DescriptionQuality,
    TooFewItems,
    TooManyItems,
    DeepNesting,
    NamingInconsistency,
    PossibleDuplicate,
    OrphanedCategory,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::InactiveItems => "inactive_items",
            RecommendationKind::LowUsage => "low_usage",
            RecommendationKind::HighAbandonment => "high_abandonment",
            RecommendationKind::SlowFulfillment => "slow_fulfillment",
            RecommendationKind::DescriptionQuality => "description_quality",
            RecommendationKind::TooFewItems => "too_few_items",
            RecommendationKind::TooManyItems => "too_many_items",
            RecommendationKind::DeepNesting => "deep_nesting",
            RecommendationKind::NamingInconsistency => "naming_inconsistency",
            RecommendationKind::PossibleDuplicate => "possible_duplicate",
            RecommendationKind::OrphanedCategory => "orphaned_category",
        }
    }

    /// Rule family this kind belongs to, if it is usage-driven.
    pub fn rule_family(&self) -> Option<RuleFamily> {
        match self {
            RecommendationKind::InactiveItems => Some(RuleFamily::InactiveItems),
            RecommendationKind::LowUsage => Some(RuleFamily::LowUsage),
            RecommendationKind::HighAbandonment => Some(RuleFamily::HighAbandonment),
            RecommendationKind::SlowFulfillment => Some(RuleFamily::SlowFulfillment),
            RecommendationKind::DescriptionQuality => Some(RuleFamily::DescriptionQuality),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actionable finding, produced by the rules engine or the structure
/// analyzer and consumed once by the report assembler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    /// What the catalog owner should do about it.
    pub action: String,
    pub impact: Impact,
    pub effort: Effort,
    /// Affected item identifiers (category identifiers for structural
    /// defects scoped to categories).
    pub items: Vec<String>,
}

impl Recommendation {
    /// Total order used for the final report: impact descending, effort
    /// ascending, affected count descending, then kind name. Fully
    /// deterministic for a fixed input.
    pub fn report_ordering(&self, other: &Self) -> Ordering {
        other
            .impact
            .cmp(&self.impact)
            .then_with(|| self.effort.cmp(&other.effort))
            .then_with(|| other.items.len().cmp(&self.items.len()))
            .then_with(|| self.kind.as_str().cmp(other.kind.as_str()))
            .then_with(|| self.items.cmp(&other.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(kind: RecommendationKind, impact: Impact, effort: Effort, items: usize) -> Recommendation {
        Recommendation {
            kind,
            title: String::new(),
            description: String::new(),
            action: String::new(),
            impact,
            effort,
            items: (0..items).map(|n| format!("item_{n}")).collect(),
        }
    }

    #[test]
    fn impact_orders_low_to_high() {
        assert!(Impact::Low < Impact::Medium);
        assert!(Impact::Medium < Impact::High);
    }

    #[test]
    fn report_ordering_ranks_impact_before_effort() {
        let high = rec(RecommendationKind::HighAbandonment, Impact::High, Effort::High, 1);
        let low = rec(RecommendationKind::DescriptionQuality, Impact::Low, Effort::Low, 9);
        assert_eq!(high.report_ordering(&low), Ordering::Less);
    }

    #[test]
    fn report_ordering_breaks_ties_on_effort_then_count_then_kind() {
        let cheap = rec(RecommendationKind::LowUsage, Impact::Medium, Effort::Low, 1);
        let costly = rec(RecommendationKind::TooManyItems, Impact::Medium, Effort::Medium, 5);
        assert_eq!(cheap.report_ordering(&costly), Ordering::Less);

        let wide = rec(RecommendationKind::TooManyItems, Impact::Medium, Effort::Medium, 5);
        let narrow = rec(RecommendationKind::LowUsage, Impact::Medium, Effort::Medium, 1);
        assert_eq!(wide.report_ordering(&narrow), Ordering::Less);

        let duplicate = rec(RecommendationKind::PossibleDuplicate, Impact::Medium, Effort::Medium, 2);
        let too_many = rec(RecommendationKind::TooManyItems, Impact::Medium, Effort::Medium, 2);
        assert_eq!(duplicate.report_ordering(&too_many), Ordering::Less);
    }

    #[test]
    fn unknown_rule_family_name_is_a_config_error() {
        let error = "usage_spike".parse::<RuleFamily>().unwrap_err();
        assert!(error.to_string().contains("usage_spike"));
    }
}
