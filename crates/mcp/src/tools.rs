//! MCP Tools for Catalens
//!
//! One category today: catalog analytics. The registry keeps tool names in a
//! single place so docs and clients stay in sync with the server surface.

/// Analytics tools category
pub struct AnalyticsTools;

/// Tool category trait
pub trait ToolCategory {
    /// Category name
    fn category_name() -> &'static str
    where
        Self: Sized;
    /// List of tool names in this category
    fn tool_names() -> &'static [&'static str]
    where
        Self: Sized;
}

impl ToolCategory for AnalyticsTools {
    fn category_name() -> &'static str {
        "analytics"
    }
    fn tool_names() -> &'static [&'static str] {
        &["analyze_usage", "get_recommendations", "analyze_structure"]
    }
}

/// All tool names
pub const ALL_TOOL_NAMES: &[&str] =
    &["analyze_usage", "get_recommendations", "analyze_structure"];

/// Total number of tools
pub const TOTAL_TOOLS: usize = ALL_TOOL_NAMES.len();
