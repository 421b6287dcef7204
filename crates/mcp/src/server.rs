//! MCP Server Implementation
//!
//! Implements the Model Context Protocol server for Catalens.

use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::*,
    schemars::{self, JsonSchema},
    serde::{Deserialize, Serialize},
    tool, ServiceExt,
};
use tracing::{debug, info};

use catalens_core::{
    CatalogAnalyzer, RecommendationRequest, RuleFamily, StructureRequest, TimeWindow,
    UsageRequest,
};

/// Main MCP server for Catalens
#[derive(Clone)]
pub struct CatalensMcpServer {
    analyzer: Arc<CatalogAnalyzer>,
}

impl CatalensMcpServer {
    /// Create a new MCP server around a configured analyzer
    pub fn new(analyzer: CatalogAnalyzer) -> Self {
        Self { analyzer: Arc::new(analyzer) }
    }

    /// Run the server with stdio transport
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        use tokio::io::{stdin, stdout};

        info!("Starting MCP server with stdio transport");

        let service = self.serve((stdin(), stdout())).await?;

        // Wait for shutdown
        let _quit = service.waiting().await?;

        info!("MCP server shutdown complete");
        Ok(())
    }
}

// Implement ServerHandler trait for MCP protocol
#[tool(tool_box)]
impl ServerHandler for CatalensMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                logging: Some(JsonObject::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "catalens-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Catalens MCP Server - service catalog analytics for AI agents. \
                 Compute usage metrics, get optimization recommendations, and \
                 analyze the catalog category structure."
                    .to_string(),
            ),
        }
    }
}

// ============================================================================
// Usage Analytics Tool
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeUsageInput {
    #[schemars(
        description = "Analysis window: last_7_days, last_30_days, last_90_days, or last_year",
        default = "default_window"
    )]
    #[serde(default = "default_window")]
    pub time_window: String,

    #[schemars(description = "Restrict the analysis to one category ID")]
    #[serde(default)]
    pub category: Option<String>,

    #[schemars(description = "Also emit all-zero snapshots for items without events")]
    #[serde(default)]
    pub include_inactive: bool,
}

// ============================================================================
// Recommendation Tool
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetRecommendationsInput {
    #[schemars(description = "Restrict the analysis to one category ID")]
    #[serde(default)]
    pub category: Option<String>,

    #[schemars(
        description = "Rule families to run: inactive_items, low_usage, high_abandonment, slow_fulfillment, description_quality. Empty means all."
    )]
    #[serde(default)]
    pub recommendation_types: Vec<String>,

    #[schemars(description = "Merge structural defects into the report", default = "default_true")]
    #[serde(default = "default_true")]
    pub include_structure: bool,
}

// ============================================================================
// Structure Analysis Tool
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeStructureInput {
    #[schemars(description = "Include inactive categories and items in the analysis")]
    #[serde(default)]
    pub include_inactive: bool,
}

#[tool(tool_box)]
impl CatalensMcpServer {
    /// Compute per-item usage metrics for a time window
    #[tool(
        name = "analyze_usage",
        description = "Compute per-item order, abandonment, fulfillment, and approval metrics for a time window"
    )]
    async fn analyze_usage(
        &self,
        #[tool(aggr)] input: AnalyzeUsageInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(time_window = %input.time_window, "analyze_usage called");

        let window: TimeWindow = input
            .time_window
            .parse()
            .map_err(|e: catalens_core::ConfigError| rmcp::Error::invalid_params(e.to_string(), None))?;

        let mut request = UsageRequest::new()
            .with_window(window)
            .with_inactive(input.include_inactive);
        if let Some(category) = input.category {
            request = request.with_category(category);
        }

        let outcome = self.analyzer.analyze_usage(request).await;
        render(&outcome)
    }

    /// Produce the ranked optimization recommendation report
    #[tool(
        name = "get_recommendations",
        description = "Get ranked catalog optimization recommendations with per-family counts"
    )]
    async fn get_recommendations(
        &self,
        #[tool(aggr)] input: GetRecommendationsInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(families = input.recommendation_types.len(), "get_recommendations called");

        let mut families = Vec::with_capacity(input.recommendation_types.len());
        for name in &input.recommendation_types {
            let family: RuleFamily = name
                .parse()
                .map_err(|e: catalens_core::ConfigError| rmcp::Error::invalid_params(e.to_string(), None))?;
            families.push(family);
        }

        let mut request = RecommendationRequest::new()
            .with_families(families)
            .with_structure(input.include_structure);
        if let Some(category) = input.category {
            request = request.with_category(category);
        }

        let outcome = self.analyzer.get_recommendations(request).await;
        render(&outcome)
    }

    /// Inspect the category tree for structural defects
    #[tool(
        name = "analyze_structure",
        description = "Analyze the catalog category tree for imbalance, deep nesting, naming drift, duplicates, and orphans"
    )]
    async fn analyze_structure(
        &self,
        #[tool(aggr)] input: AnalyzeStructureInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(include_inactive = input.include_inactive, "analyze_structure called");

        let request = StructureRequest::new().with_inactive(input.include_inactive);
        let outcome = self.analyzer.analyze_structure(request).await;
        render(&outcome)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn render<T: serde::Serialize>(outcome: &T) -> Result<CallToolResult, rmcp::Error> {
    let content = serde_json::to_string_pretty(outcome)
        .map_err(|e| rmcp::Error::internal_error(e.to_string(), None))?;

    Ok(CallToolResult {
        content: vec![Content::text(content)],
        is_error: Some(false),
    })
}

fn default_window() -> String {
    "last_90_days".to_string()
}

fn default_true() -> bool {
    true
}
