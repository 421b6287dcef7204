//! Catalens MCP (Model Context Protocol) Server
//!
//! This crate provides an MCP server implementation that lets AI agents run
//! catalog analytics against a record snapshot: usage metrics, optimization
//! recommendations, and structural analysis of the category tree.
//!
//! ## Architecture
//!
//! - `CatalensMcpServer`: Main server implementing the MCP protocol
//! - `snapshot`: Loads exported record data into the in-memory gateway
//! - `tools`: Tool name registry
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use catalens_core::{AnalysisConfig, CatalogAnalyzer, StaticGateway};
//! use catalens_mcp::CatalensMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = Arc::new(StaticGateway::default());
//!     let analyzer = CatalogAnalyzer::new(gateway, AnalysisConfig::default())?;
//!     CatalensMcpServer::new(analyzer).run_stdio().await
//! }
//! ```

mod server;
mod snapshot;
mod tools;

pub use server::{
    AnalyzeStructureInput, AnalyzeUsageInput, CatalensMcpServer, GetRecommendationsInput,
};
pub use snapshot::{load_snapshot, SnapshotError};
pub use tools::{AnalyticsTools, ToolCategory, ALL_TOOL_NAMES, TOTAL_TOOLS};

use thiserror::Error;

/// Errors specific to MCP server operations
#[derive(Error, Debug)]
pub enum McpError {
    #[error("configuration error: {0}")]
    Config(#[from] catalens_core::ConfigError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Validation(_) => -32602, // Invalid params
            McpError::Config(_) => -32600,     // Invalid request
            McpError::Snapshot(_) | McpError::Internal(_) => -32603, // Internal error
        }
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_follow_json_rpc_conventions() {
        assert_eq!(McpError::Validation("bad window".to_string()).error_code(), -32602);
        assert_eq!(McpError::Internal("boom".to_string()).error_code(), -32603);
    }
}
