//! Catalens MCP Server Binary
//!
//! This is the entry point for running the Catalens MCP server.
//!
//! ## Usage
//!
//! ```bash
//! # Run against the default ./snapshot directory
//! catalens-mcp
//!
//! # Run against a specific record snapshot
//! CATALENS_SNAPSHOT_DIR=/data/catalog-export catalens-mcp
//!
//! # Run with explicit threshold configuration
//! CATALENS_CONFIG=/etc/catalens.toml catalens-mcp
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use catalens_core::{AnalysisConfig, CatalogAnalyzer, LoadOptions};
use catalens_mcp::{load_snapshot, CatalensMcpServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Catalens MCP Server");

    let config_path = std::env::var("CATALENS_CONFIG").ok().map(PathBuf::from);
    let config = AnalysisConfig::load(LoadOptions { config_path })?;

    let snapshot_dir =
        std::env::var("CATALENS_SNAPSHOT_DIR").unwrap_or_else(|_| "snapshot".to_string());
    info!("Loading record snapshot from: {}", snapshot_dir);
    let gateway = load_snapshot(PathBuf::from(snapshot_dir).as_path())?;

    let analyzer = CatalogAnalyzer::new(Arc::new(gateway), config)?;

    // Run MCP server
    CatalensMcpServer::new(analyzer).run_stdio().await?;

    Ok(())
}
