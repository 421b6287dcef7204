use thiserror::Error;

use crate::config::ConfigError;
use crate::gateway::GatewayError;

/// Fatal failures of one top-level analysis operation.
///
/// Data-quality problems never show up here: they are accumulated as
/// warnings and the run continues with the best achievable partial result.
/// Configuration errors are the one category allowed to short-circuit before
/// any computation begins.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("gateway timed out after {timeout_secs}s while fetching {what}")]
    GatewayTimeout { what: &'static str, timeout_secs: u64 },
}
