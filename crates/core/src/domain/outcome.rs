use serde::{Deserialize, Serialize};

/// Classification of a non-fatal data-quality finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// An event referenced an item the gateway could not resolve.
    OrphanedItem,
    /// A category's parent reference points at a missing or excluded record.
    OrphanedCategory,
    /// A parent chain loops back on itself.
    CategoryCycle,
    /// A record lacked a field needed for one rule instance.
    MissingData,
}

/// A non-fatal finding accumulated during a run. Warnings never abort the
/// analysis; they ride along in the result envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Result envelope returned by every top-level operation.
///
/// A run succeeds with partial data and warnings unless the gateway was
/// entirely unreachable; only then is `success` false and `payload` empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl<T> AnalysisOutcome<T> {
    pub fn ok(message: impl Into<String>, payload: T, warnings: Vec<Warning>) -> Self {
        Self { success: true, message: message.into(), payload: Some(payload), warnings }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), payload: None, warnings: Vec::new() }
    }
}
