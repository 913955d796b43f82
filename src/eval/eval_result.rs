use serde::{Deserialize, Serialize};

/// Outcome of evaluating one flag for one context.
///
/// `reason` is a stable, human-readable explanation of the decision and is part of the public
/// contract: callers surface it in logs and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub is_enabled: bool,
    pub reason: String,
    /// Name of the served variation. Disabled results carry the default variation.
    pub variation: String,
}

impl EvaluationResult {
    pub(crate) fn enabled(reason: impl Into<String>, variation: impl Into<String>) -> Self {
        EvaluationResult {
            is_enabled: true,
            reason: reason.into(),
            variation: variation.into(),
        }
    }

    pub(crate) fn disabled(reason: impl Into<String>, variation: impl Into<String>) -> Self {
        EvaluationResult {
            is_enabled: false,
            reason: reason.into(),
            variation: variation.into(),
        }
    }
}
