use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    AccessControl, ActivationSchedule, EvaluationModeSet, TargetingRule, TimeZoneWindow,
    Variations,
};

#[allow(missing_docs)]
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Namespace a flag key is unique within.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagScope {
    /// Shared by every application.
    #[default]
    Global,
    /// Owned by a single application.
    Application,
}

/// A feature flag: identity, descriptive metadata and its evaluation configuration.
///
/// Definitions are produced by a repository or cache and treated as immutable snapshots while
/// being evaluated. Mutations go through the methods in [`management`](super::management), which
/// keep the configuration consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) scope: FlagScope,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub is_permanent: bool,
    #[serde(default)]
    pub expiration_date: Option<Timestamp>,
    #[serde(default)]
    pub(crate) configuration: EvalConfiguration,
}

impl FlagDefinition {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scope(&self) -> FlagScope {
        self.scope
    }

    pub fn configuration(&self) -> &EvalConfiguration {
        &self.configuration
    }
}

/// The evaluation-relevant half of a flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalConfiguration {
    #[serde(default)]
    pub active_evaluation_modes: EvaluationModeSet,
    #[serde(default)]
    pub schedule: ActivationSchedule,
    #[serde(default)]
    pub operational_window: TimeZoneWindow,
    #[serde(default)]
    pub user_access_control: AccessControl,
    #[serde(default)]
    pub tenant_access_control: AccessControl,
    #[serde(default)]
    pub targeting_rules: Vec<TargetingRule>,
    #[serde(default)]
    pub variations: Variations,
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
///
/// This isolates errors in a subtree: if one flag in a snapshot fails to parse, the rest of the
/// flags are still usable.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// Successfully parsed.
    Parsed(T),
    /// Parsing failed.
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

impl<'a, T> From<&'a TryParse<T>> for Option<&'a T> {
    fn from(value: &TryParse<T>) -> Option<&T> {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}
