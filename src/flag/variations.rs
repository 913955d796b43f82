use std::collections::BTreeMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::{
    sharder::{Md5Sharder, Sharder},
    Error, Result,
};

/// Name of the variation served when a boolean flag is enabled.
pub const ON_VARIATION: &str = "on";
/// Name of the variation served when a boolean flag is disabled.
pub const OFF_VARIATION: &str = "off";

/// Value attached to a named variation.
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum VariationValue {
    Boolean(bool),
    Number(f64),
    String(String),
    /// Any other JSON value (objects, arrays, null).
    Json(serde_json::Value),
}

impl From<&str> for VariationValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Named variations of a flag and the variation served by default.
///
/// Names are kept sorted so that variation selection does not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "VariationsWire")]
pub struct Variations {
    values: BTreeMap<String, VariationValue>,
    default_variation: String,
}

impl Default for Variations {
    fn default() -> Self {
        Self::boolean()
    }
}

impl Variations {
    /// The plain on/off shape: `{on: true, off: false}`, defaulting to `off`.
    pub fn boolean() -> Self {
        Variations {
            values: BTreeMap::from([
                (ON_VARIATION.to_owned(), VariationValue::Boolean(true)),
                (OFF_VARIATION.to_owned(), VariationValue::Boolean(false)),
            ]),
            default_variation: OFF_VARIATION.to_owned(),
        }
    }

    /// Fails if `values` is empty or does not contain `default_variation`.
    pub fn new<I, K, V>(values: I, default_variation: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<VariationValue>,
    {
        let values: BTreeMap<String, VariationValue> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let default_variation = default_variation.into();

        if values.is_empty() {
            return Err(Error::invalid_argument(
                "values",
                "at least one variation is required",
            ));
        }
        if !values.contains_key(&default_variation) {
            return Err(Error::invalid_argument(
                "default_variation",
                format!("`{default_variation}` is not one of the variations"),
            ));
        }

        Ok(Variations {
            values,
            default_variation,
        })
    }

    pub fn values(&self) -> &BTreeMap<String, VariationValue> {
        &self.values
    }

    pub fn default_variation(&self) -> &str {
        &self.default_variation
    }

    pub fn value_of(&self, name: &str) -> Option<&VariationValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether this is exactly the plain on/off shape, in which case no selection happens.
    pub fn is_boolean_toggle(&self) -> bool {
        *self == Self::boolean()
    }

    /// Pick a variation for `subject_id`.
    ///
    /// Candidates are every variation except the default. The same flag and subject always get
    /// the same candidate. Falls back to the default when there is no subject or no candidate.
    pub fn select(&self, flag_key: &str, subject_id: Option<&str>) -> &str {
        let subject_id = match subject_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return &self.default_variation,
        };

        let mut candidates = self
            .values
            .keys()
            .filter(|name| **name != self.default_variation);
        let count = candidates.clone().count() as u64;
        if count == 0 {
            return &self.default_variation;
        }

        let index = Md5Sharder.get_shard(&[flag_key, subject_id], count);
        candidates
            .nth(index as usize)
            .map_or(self.default_variation.as_str(), String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariationsWire {
    values: BTreeMap<String, VariationValue>,
    default_variation: String,
}

impl TryFrom<VariationsWire> for Variations {
    type Error = Error;

    fn try_from(wire: VariationsWire) -> Result<Self> {
        Variations::new(wire.values, wire.default_variation)
    }
}
