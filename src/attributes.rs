use std::{borrow::Cow, collections::HashMap};

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Type alias for a HashMap representing key-value pairs of context attributes.
///
/// Keys are strings representing attribute names.
///
/// # Examples
/// ```
/// # use propel_core::{Attributes, AttributeValue};
/// let attributes = [
///     ("age".to_owned(), 30.0.into()),
///     ("is_premium_member".to_owned(), true.into()),
///     ("country".to_owned(), "NZ".into()),
/// ].into_iter().collect::<Attributes>();
/// ```
pub type Attributes = HashMap<String, AttributeValue>;

/// Enum representing possible values of a context attribute.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, and `bool` types.
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null value or absence of value.
    Null,
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        if let AttributeValue::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// String form used by string targeting rules. Numbers and booleans are rendered the way
    /// they would be typed into a rule (`25`, `true`); null has no string form.
    pub(crate) fn to_rule_string(&self) -> Option<Cow<'_, str>> {
        match self {
            AttributeValue::String(s) => Some(Cow::Borrowed(s)),
            AttributeValue::Number(n) => Some(Cow::Owned(n.to_string())),
            AttributeValue::Boolean(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            AttributeValue::Null => None,
        }
    }

    /// Numeric form used by numeric targeting rules. Strings are parsed leniently (surrounding
    /// whitespace is ignored).
    pub(crate) fn to_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Boolean(_) | AttributeValue::Null => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeValue;

    #[test]
    fn rule_string_forms() {
        assert_eq!(
            AttributeValue::from(25.0).to_rule_string().as_deref(),
            Some("25")
        );
        assert_eq!(
            AttributeValue::from(2.5).to_rule_string().as_deref(),
            Some("2.5")
        );
        assert_eq!(
            AttributeValue::from(true).to_rule_string().as_deref(),
            Some("true")
        );
        assert_eq!(AttributeValue::Null.to_rule_string(), None);
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(AttributeValue::from(" 42 ").to_number(), Some(42.0));
        assert_eq!(AttributeValue::from(7_i64).to_number(), Some(7.0));
        assert_eq!(AttributeValue::from("abc").to_number(), None);
        assert_eq!(AttributeValue::from(false).to_number(), None);
    }

    #[test]
    fn deserializes_untagged() {
        let v: AttributeValue = serde_json::from_str("\"US\"").unwrap();
        assert_eq!(v, AttributeValue::String("US".into()));
        let v: AttributeValue = serde_json::from_str("18").unwrap();
        assert_eq!(v, AttributeValue::Number(18.0));
        let v: AttributeValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, AttributeValue::Null);
    }
}
