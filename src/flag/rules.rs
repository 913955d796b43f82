use serde::{Deserialize, Serialize};

use crate::{eval::EvaluationContext, AttributeValue};

/// Comparison applied by a [`TargetingRule`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    /// An operator this version does not recognize. Never matches.
    #[serde(other)]
    Unsupported,
}

/// How rule values and the context attribute are interpreted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleValueKind {
    /// Case-insensitive string comparison (ordinal for `GreaterThan`/`LessThan`).
    #[default]
    String,
    /// Values are parsed as `f64`.
    Numeric,
}

/// `TargetingRule` maps a context attribute predicate to a variation.
///
/// `GreaterThan` and `LessThan` must hold against *every* listed value, not just one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingRule {
    pub attribute: String,
    pub operator: RuleOperator,
    pub values: Vec<String>,
    pub variation: String,
    #[serde(default)]
    pub kind: RuleValueKind,
}

impl TargetingRule {
    pub fn string<I>(
        attribute: impl Into<String>,
        operator: RuleOperator,
        values: I,
        variation: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        TargetingRule {
            attribute: attribute.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            variation: variation.into(),
            kind: RuleValueKind::String,
        }
    }

    pub fn numeric(
        attribute: impl Into<String>,
        operator: RuleOperator,
        values: impl IntoIterator<Item = f64>,
        variation: impl Into<String>,
    ) -> Self {
        TargetingRule {
            attribute: attribute.into(),
            operator,
            values: values.into_iter().map(|v| v.to_string()).collect(),
            variation: variation.into(),
            kind: RuleValueKind::Numeric,
        }
    }

    /// Return `true` if `attribute` satisfies the rule. A missing attribute never matches.
    pub fn matches(&self, attribute: Option<&AttributeValue>) -> bool {
        self.try_matches(attribute).unwrap_or(false)
    }

    /// Returns `None` if the rule cannot be applied (missing or incompatible attribute,
    /// unparseable value, unsupported operator).
    fn try_matches(&self, attribute: Option<&AttributeValue>) -> Option<bool> {
        let attribute = attribute?;
        match self.kind {
            RuleValueKind::String => {
                let value = attribute.to_rule_string()?;
                self.operator.eval_string(&value, &self.values)
            }
            RuleValueKind::Numeric => {
                let value = attribute.to_number()?;
                let values = self
                    .values
                    .iter()
                    .map(|v| v.trim().parse::<f64>().ok())
                    .collect::<Option<Vec<_>>>()?;
                self.operator.eval_numeric(value, &values)
            }
        }
    }
}

impl RuleOperator {
    fn eval_string(self, attribute: &str, values: &[String]) -> Option<bool> {
        let attribute_lower = attribute.to_lowercase();
        let equals_any = || values.iter().any(|v| v.to_lowercase() == attribute_lower);
        let contains_any = || {
            values
                .iter()
                .any(|v| attribute_lower.contains(&v.to_lowercase()))
        };

        Some(match self {
            Self::Equals | Self::In => equals_any(),
            Self::NotEquals | Self::NotIn => !equals_any(),
            Self::Contains => contains_any(),
            Self::NotContains => !contains_any(),
            Self::GreaterThan => values.iter().all(|v| attribute > v.as_str()),
            Self::LessThan => values.iter().all(|v| attribute < v.as_str()),
            Self::Unsupported => return None,
        })
    }

    fn eval_numeric(self, attribute: f64, values: &[f64]) -> Option<bool> {
        let equals_any = || values.iter().any(|v| *v == attribute);

        Some(match self {
            Self::Equals | Self::In | Self::Contains => equals_any(),
            Self::NotEquals | Self::NotIn | Self::NotContains => !equals_any(),
            Self::GreaterThan => values.iter().all(|v| attribute > *v),
            Self::LessThan => values.iter().all(|v| attribute < *v),
            Self::Unsupported => return None,
        })
    }
}

/// Return the first rule, in declaration order, that matches the context.
pub fn match_targeting_rules<'a>(
    rules: &'a [TargetingRule],
    context: &EvaluationContext,
) -> Option<&'a TargetingRule> {
    rules
        .iter()
        .find(|rule| rule.matches(context.attribute(&rule.attribute)))
}
