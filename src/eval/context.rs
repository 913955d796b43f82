use serde::{Deserialize, Serialize};

use crate::{flag::Timestamp, AttributeValue, Attributes};

/// Attribute name under which the user id is visible to targeting rules.
const USER_ID_ATTRIBUTE: &str = "userId";
/// Attribute name under which the tenant id is visible to targeting rules.
const TENANT_ID_ATTRIBUTE: &str = "tenantId";

/// Everything a single evaluation needs to know about the request.
///
/// Nothing is read from ambient state: the evaluation instant, the time zone override and the
/// subject ids are all carried here explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    /// IANA or Windows time zone used instead of the window's own zone.
    #[serde(default)]
    pub time_zone: Option<String>,
    pub now: Timestamp,
}

impl EvaluationContext {
    pub fn new(now: Timestamp) -> Self {
        EvaluationContext {
            user_id: None,
            tenant_id: None,
            attributes: Attributes::new(),
            time_zone: None,
            now,
        }
    }

    /// Set the user id. Unless already set explicitly, it is also exposed to targeting rules as
    /// the `userId` attribute.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        self.attributes
            .entry(USER_ID_ATTRIBUTE.to_owned())
            .or_insert_with(|| AttributeValue::String(user_id.clone()));
        self.user_id = Some(user_id);
        self
    }

    /// Set the tenant id, also exposed as the `tenantId` attribute.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        self.attributes
            .entry(TENANT_ID_ATTRIBUTE.to_owned())
            .or_insert_with(|| AttributeValue::String(tenant_id.clone()));
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Subject used for variation selection: the user if known, otherwise the tenant.
    pub(crate) fn variation_subject(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or(self.tenant_id.as_deref())
    }
}
