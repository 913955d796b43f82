use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    sharder::{Md5Sharder, Sharder},
    Error, Result,
};

const ROLLOUT_BUCKETS: u64 = 100;

/// Kind of subject an [`AccessControl`] applies to. Only affects reason strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectKind {
    #[display("User")]
    User,
    #[display("Tenant")]
    Tenant,
}

impl SubjectKind {
    fn plural(self) -> &'static str {
        match self {
            SubjectKind::User => "users",
            SubjectKind::Tenant => "tenants",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Denied,
}

/// Why [`AccessControl::evaluate_access`] reached its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AccessReason {
    #[display("{_0} ID is required")]
    MissingSubjectId(SubjectKind),
    #[display("{_0} explicitly blocked")]
    ExplicitlyBlocked(SubjectKind),
    #[display("{_0} explicitly allowed")]
    ExplicitlyAllowed(SubjectKind),
    #[display("Access restricted to all {}", _0.plural())]
    Restricted(SubjectKind),
    #[display("Access unrestricted to all {}", _0.plural())]
    Unrestricted(SubjectKind),
    #[display("{kind} in rollout: bucket {bucket} < {percentage}%")]
    InRollout {
        kind: SubjectKind,
        bucket: u64,
        percentage: u8,
    },
    #[display("{kind} not in rollout: bucket {bucket} >= {percentage}%")]
    NotInRollout {
        kind: SubjectKind,
        bucket: u64,
        percentage: u8,
    },
}

/// Allow/block lists plus a percentage rollout for one kind of subject.
///
/// Subject ids compare case-insensitively. An id is never in both lists at once; every mutator
/// returns a new value, so moving an id from one list to the other happens in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AccessControlWire")]
pub struct AccessControl {
    allowed: Vec<String>,
    blocked: Vec<String>,
    rollout_percentage: u8,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl AccessControl {
    /// Empty lists and a 100% rollout.
    pub fn unrestricted() -> Self {
        AccessControl {
            allowed: Vec::new(),
            blocked: Vec::new(),
            rollout_percentage: 100,
        }
    }

    /// Validate and normalize lists and percentage.
    ///
    /// Blank ids are dropped and duplicates (ignoring case) are collapsed. Fails if
    /// `rollout_percentage` is outside `0..=100` or if an id is both allowed and blocked.
    pub fn new<A, B>(allowed: A, blocked: B, rollout_percentage: i32) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        let rollout_percentage = u8::try_from(rollout_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "rollout_percentage",
                    format!("must be between 0 and 100, got {rollout_percentage}"),
                )
            })?;

        let allowed = normalize_ids(allowed);
        let blocked = normalize_ids(blocked);
        if let Some(conflict) = allowed.iter().find(|id| contains_id(&blocked, id)) {
            return Err(Error::invalid_argument(
                "blocked",
                format!("`{conflict}` cannot be both allowed and blocked"),
            ));
        }

        Ok(AccessControl {
            allowed,
            blocked,
            rollout_percentage,
        })
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    pub fn rollout_percentage(&self) -> u8 {
        self.rollout_percentage
    }

    pub fn has_subject_lists(&self) -> bool {
        !self.allowed.is_empty() || !self.blocked.is_empty()
    }

    pub fn is_unrestricted(&self) -> bool {
        !self.has_subject_lists() && self.rollout_percentage == 100
    }

    /// Return a copy with `subject_id` allowed (and no longer blocked).
    pub fn with_allowed_subject(&self, subject_id: &str) -> Self {
        let mut access = self.clone();
        if is_blank(subject_id) {
            return access;
        }
        access.blocked.retain(|id| !eq_ignore_case(id, subject_id));
        if !contains_id(&access.allowed, subject_id) {
            access.allowed.push(subject_id.to_owned());
        }
        access
    }

    /// Return a copy with `subject_id` blocked (and no longer allowed).
    pub fn with_blocked_subject(&self, subject_id: &str) -> Self {
        let mut access = self.clone();
        if is_blank(subject_id) {
            return access;
        }
        access.allowed.retain(|id| !eq_ignore_case(id, subject_id));
        if !contains_id(&access.blocked, subject_id) {
            access.blocked.push(subject_id.to_owned());
        }
        access
    }

    /// Return a copy with `subject_id` removed from both lists.
    pub fn without_subject(&self, subject_id: &str) -> Self {
        let mut access = self.clone();
        access.allowed.retain(|id| !eq_ignore_case(id, subject_id));
        access.blocked.retain(|id| !eq_ignore_case(id, subject_id));
        access
    }

    pub fn with_rollout_percentage(&self, rollout_percentage: i32) -> Result<Self> {
        AccessControl::new(
            self.allowed.iter().cloned(),
            self.blocked.iter().cloned(),
            rollout_percentage,
        )
    }

    /// Decide whether `subject_id` gets access to `flag_key`.
    ///
    /// Checked in order: missing id, blocked, allowed, 0%, 100%, then the rollout bucket. The
    /// bucket is salted with the flag key, so the same subject lands independently in each
    /// flag's rollout, and raising the percentage never removes a subject already included.
    pub fn evaluate_access(
        &self,
        kind: SubjectKind,
        subject_id: Option<&str>,
        flag_key: &str,
    ) -> (AccessResult, AccessReason) {
        let subject_id = match subject_id {
            Some(id) if !is_blank(id) => id,
            _ => return (AccessResult::Denied, AccessReason::MissingSubjectId(kind)),
        };

        if contains_id(&self.blocked, subject_id) {
            return (AccessResult::Denied, AccessReason::ExplicitlyBlocked(kind));
        }
        if contains_id(&self.allowed, subject_id) {
            return (AccessResult::Allowed, AccessReason::ExplicitlyAllowed(kind));
        }

        match self.rollout_percentage {
            0 => (AccessResult::Denied, AccessReason::Restricted(kind)),
            100 => (AccessResult::Allowed, AccessReason::Unrestricted(kind)),
            percentage => {
                let bucket = rollout_bucket(subject_id, flag_key);
                if bucket < u64::from(percentage) {
                    (
                        AccessResult::Allowed,
                        AccessReason::InRollout {
                            kind,
                            bucket,
                            percentage,
                        },
                    )
                } else {
                    (
                        AccessResult::Denied,
                        AccessReason::NotInRollout {
                            kind,
                            bucket,
                            percentage,
                        },
                    )
                }
            }
        }
    }
}

/// Bucket in `0..100` for `subject_id` under `flag_key`.
fn rollout_bucket(subject_id: &str, flag_key: &str) -> u64 {
    Md5Sharder.get_shard(&[subject_id, flag_key], ROLLOUT_BUCKETS)
}

fn is_blank(id: &str) -> bool {
    id.trim().is_empty()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

fn contains_id(ids: &[String], subject_id: &str) -> bool {
    ids.iter().any(|id| eq_ignore_case(id, subject_id))
}

fn normalize_ids<I>(ids: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut normalized: Vec<String> = Vec::new();
    for id in ids {
        let id = id.into();
        if !is_blank(&id) && !contains_id(&normalized, &id) {
            normalized.push(id);
        }
    }
    normalized
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessControlWire {
    #[serde(default)]
    allowed: Vec<String>,
    #[serde(default)]
    blocked: Vec<String>,
    #[serde(default = "full_rollout")]
    rollout_percentage: i32,
}

fn full_rollout() -> i32 {
    100
}

impl TryFrom<AccessControlWire> for AccessControl {
    type Error = Error;

    fn try_from(wire: AccessControlWire) -> Result<Self> {
        AccessControl::new(wire.allowed, wire.blocked, wire.rollout_percentage)
    }
}
