use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::Timestamp;

/// A UTC date range during which a flag is active.
///
/// `enable_on` is inclusive, `disable_on` is exclusive: at exactly `disable_on` the schedule is
/// already inactive. A schedule without `enable_on` is "unscheduled"; a schedule without
/// `disable_on` never ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ScheduleWire")]
pub struct ActivationSchedule {
    enable_on: Option<Timestamp>,
    disable_on: Option<Timestamp>,
}

/// Outcome of checking a schedule at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ScheduleStatus {
    #[display("No active schedule set")]
    Unscheduled,
    #[display("Scheduled enable date not reached")]
    NotYetEnabled,
    #[display("Scheduled disable date passed")]
    Disabled,
    #[display("Scheduled enable date reached")]
    Active,
}

impl ScheduleStatus {
    pub fn is_active(self) -> bool {
        self == ScheduleStatus::Active
    }
}

impl ActivationSchedule {
    /// The "no schedule" value.
    pub const fn unscheduled() -> Self {
        ActivationSchedule {
            enable_on: None,
            disable_on: None,
        }
    }

    /// Create a schedule enabling at `enable_on` and, optionally, disabling at `disable_on`.
    ///
    /// `enable_on` must lie strictly after `now` and strictly before `disable_on`.
    pub fn create(
        enable_on: Timestamp,
        disable_on: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Self> {
        if enable_on == DateTime::<Utc>::MIN_UTC || enable_on == DateTime::<Utc>::MAX_UTC {
            return Err(Error::invalid_argument(
                "enable_on",
                "enable date must be a real date",
            ));
        }
        if enable_on <= now {
            return Err(Error::invalid_argument(
                "enable_on",
                "enable date must be in the future",
            ));
        }
        Self::new(enable_on, disable_on)
    }

    /// Build a schedule checking ordering only. Used when loading stored flags, whose enable date
    /// may legitimately be in the past by now.
    fn new(enable_on: Timestamp, disable_on: Option<Timestamp>) -> Result<Self> {
        // MAX_UTC is how other stores spell "never disables".
        let disable_on = disable_on.filter(|t| *t != DateTime::<Utc>::MAX_UTC);
        if disable_on.is_some_and(|disable_on| disable_on <= enable_on) {
            return Err(Error::invalid_argument(
                "disable_on",
                "disable date must be after enable date",
            ));
        }
        Ok(ActivationSchedule {
            enable_on: Some(enable_on),
            disable_on,
        })
    }

    pub fn enable_on(&self) -> Option<Timestamp> {
        self.enable_on
    }

    pub fn disable_on(&self) -> Option<Timestamp> {
        self.disable_on
    }

    pub fn is_unscheduled(&self) -> bool {
        self.enable_on.is_none()
    }

    pub fn is_active_at(&self, instant: Timestamp) -> ScheduleStatus {
        let Some(enable_on) = self.enable_on else {
            return ScheduleStatus::Unscheduled;
        };
        if instant < enable_on {
            return ScheduleStatus::NotYetEnabled;
        }
        if self.disable_on.is_some_and(|disable_on| instant >= disable_on) {
            return ScheduleStatus::Disabled;
        }
        ScheduleStatus::Active
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleWire {
    #[serde(default)]
    enable_on: Option<Timestamp>,
    #[serde(default)]
    disable_on: Option<Timestamp>,
}

impl TryFrom<ScheduleWire> for ActivationSchedule {
    type Error = Error;

    fn try_from(wire: ScheduleWire) -> Result<Self> {
        match wire.enable_on {
            Some(enable_on) => ActivationSchedule::new(enable_on, wire.disable_on),
            None => Ok(ActivationSchedule::unscheduled()),
        }
    }
}
