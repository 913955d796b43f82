//! Flag definitions and the value objects that make up their evaluation configuration.
mod access;
mod models;
mod modes;
mod rules;
mod schedule;
mod variations;
mod window;
mod windows_zones;

pub mod management;

pub use access::{AccessControl, AccessReason, AccessResult, SubjectKind};
pub use models::*;
pub use modes::{EvaluationMode, EvaluationModeSet};
pub use rules::{match_targeting_rules, RuleOperator, RuleValueKind, TargetingRule};
pub use schedule::{ActivationSchedule, ScheduleStatus};
pub use variations::{Variations, VariationValue, OFF_VARIATION, ON_VARIATION};
pub use window::{TimeZoneWindow, WindowStatus};
