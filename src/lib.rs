//! `propel_core` is the evaluation core of the Propel feature-flag platform. It decides, per
//! request, whether a flag is enabled for a given user, tenant and context, and which variation to
//! serve.
//!
//! # Overview
//!
//! A [`FlagDefinition`](flag::FlagDefinition) is produced by a repository or cache this crate does
//! not own. Its [`EvalConfiguration`](flag::EvalConfiguration) combines a set of active
//! [evaluation modes](flag::EvaluationModeSet) with the value objects that implement them: an
//! [activation schedule](flag::ActivationSchedule), an [operational
//! window](flag::TimeZoneWindow), [user and tenant access control](flag::AccessControl),
//! [targeting rules](flag::TargetingRule) and [variations](flag::Variations).
//!
//! [`evaluate_flag`](eval::evaluate_flag) takes a flag and an
//! [`EvaluationContext`](eval::EvaluationContext) and returns an
//! [`EvaluationResult`](eval::EvaluationResult) carrying a human-readable reason. Evaluation is a
//! pure function: the current time, the time zone override and the subject ids all come from the
//! context, and bad request data resolves to a disabled result instead of an error.
//!
//! Rollout buckets and variation picks are derived from an MD5 hash of the subject and flag key
//! (see [`sharder`]), so the same subject always lands in the same bucket, across restarts and
//! across implementations.
//!
//! [`FlagStore`] is a thread-safe holder for the currently active [`FlagSnapshot`]. Whenever flags
//! change, a new snapshot is published under the next version; readers keep using the snapshot
//! they got for the whole operation. [`Evaluator`](eval::Evaluator) looks flags up in the store by scope and key
//! and evaluates them at the current time.
//!
//! Flags are changed through the methods in [`flag::management`], which keep the active modes
//! consistent with the configured gates.
//!
//! ```
//! use chrono::Utc;
//! use propel_core::{
//!     eval::{evaluate_flag, EvaluationContext},
//!     flag::{AccessControl, FlagDefinition, FlagScope, SubjectKind},
//! };
//!
//! let mut flag = FlagDefinition::new("new-checkout", FlagScope::Global, "New checkout")?;
//! flag.set_access_control(
//!     SubjectKind::User,
//!     AccessControl::new(["alice"], Vec::<String>::new(), 0)?,
//! );
//!
//! let context = EvaluationContext::new(Utc::now()).with_user_id("alice");
//! let result = evaluate_flag(&flag, &context);
//! assert!(result.is_enabled);
//! assert_eq!(result.reason, "User explicitly allowed");
//! # Ok::<(), propel_core::Error>(())
//! ```
//!
//! # Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log/latest/log/) facade under the `propel`
//! target, with structured key-values (`flag_key`, `reason`, ...). Misconfiguration that does not
//! stop evaluation, such as an unknown context time zone or an expired flag, is logged at `warn`.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod eval;
pub mod flag;
pub mod flag_store;
pub mod sharder;
pub mod snapshot;

mod attributes;
mod error;

pub use attributes::{AttributeValue, Attributes};
pub use error::{Error, Result};
pub use flag_store::FlagStore;
pub use snapshot::{FlagId, FlagSnapshot};
