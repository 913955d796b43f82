use std::sync::Arc;

use chrono::Utc;
use log::warn;

use crate::{flag::FlagScope, FlagSnapshot, FlagStore, Result};

use super::{evaluate_flag, EvaluationContext, EvaluationResult};

pub struct EvaluatorConfig {
    pub flag_store: Arc<FlagStore>,
}

/// Evaluator looks flags up in the currently stored snapshot and evaluates them.
///
/// This is the only place that reads the wall clock: see [`Evaluator::context`].
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Evaluator {
        Evaluator { config }
    }

    /// An empty context stamped with the current time.
    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::new(Utc::now())
    }

    /// Evaluate the flag identified by `(scope, flag_key)`.
    ///
    /// Returns `Ok(None)` when no snapshot has been stored yet or the flag is unknown, and
    /// [`Error::FlagParseError`](crate::Error::FlagParseError) when the flag is present but its
    /// definition could not be parsed.
    pub fn evaluate(
        &self,
        scope: FlagScope,
        flag_key: &str,
        context: &EvaluationContext,
    ) -> Result<Option<EvaluationResult>> {
        let Some(snapshot) = self.get_snapshot() else {
            warn!(target: "propel", flag_key; "evaluating a flag before any flags have been stored");
            return Ok(None);
        };

        match snapshot.get_flag(scope, flag_key) {
            Ok(Some(flag)) => Ok(Some(evaluate_flag(flag, context))),
            Ok(None) => {
                let snapshot_version = self.config.flag_store.version();
                warn!(target: "propel",
                      flag_key,
                      snapshot_version;
                      "evaluating a flag that is not in the snapshot");
                Ok(None)
            }
            Err(err) => {
                warn!(target: "propel", flag_key; "error evaluating a flag: {err}");
                Err(err)
            }
        }
    }

    fn get_snapshot(&self) -> Option<Arc<FlagSnapshot>> {
        self.config.flag_store.get_snapshot()
    }
}
