mod context;
mod eval_flag;
mod eval_result;
mod evaluator;

pub use context::EvaluationContext;
pub use eval_flag::evaluate_flag;
pub use eval_result::EvaluationResult;
pub use evaluator::{Evaluator, EvaluatorConfig};
