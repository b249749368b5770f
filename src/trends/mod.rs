pub mod evaluator;
pub mod rules;

pub use evaluator::{EvaluationSummary, TrendEvaluator};
