//! Post-dispatch auditing.

mod evaluator;

pub use evaluator::DispatchEvaluator;
