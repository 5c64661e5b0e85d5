pub mod decision;
pub mod task;

pub use task::{Evaluator, run_evaluator};
