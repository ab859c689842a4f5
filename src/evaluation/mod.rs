mod confusion;
mod evaluator;
mod report;

pub use confusion::ConfusionMatrix;
pub use evaluator::{Evaluation, Evaluator, argmax};
pub use report::{ClassMetrics, ClassificationReport};
