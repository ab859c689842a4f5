pub mod activations;
mod classifier;
pub mod init;
pub mod layers;
pub mod loss;
mod model;

pub use classifier::{EMBEDDING, TextClassifier};
pub use model::Model;
