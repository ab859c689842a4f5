pub mod adversarial;
pub mod arch;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod optimization;
pub mod params;
pub mod training;

pub use error::{Result, TrainErr};
