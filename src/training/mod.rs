mod builder;
mod counters;
mod learner;
mod state;
mod trainer;

pub use builder::{ClassifierTrainer, TrainerBuilder};
pub use counters::PassCounters;
pub use learner::{Grads, Learner};
pub use state::TrainingState;
pub use trainer::{TrainSettings, Trainer};
