use log::info;

use super::CheckpointStore;
use crate::{Result, TrainErr, params::ParamStore, training::TrainingState};

/// Keeps the checkpoint slot holding the parameters with the best validation loss.
#[derive(Debug, Clone)]
pub struct CheckpointPolicy {
    store: CheckpointStore,
    saved: bool,
}

impl CheckpointPolicy {
    pub fn new(store: CheckpointStore) -> Self {
        Self {
            store,
            saved: false,
        }
    }

    /// Records a validation loss, saving `params` if it improved on the best one.
    ///
    /// # Arguments
    /// * `state` - The run's state, whose best loss and last improvement get updated.
    /// * `loss` - The validation loss.
    /// * `params` - The parameters that produced `loss`.
    ///
    /// # Returns
    /// Whether the loss improved, or an error if saving failed.
    pub fn observe(
        &mut self,
        state: &mut TrainingState,
        loss: f32,
        params: &ParamStore,
    ) -> Result<bool> {
        if !state.improve(loss) {
            return Ok(false);
        }

        self.store.save(params, state)?;
        self.saved = true;
        info!(
            total_batch = state.total_batch, best_loss = loss;
            "saved checkpoint to {}",
            self.store.path().display()
        );

        Ok(true)
    }

    /// Loads the best checkpoint into `params`.
    ///
    /// # Returns
    /// The state stored with it, or `NoCheckpoint` if validation never improved.
    pub fn reload(&self, params: &mut ParamStore) -> Result<TrainingState> {
        if !self.saved {
            return Err(TrainErr::NoCheckpoint {
                path: self.store.path().to_path_buf(),
            });
        }

        self.store.load(params)
    }
}
