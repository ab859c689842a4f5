/// The progress of a training run, threaded explicitly through the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingState {
    /// Batches processed since the start of the run, across every epoch.
    pub total_batch: usize,
    /// The lowest validation loss seen so far.
    pub best_loss: f32,
    /// The value of `total_batch` when `best_loss` was last lowered.
    pub last_improve: usize,
}

impl TrainingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `loss` if it's lower than the best seen so far.
    ///
    /// # Returns
    /// Whether the loss improved.
    pub fn improve(&mut self, loss: f32) -> bool {
        if loss < self.best_loss {
            self.best_loss = loss;
            self.last_improve = self.total_batch;
            return true;
        }

        false
    }

    /// Whether more than `require_improvement` batches went by without improving.
    pub fn stagnated(&self, require_improvement: usize) -> bool {
        self.total_batch.saturating_sub(self.last_improve) > require_improvement
    }
}

impl Default for TrainingState {
    fn default() -> Self {
        Self {
            total_batch: 0,
            best_loss: f32::INFINITY,
            last_improve: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_loss_never_increases() {
        let mut state = TrainingState::new();
        assert!(state.improve(0.9));

        state.total_batch = 100;
        assert!(!state.improve(1.2));
        assert!(!state.improve(f32::NAN));
        assert_eq!(state.best_loss, 0.9);
        assert_eq!(state.last_improve, 0);

        state.total_batch = 200;
        assert!(state.improve(0.5));
        assert_eq!(state.last_improve, 200);
    }

    #[test]
    fn stagnation_is_strictly_beyond_the_patience() {
        let mut state = TrainingState::new();
        state.total_batch = 1000;
        assert!(!state.stagnated(1000));
        state.total_batch = 1001;
        assert!(state.stagnated(1000));
    }
}
