use ndarray::{Array2, ArrayView2};

use crate::Result;

/// A classification loss over raw logits and integer labels.
pub trait LossFn {
    /// Returns the mean loss of the batch.
    fn loss(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Result<f32>;

    /// Returns the derivative of `loss` with respect to each logit.
    fn loss_prime(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Result<Array2<f32>>;
}
