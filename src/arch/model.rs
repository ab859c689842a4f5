use ndarray::{Array2, ArrayView2};

use crate::{Result, data::Batch, params::ParamStore};

/// A differentiable classifier whose trainable state lives in a `ParamStore`.
///
/// The model keeps whatever it needs from the last `forward` so that `backward` can
/// propagate a delta through it, but it never owns the parameters themselves.
pub trait Model {
    /// Returns the name of the input embedding parameter, the one adversarial attacks perturb.
    fn embedding(&self) -> &str;

    /// Returns the amount of output classes.
    fn num_classes(&self) -> usize;

    /// Sets the additive perturbation applied to every embedded sequence during `forward`,
    /// of shape `(pad_size, embed_dim)`. `None` disables it.
    fn set_delta(&mut self, delta: Option<Array2<f32>>);

    /// Makes a forward pass for training, caching what `backward` needs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `batch` - The batch to classify.
    ///
    /// # Returns
    /// The logits of shape `(batch, num_classes)` or an error if occurred.
    fn forward(&mut self, params: &ParamStore, batch: &Batch) -> Result<Array2<f32>>;

    /// Propagates `d`, the derivative of the loss with respect to the last logits, adding
    /// the parameters' gradients onto the store's accumulators.
    fn backward(&mut self, params: &mut ParamStore, d: ArrayView2<f32>) -> Result<()>;

    /// Makes an inference-only forward pass: nothing is cached and no perturbation is added.
    fn infer(&self, params: &ParamStore, batch: &Batch) -> Result<Array2<f32>>;
}
