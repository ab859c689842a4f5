use ndarray::Array2;

use super::PassCounters;
use crate::{
    Result,
    arch::{Model, loss::LossFn},
    data::Batch,
    optimization::Optimizer,
    params::ParamStore,
};

/// Whether a pass clears the gradient accumulators before its backward pass or adds onto
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grads {
    Zero,
    Accumulate,
}

/// A model together with its parameters, their optimizers and the loss it's trained on.
pub struct Learner<M, O, L>
where
    M: Model,
    O: Optimizer + Send,
    L: LossFn,
{
    model: M,
    params: ParamStore,
    optimizers: Vec<O>,
    loss_fn: L,
    counters: PassCounters,
}

impl<M, O, L> Learner<M, O, L>
where
    M: Model,
    O: Optimizer + Send,
    L: LossFn,
{
    /// Creates a new `Learner`.
    ///
    /// # Arguments
    /// * `model` - The model to train.
    /// * `params` - The model's parameters.
    /// * `optimizers` - One optimizer per parameter, in registration order.
    /// * `loss_fn` - The training loss.
    pub fn new(model: M, params: ParamStore, optimizers: Vec<O>, loss_fn: L) -> Self {
        Self {
            model,
            params,
            optimizers,
            loss_fn,
            counters: PassCounters::default(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    pub fn counters(&self) -> PassCounters {
        self.counters
    }

    /// Makes a forward and a backward pass over `batch`.
    ///
    /// # Arguments
    /// * `batch` - The batch to learn from.
    /// * `grads` - Whether to clear the gradients first or accumulate onto them.
    ///
    /// # Returns
    /// The batch loss and the logits of the forward pass.
    pub fn pass(&mut self, batch: &Batch, grads: Grads) -> Result<(f32, Array2<f32>)> {
        let logits = self.model.forward(&self.params, batch)?;
        self.counters.bump_forward();

        let loss = self.loss_fn.loss(logits.view(), batch.labels())?;
        if grads == Grads::Zero {
            self.params.zero_grad();
        }

        let d = self.loss_fn.loss_prime(logits.view(), batch.labels())?;
        self.model.backward(&mut self.params, d.view())?;
        self.counters.bump_backward();

        Ok((loss, logits))
    }

    /// Applies the accumulated gradients with the optimizers.
    pub fn step(&mut self) -> Result<()> {
        self.params.optimize(&mut self.optimizers)?;
        self.counters.bump_optimizer_step();
        Ok(())
    }

    pub fn zero_grad(&mut self) {
        self.params.zero_grad();
    }

    pub(super) fn counters_mut(&mut self) -> &mut PassCounters {
        &mut self.counters
    }
}
