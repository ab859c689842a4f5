use rayon::prelude::*;

use super::Parameter;
use crate::{Result, TrainErr, optimization::Optimizer};

/// The store of the model's named parameters.
///
/// Parameters are kept in registration order, which is the order the model's layers consume
/// them when traversing the network forwards. The store is the only owner of both the
/// values and the gradient accumulators.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    params: Vec<Parameter>,
}

impl ParamStore {
    /// Creates a new empty `ParamStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new parameter at the end of the store.
    ///
    /// # Arguments
    /// * `param` - The parameter to add.
    ///
    /// # Returns
    /// The index of the parameter or an error if its name was already taken.
    pub fn register(&mut self, param: Parameter) -> Result<usize> {
        if self.params.iter().any(|p| p.name() == param.name()) {
            return Err(TrainErr::DuplicateParameter {
                name: param.name().to_string(),
            });
        }

        self.params.push(param);
        Ok(self.params.len() - 1)
    }

    /// Returns the amount of registered parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the total amount of scalars held by the store.
    pub fn size(&self) -> usize {
        self.params.iter().map(Parameter::len).sum()
    }

    pub fn get(&self, name: &str) -> Result<&Parameter> {
        self.params
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| TrainErr::UnknownParameter {
                name: name.to_string(),
            })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        self.params
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| TrainErr::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Iterates the parameters in registration order.
    pub fn front(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Zeros out the gradients of every parameter.
    pub fn zero_grad(&mut self) {
        self.params.par_iter_mut().for_each(Parameter::zero_grad);
    }

    /// Applies the accumulated gradients onto the parameters.
    ///
    /// # Arguments
    /// * `optimizers` - One optimizer per parameter, in registration order.
    ///
    /// # Returns
    /// An error if the amount of optimizers doesn't match the amount of parameters or if any
    /// of them failed to update its parameter.
    pub fn optimize<O: Optimizer + Send>(&mut self, optimizers: &mut [O]) -> Result<()> {
        if optimizers.len() != self.params.len() {
            return Err(TrainErr::SizeMismatch {
                what: "optimizers",
                got: optimizers.len(),
                expected: self.params.len(),
            });
        }

        optimizers
            .par_iter_mut()
            .zip(self.params.par_iter_mut())
            .try_for_each(|(optimizer, param)| {
                let (value, grad) = param.value_mut_and_grad();
                optimizer.update_params(grad, value)
            })
    }

    /// Clones the gradient of every parameter, in registration order.
    pub fn grads(&self) -> Vec<Vec<f32>> {
        self.params.iter().map(|p| p.grad().to_vec()).collect()
    }

    /// Overwrites the gradient of every parameter.
    ///
    /// # Arguments
    /// * `grads` - One gradient per parameter, as returned by `grads`.
    pub fn set_grads(&mut self, grads: &[Vec<f32>]) -> Result<()> {
        if grads.len() != self.params.len() {
            return Err(TrainErr::SizeMismatch {
                what: "gradient snapshot",
                got: grads.len(),
                expected: self.params.len(),
            });
        }

        for (param, grad) in self.params.iter_mut().zip(grads) {
            if grad.len() != param.len() {
                return Err(TrainErr::SizeMismatch {
                    what: "gradient snapshot",
                    got: grad.len(),
                    expected: param.len(),
                });
            }

            param.grad_mut().copy_from_slice(grad);
        }

        Ok(())
    }
}
