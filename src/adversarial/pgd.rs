use log::debug;

use super::{Adversary, direction};
use crate::{Result, TrainErr, params::ParamStore};

/// Multi step attack: repeated `alpha` sized steps along the normalized gradient, projected
/// back onto the `epsilon` ball around the clean value.
///
/// Besides the target's value it can snapshot the gradients of the whole store, so the
/// clean gradient survives the zeroing between sub-steps.
#[derive(Debug, Clone)]
pub struct Pgd {
    target: String,
    alpha: Option<f32>,
    grad_backup: Option<Vec<Vec<f32>>>,
}

impl Pgd {
    /// Creates a new `Pgd`.
    ///
    /// # Arguments
    /// * `target` - The name of the parameter to attack.
    /// * `alpha` - The size of each step, `epsilon` if `None`.
    pub fn new(target: impl Into<String>, alpha: Option<f32>) -> Self {
        Self {
            target: target.into(),
            alpha,
            grad_backup: None,
        }
    }

    /// Snapshots the gradient of every parameter in the store.
    pub fn backup_grad(&mut self, params: &ParamStore) {
        self.grad_backup = Some(params.grads());
    }

    /// Writes the snapshot taken by `backup_grad` back into the store and drops it.
    ///
    /// # Returns
    /// An error if there was no snapshot.
    pub fn restore_grad(&mut self, params: &mut ParamStore) -> Result<()> {
        let grads = self.grad_backup.take().ok_or_else(|| TrainErr::NoBackup {
            name: "gradients".into(),
        })?;

        params.set_grads(&grads)
    }
}

impl Adversary for Pgd {
    fn attack(
        &mut self,
        params: &mut ParamStore,
        epsilon: f32,
        is_first_attack: bool,
    ) -> Result<()> {
        let step = self.alpha.unwrap_or(epsilon);
        let param = params.get_mut(&self.target)?;
        if is_first_attack {
            param.save_backup();
        } else if param.backup().is_none() {
            return Err(TrainErr::NoBackup {
                name: self.target.clone(),
            });
        }

        let (value, grad) = param.value_mut_and_grad();
        if !direction::ascend(value, grad, step) {
            debug!(param = self.target.as_str(); "zero gradient, skipping perturbation");
            return Ok(());
        }

        if let (value, Some(backup)) = param.value_mut_and_backup() {
            direction::project(value, backup, epsilon);
        }

        Ok(())
    }

    fn restore(&mut self, params: &mut ParamStore) -> Result<()> {
        params.get_mut(&self.target)?.restore_backup()
    }
}
