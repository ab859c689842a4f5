use crate::{Result, TrainErr};

/// A named, trainable tensor stored flat in row-major order together with its gradient
/// accumulator.
///
/// While an attack session is active the parameter also holds a `backup` of its clean value.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    shape: Vec<usize>,
    value: Vec<f32>,
    grad: Vec<f32>,
    backup: Option<Vec<f32>>,
}

impl Parameter {
    /// Creates a new `Parameter` with a zeroed gradient.
    ///
    /// # Arguments
    /// * `name` - The unique name of the parameter.
    /// * `shape` - The dimensions of the tensor.
    /// * `value` - The initial values, flat and row-major.
    ///
    /// # Returns
    /// A new `Parameter` or an error if `value` doesn't fit `shape`.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, value: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if value.len() != expected {
            return Err(TrainErr::SizeMismatch {
                what: "parameter value",
                got: value.len(),
                expected,
            });
        }

        Ok(Self {
            name: name.into(),
            grad: vec![0.0; expected],
            shape,
            value,
            backup: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the amount of scalars in this parameter.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn value(&self) -> &[f32] {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut [f32] {
        &mut self.value
    }

    pub fn grad(&self) -> &[f32] {
        &self.grad
    }

    pub fn grad_mut(&mut self) -> &mut [f32] {
        &mut self.grad
    }

    /// Borrows the value and the gradient at the same time, the former immutably.
    pub fn value_and_grad_mut(&mut self) -> (&[f32], &mut [f32]) {
        (&self.value, &mut self.grad)
    }

    /// Borrows the value mutably and the gradient immutably, as an optimizer step needs.
    pub fn value_mut_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.value, &self.grad)
    }

    /// Zeros out the gradient accumulator.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// Returns the clean value saved at the start of the current attack session, if any.
    pub fn backup(&self) -> Option<&[f32]> {
        self.backup.as_deref()
    }

    /// Borrows the value mutably together with the backup, if any.
    pub fn value_mut_and_backup(&mut self) -> (&mut [f32], Option<&[f32]>) {
        (&mut self.value, self.backup.as_deref())
    }

    /// Snapshots the current value into the backup slot.
    ///
    /// An existing backup is overwritten: callers must restore before starting a new
    /// session.
    pub fn save_backup(&mut self) {
        match &mut self.backup {
            Some(backup) => backup.copy_from_slice(&self.value),
            None => self.backup = Some(self.value.clone()),
        }
    }

    /// Copies the backup back into the value and clears it.
    ///
    /// # Returns
    /// An error if there was no backup to restore.
    pub fn restore_backup(&mut self) -> Result<()> {
        let backup = self.backup.take().ok_or_else(|| TrainErr::NoBackup {
            name: self.name.clone(),
        })?;

        self.value.copy_from_slice(&backup);
        Ok(())
    }

    /// Overwrites the value, keeping the gradient and any backup untouched.
    ///
    /// # Returns
    /// An error if `value` has a different size than this parameter.
    pub fn assign(&mut self, value: &[f32]) -> Result<()> {
        if value.len() != self.value.len() {
            return Err(TrainErr::SizeMismatch {
                what: "assigned value",
                got: value.len(),
                expected: self.value.len(),
            });
        }

        self.value.copy_from_slice(value);
        Ok(())
    }
}
