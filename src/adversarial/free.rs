use ndarray::{Array2, ArrayView2, ArrayViewMut2, s};

use super::{Adversary, direction};
use crate::{Result, TrainErr, params::ParamStore};

/// Free adversarial training: a perturbation of shape `(pad_size, embed_dim)` that lives for
/// a whole epoch and grows along the sign of the embedding gradient, clamped to
/// `[-epsilon, epsilon]` element-wise.
///
/// The target parameter itself is never modified; the model adds `delta` to every embedded
/// sequence instead.
#[derive(Debug, Clone)]
pub struct Free {
    target: String,
    delta: Array2<f32>,
}

impl Free {
    /// Creates a new `Free` with a zeroed perturbation.
    ///
    /// # Arguments
    /// * `target` - The name of the embedding parameter whose gradient drives the perturbation.
    /// * `pad_size` - The padded width of every sequence.
    /// * `embed_dim` - The width of each embedding.
    pub fn new(target: impl Into<String>, pad_size: usize, embed_dim: usize) -> Self {
        Self {
            target: target.into(),
            delta: Array2::zeros((pad_size, embed_dim)),
        }
    }

    pub fn delta(&self) -> &Array2<f32> {
        &self.delta
    }

    /// Zeros the perturbation, as done at the start of every epoch.
    pub fn begin_epoch(&mut self) {
        self.delta.fill(0.);
    }

    /// Zeros the gradient rows the perturbation was computed from.
    pub fn clear_attacked_grad(&self, params: &mut ParamStore) -> Result<()> {
        let rows = self.delta.nrows();
        let param = params.get_mut(&self.target)?;
        let shape = self.check_target(param.shape())?;
        let mut grad = ArrayViewMut2::from_shape(shape, param.grad_mut())?;
        grad.slice_mut(s![..rows, ..]).fill(0.);
        Ok(())
    }

    /// Validates the target's shape against the perturbation.
    ///
    /// # Returns
    /// The `(rows, cols)` of the target or an error if the perturbation doesn't fit in it.
    fn check_target(&self, shape: &[usize]) -> Result<(usize, usize)> {
        let &[rows, cols] = shape else {
            return Err(TrainErr::SizeMismatch {
                what: "embedding rank",
                got: shape.len(),
                expected: 2,
            });
        };

        if cols != self.delta.ncols() {
            return Err(TrainErr::SizeMismatch {
                what: "embedding width",
                got: cols,
                expected: self.delta.ncols(),
            });
        }

        if rows < self.delta.nrows() {
            return Err(TrainErr::SizeMismatch {
                what: "embedding rows",
                got: rows,
                expected: self.delta.nrows(),
            });
        }

        Ok((rows, cols))
    }
}

impl Adversary for Free {
    /// Updates the perturbation as `clamp(delta + epsilon * sign(grad), -epsilon, epsilon)`,
    /// where `grad` are the first `pad_size` rows of the target's gradient.
    fn attack(&mut self, params: &mut ParamStore, epsilon: f32, _: bool) -> Result<()> {
        let param = params.get(&self.target)?;
        let shape = self.check_target(param.shape())?;
        let grad = ArrayView2::from_shape(shape, param.grad())?;
        let rows = self.delta.nrows();

        self.delta
            .zip_mut_with(&grad.slice(s![..rows, ..]), |d, &g| {
                *d = (*d + epsilon * direction::sign(g)).clamp(-epsilon, epsilon);
            });

        Ok(())
    }

    /// The perturbation outlives every step, so there's nothing to restore.
    fn restore(&mut self, _: &mut ParamStore) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;

    fn store(grad: Vec<f32>) -> ParamStore {
        let mut store = ParamStore::new();
        let mut p = Parameter::new("embedding", vec![3, 2], vec![1.; 6]).unwrap();
        p.grad_mut().copy_from_slice(&grad);
        store.register(p).unwrap();
        store
    }

    #[test]
    fn steps_along_the_sign_and_clamps() {
        let mut params = store(vec![0.5, -2., 0., 3., 9., 9.]);
        let mut free = Free::new("embedding", 2, 2);
        let expected = Array2::from_shape_vec((2, 2), vec![0.1, -0.1, 0., 0.1]).unwrap();

        free.attack(&mut params, 0.1, true).unwrap();
        assert_eq!(*free.delta(), expected);

        free.attack(&mut params, 0.1, false).unwrap();
        assert_eq!(*free.delta(), expected);
        assert_eq!(params.get("embedding").unwrap().value(), [1.; 6]);
    }

    #[test]
    fn clears_only_the_attacked_rows() {
        let mut params = store(vec![1.; 6]);
        let free = Free::new("embedding", 2, 2);
        free.clear_attacked_grad(&mut params).unwrap();
        assert_eq!(params.get("embedding").unwrap().grad(), [0., 0., 0., 0., 1., 1.]);
    }

    #[test]
    fn begin_epoch_resets_the_perturbation() {
        let mut params = store(vec![1.; 6]);
        let mut free = Free::new("embedding", 2, 2);
        free.attack(&mut params, 0.5, true).unwrap();
        free.begin_epoch();
        assert!(free.delta().iter().all(|&d| d == 0.));
    }

    #[test]
    fn sequences_wider_than_the_vocabulary_are_rejected() {
        let mut params = store(vec![1.; 6]);
        let mut free = Free::new("embedding", 4, 2);
        assert!(matches!(
            free.attack(&mut params, 0.1, true),
            Err(TrainErr::SizeMismatch { .. })
        ));
    }
}
