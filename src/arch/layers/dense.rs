use ndarray::{linalg, prelude::*};
use rand::Rng;

use crate::{
    Result, TrainErr,
    arch::{activations::ActFn, init},
    params::Parameter,
};

/// A fully connected layer whose weights and biases live in a single parameter of shape
/// `[n + 1, m]`: the first `n` rows are the weights and the last one the biases.
#[derive(Debug, Clone)]
pub struct Dense {
    name: String,
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `name` - The name of the parameter holding this layer's weights and biases.
    /// * `dim` - The input and output dimensions.
    /// * `act_fn` - An optional activation applied to the output.
    pub fn new(name: impl Into<String>, dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            name: name.into(),
            dim,
            act_fn,
            size: (dim.0 + 1) * dim.1,
            x: Array2::zeros((0, dim.0)),
            z: Array2::zeros((0, dim.1)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the input and output dimensions.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Creates this layer's parameter with Xavier normal weights and zeroed biases.
    pub fn init_param<R: Rng>(&self, rng: &mut R) -> Result<Parameter> {
        let (n, m) = self.dim;
        let mut value = init::xavier(rng, n * m, n, m)?;
        value.resize(self.size, 0.);
        Parameter::new(self.name.as_str(), vec![n + 1, m], value)
    }

    /// Computes the output of the layer without caching anything for a backward pass.
    pub fn infer(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let z = self.linear(params, x)?;
        Ok(self.activate(z))
    }

    /// Computes the output of the layer, keeping the input and pre-activation for `backward`.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.z = self.linear(params, x)?;
        self.x = x.to_owned();
        Ok(self.activate(self.z.clone()))
    }

    /// Accumulates this layer's gradient and propagates the delta to the previous layer.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's gradient accumulator, added onto rather than overwritten.
    /// * `d` - The delta of this layer's output.
    ///
    /// # Returns
    /// The delta of this layer's input.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        if d.dim() != self.z.dim() {
            return Err(TrainErr::SizeMismatch {
                what: "dense layer delta",
                got: d.len(),
                expected: self.z.len(),
            });
        }

        let mut d = d.to_owned();
        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &self.x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        let mut d_prev = Array2::zeros((d.nrows(), self.dim.0));
        linalg::general_mat_mul(1.0, &d, &w.t(), 0.0, &mut d_prev);
        Ok(d_prev)
    }

    fn linear(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(TrainErr::SizeMismatch {
                what: "dense layer input",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;
        Ok(z)
    }

    fn activate(&self, mut z: Array2<f32>) -> Array2<f32> {
        if let Some(act_fn) = &self.act_fn {
            z.mapv_inplace(|z| act_fn.f(z));
        }

        z
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_size(grad.len())?;
        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_size(params.len())?;
        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size])?;
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..])?;
        Ok((weights, biases))
    }

    fn check_size(&self, got: usize) -> Result<()> {
        if got != self.size {
            return Err(TrainErr::SizeMismatch {
                what: "dense layer parameters",
                got,
                expected: self.size,
            });
        }

        Ok(())
    }
}
