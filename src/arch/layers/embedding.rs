use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis, Zip};
use rand::Rng;

use crate::{Result, TrainErr, arch::init, params::Parameter};

/// A lookup table mapping token ids to dense vectors.
#[derive(Debug, Clone)]
pub struct Embedding {
    name: String,
    vocab_size: usize,
    dim: usize,

    // Forward metadata
    tokens: Array2<usize>,
}

impl Embedding {
    pub fn new(name: impl Into<String>, vocab_size: usize, dim: usize) -> Self {
        Self {
            name: name.into(),
            vocab_size,
            dim,
            tokens: Array2::zeros((0, 0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Creates the table's parameter with standard normal entries.
    pub fn init_param<R: Rng>(&self, rng: &mut R) -> Result<Parameter> {
        let value = init::normal(rng, self.vocab_size * self.dim, 0., 1.)?;
        Parameter::new(self.name.as_str(), vec![self.vocab_size, self.dim], value)
    }

    /// Looks up every token, producing an array of shape `(batch, seq, dim)`.
    pub fn infer(&self, params: &[f32], tokens: ArrayView2<usize>) -> Result<Array3<f32>> {
        let table = self.view_table(params)?;
        let (batch, seq) = tokens.dim();
        let mut out = Array3::zeros((batch, seq, self.dim));

        for ((i, j), &token) in tokens.indexed_iter() {
            if token >= self.vocab_size {
                return Err(TrainErr::SizeMismatch {
                    what: "token id",
                    got: token,
                    expected: self.vocab_size,
                });
            }

            out.slice_mut(ndarray::s![i, j, ..])
                .assign(&table.row(token));
        }

        Ok(out)
    }

    /// Looks up every token, keeping them for `backward`.
    pub fn forward(&mut self, params: &[f32], tokens: ArrayView2<usize>) -> Result<Array3<f32>> {
        let out = self.infer(params, tokens)?;
        self.tokens = tokens.to_owned();
        Ok(out)
    }

    /// Scatters the delta of each looked up vector onto its row of the table's gradient.
    pub fn backward(&self, grad: &mut [f32], d: ArrayView3<f32>) -> Result<()> {
        let (batch, seq) = self.tokens.dim();
        if d.dim() != (batch, seq, self.dim) {
            return Err(TrainErr::SizeMismatch {
                what: "embedding delta",
                got: d.len(),
                expected: batch * seq * self.dim,
            });
        }

        self.check_size(grad.len())?;
        let mut table_grad = ArrayViewMut2::from_shape((self.vocab_size, self.dim), grad)?;

        for (tokens, d) in self.tokens.outer_iter().zip(d.outer_iter()) {
            for (&token, d) in tokens.iter().zip(d.axis_iter(Axis(0))) {
                Zip::from(table_grad.row_mut(token))
                    .and(&d)
                    .for_each(|g, &d| *g += d);
            }
        }

        Ok(())
    }

    fn view_table<'a>(&self, params: &'a [f32]) -> Result<ArrayView2<'a, f32>> {
        self.check_size(params.len())?;
        Ok(ArrayView2::from_shape((self.vocab_size, self.dim), params)?)
    }

    fn check_size(&self, got: usize) -> Result<()> {
        let expected = self.vocab_size * self.dim;
        if got != expected {
            return Err(TrainErr::SizeMismatch {
                what: "embedding table",
                got,
                expected,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, s};

    use super::*;

    const TABLE: [f32; 6] = [0., 0., 1., 2., 3., 4.];

    #[test]
    fn looks_up_rows() {
        let emb = Embedding::new("embedding", 3, 2);
        let out = emb.infer(&TABLE, array![[2, 1]].view()).unwrap();
        assert_eq!(out.slice(s![0, .., ..]), array![[3., 4.], [1., 2.]]);
    }

    #[test]
    fn out_of_vocabulary_tokens_are_rejected() {
        let emb = Embedding::new("embedding", 3, 2);
        assert!(emb.infer(&TABLE, array![[3]].view()).is_err());
    }

    #[test]
    fn backward_scatters_repeated_tokens() {
        let mut emb = Embedding::new("embedding", 3, 2);
        emb.forward(&TABLE, array![[1, 1, 2]].view()).unwrap();

        let d = Array3::from_shape_vec((1, 3, 2), vec![1., 1., 2., 2., 5., 5.]).unwrap();
        let mut grad = [0.; 6];
        emb.backward(&mut grad, d.view()).unwrap();
        assert_eq!(grad, [0., 0., 3., 3., 5., 5.]);
    }
}
