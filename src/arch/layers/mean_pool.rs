use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};

use crate::{Result, TrainErr};

/// Averages the first `seq_len` positions of each sequence, ignoring the padding.
///
/// A length of zero or larger than the padded width is clamped to `1..=width`.
#[derive(Debug, Clone, Default)]
pub struct MeanPool {
    // Forward metadata
    lens: Vec<usize>,
    width: usize,
}

impl MeanPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pools an array of shape `(batch, seq, dim)` into one of shape `(batch, dim)`.
    pub fn infer(&self, x: ArrayView3<f32>, seq_lens: &[usize]) -> Result<Array2<f32>> {
        let (batch, width, dim) = x.dim();
        if seq_lens.len() != batch {
            return Err(TrainErr::SizeMismatch {
                what: "sequence lengths",
                got: seq_lens.len(),
                expected: batch,
            });
        }

        let mut out = Array2::zeros((batch, dim));
        for ((seq, mut row), &len) in x.outer_iter().zip(out.outer_iter_mut()).zip(seq_lens) {
            let len = clamp_len(len, width);
            if let Some(mean) = seq.slice(s![..len, ..]).mean_axis(Axis(0)) {
                row.assign(&mean);
            }
        }

        Ok(out)
    }

    pub fn forward(&mut self, x: ArrayView3<f32>, seq_lens: &[usize]) -> Result<Array2<f32>> {
        let out = self.infer(x, seq_lens)?;
        self.width = x.dim().1;
        self.lens = seq_lens.iter().map(|&len| clamp_len(len, self.width)).collect();
        Ok(out)
    }

    /// Spreads the delta of each pooled vector evenly over the positions it averaged.
    pub fn backward(&self, d: ArrayView2<f32>) -> Result<Array3<f32>> {
        if d.nrows() != self.lens.len() {
            return Err(TrainErr::SizeMismatch {
                what: "pooling delta",
                got: d.nrows(),
                expected: self.lens.len(),
            });
        }

        let mut d_prev = Array3::zeros((d.nrows(), self.width, d.ncols()));
        for ((mut seq, row), &len) in d_prev.outer_iter_mut().zip(d.outer_iter()).zip(&self.lens) {
            seq.slice_mut(s![..len, ..]).assign(&(&row / len as f32));
        }

        Ok(d_prev)
    }
}

fn clamp_len(len: usize, width: usize) -> usize {
    len.clamp(1, width.max(1))
}
