use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::LossFn;
use crate::{Result, TrainErr};

/// Softmax cross-entropy loss, computed with a numerically stable log-softmax.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    fn check(logits: ArrayView2<f32>, labels: &[usize]) -> Result<()> {
        if labels.len() != logits.nrows() {
            return Err(TrainErr::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: logits.nrows(),
            });
        }

        let num_classes = logits.ncols();
        match labels.iter().find(|&&label| label >= num_classes) {
            Some(&label) => Err(TrainErr::InvalidLabel { label, num_classes }),
            None => Ok(()),
        }
    }
}

fn log_sum_exp(row: ArrayView1<f32>) -> f32 {
    let max = row.fold(f32::NEG_INFINITY, |acc, &z| acc.max(z));
    max + row.iter().map(|&z| (z - max).exp()).sum::<f32>().ln()
}

impl LossFn for CrossEntropy {
    fn loss(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Result<f32> {
        Self::check(logits, labels)?;

        let total: f32 = logits
            .outer_iter()
            .zip(labels)
            .map(|(row, &label)| log_sum_exp(row) - row[label])
            .sum();

        Ok(total / logits.nrows().max(1) as f32)
    }

    fn loss_prime(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Result<Array2<f32>> {
        Self::check(logits, labels)?;

        let batch = logits.nrows().max(1) as f32;
        let mut d = logits.to_owned();

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(labels) {
            let lse = log_sum_exp(row.view());
            row.mapv_inplace(|z| (z - lse).exp() / batch);
            row[label] -= 1. / batch;
        }

        Ok(d)
    }
}
