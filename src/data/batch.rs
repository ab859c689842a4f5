use ndarray::{Array2, ArrayView2};

use crate::{Result, TrainErr};

/// An immutable batch of padded token sequences with their labels and true lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    inputs: Array2<usize>,
    labels: Vec<usize>,
    seq_lens: Vec<usize>,
}

impl Batch {
    /// Creates a new `Batch`.
    ///
    /// # Arguments
    /// * `inputs` - Token ids of shape `(batch, pad_size)`.
    /// * `labels` - One class index per row.
    /// * `seq_lens` - The unpadded length of each row.
    ///
    /// # Returns
    /// A new `Batch` or an error if the row counts disagree or the batch is empty.
    pub fn new(inputs: Array2<usize>, labels: Vec<usize>, seq_lens: Vec<usize>) -> Result<Self> {
        if inputs.nrows() == 0 {
            return Err(TrainErr::EmptyDataset { what: "batch" });
        }

        for (what, len) in [("labels", labels.len()), ("sequence lengths", seq_lens.len())] {
            if len != inputs.nrows() {
                return Err(TrainErr::SizeMismatch {
                    what,
                    got: len,
                    expected: inputs.nrows(),
                });
            }
        }

        Ok(Self {
            inputs,
            labels,
            seq_lens,
        })
    }

    pub fn inputs(&self) -> ArrayView2<'_, usize> {
        self.inputs.view()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn seq_lens(&self) -> &[usize] {
        &self.seq_lens
    }

    /// Returns the amount of samples in the batch.
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.nrows() == 0
    }
}
