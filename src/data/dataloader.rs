use std::num::NonZeroUsize;

use ndarray::Array2;

use super::{Batch, TextDataset};

/// A restartable loader producing sequential batches from a `TextDataset`.
///
/// The last batch may be smaller than `batch_size` when the dataset doesn't divide evenly.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: TextDataset,
    batch_size: NonZeroUsize,
    cursor: usize,
}

impl DataLoader {
    pub fn new(dataset: TextDataset, batch_size: NonZeroUsize) -> Self {
        Self {
            dataset,
            batch_size,
            cursor: 0,
        }
    }

    /// Rewinds the loader to the first batch.
    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the amount of batches in a full pass.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    /// Returns the next batch, or `None` if the pass is exhausted.
    pub fn next_batch(&mut self) -> Option<Batch> {
        let samples = self.dataset.samples();
        if self.cursor >= samples.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size.get()).min(samples.len());
        let chunk = &samples[self.cursor..end];
        self.cursor = end;

        let pad_size = self.dataset.pad_size();
        let tokens = chunk.iter().flat_map(|s| s.tokens.iter().copied()).collect();
        let inputs = Array2::from_shape_vec((chunk.len(), pad_size), tokens).ok()?;
        let labels = chunk.iter().map(|s| s.label).collect();
        let seq_lens = chunk.iter().map(|s| s.seq_len).collect();

        Batch::new(inputs, labels, seq_lens).ok()
    }
}

impl Iterator for DataLoader {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(n: usize, batch_size: usize) -> DataLoader {
        let samples = (0..n).map(|i| (vec![i + 1, i + 2], i % 2));
        let ds = TextDataset::new(samples, 3, 0).unwrap();
        DataLoader::new(ds, NonZeroUsize::new(batch_size).unwrap())
    }

    #[test]
    fn batches_respect_batch_size_and_keep_the_residue() {
        let mut dl = loader(5, 2);
        assert_eq!(dl.num_batches(), 3);

        let b1 = dl.next_batch().unwrap();
        assert_eq!(b1.len(), 2);
        assert_eq!(b1.inputs().row(0).to_vec(), [1, 2, 0]);
        assert_eq!(b1.labels(), [0, 1]);
        assert_eq!(b1.seq_lens(), [2, 2]);

        assert_eq!(dl.next_batch().unwrap().len(), 2);
        assert_eq!(dl.next_batch().unwrap().len(), 1);
        assert!(dl.next_batch().is_none());
    }

    #[test]
    fn reset_restarts_the_pass() {
        let mut dl = loader(4, 2);
        let first = dl.next_batch().unwrap();
        while dl.next_batch().is_some() {}

        dl.reset();
        assert_eq!(dl.next_batch().unwrap(), first);
        assert_eq!(dl.by_ref().count(), 1);
    }
}
