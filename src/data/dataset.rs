use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use serde::Deserialize;

use crate::{Result, TrainErr};

/// A single tokenized sample, already padded to the dataset's width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub tokens: Vec<usize>,
    pub label: usize,
    pub seq_len: usize,
}

/// The on-disk shape of one JSON-lines record.
#[derive(Debug, Deserialize)]
struct RawSample {
    tokens: Vec<usize>,
    label: usize,
}

/// An in-memory dataset of padded token sequences.
#[derive(Debug, Clone)]
pub struct TextDataset {
    samples: Vec<Sample>,
    pad_size: usize,
}

impl TextDataset {
    /// Creates a new dataset, padding with `pad_id` or truncating every sequence to `pad_size`.
    ///
    /// # Arguments
    /// * `samples` - Pairs of (tokens, label).
    /// * `pad_size` - The fixed width of every sequence.
    /// * `pad_id` - The token id used for padding.
    ///
    /// # Returns
    /// A new `TextDataset` or an error if `pad_size` is zero.
    pub fn new<I>(samples: I, pad_size: usize, pad_id: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<usize>, usize)>,
    {
        if pad_size == 0 {
            return Err(TrainErr::InvalidConfig(
                "pad_size must be greater than 0".into(),
            ));
        }

        let samples = samples
            .into_iter()
            .map(|(mut tokens, label)| {
                let seq_len = tokens.len().min(pad_size);
                tokens.resize(pad_size, pad_id);
                Sample {
                    tokens,
                    label,
                    seq_len,
                }
            })
            .collect();

        Ok(Self { samples, pad_size })
    }

    /// Reads a JSON-lines file where each line is `{"tokens": [..], "label": n}`.
    ///
    /// Blank lines are skipped.
    pub fn from_jsonl<P: AsRef<Path>>(path: P, pad_size: usize, pad_id: usize) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut raw = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let RawSample { tokens, label } = serde_json::from_str(&line)?;
            raw.push((tokens, label));
        }

        Self::new(raw, pad_size, pad_id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn pad_size(&self) -> usize {
        self.pad_size
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Validates every label and token against the model's dimensions.
    ///
    /// # Arguments
    /// * `num_classes` - The amount of output classes.
    /// * `vocab_size` - The amount of rows in the embedding table.
    pub fn check(&self, num_classes: usize, vocab_size: usize) -> Result<()> {
        for sample in &self.samples {
            if sample.label >= num_classes {
                return Err(TrainErr::InvalidLabel {
                    label: sample.label,
                    num_classes,
                });
            }

            if let Some(&token) = sample.tokens.iter().find(|&&t| t >= vocab_size) {
                return Err(TrainErr::SizeMismatch {
                    what: "token id",
                    got: token,
                    expected: vocab_size,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn pads_and_truncates_to_the_fixed_width() {
        let ds = TextDataset::new([(vec![1, 2], 0), (vec![3, 4, 5, 6], 1)], 3, 0).unwrap();
        assert_eq!(ds.samples()[0].tokens, [1, 2, 0]);
        assert_eq!(ds.samples()[0].seq_len, 2);
        assert_eq!(ds.samples()[1].tokens, [3, 4, 5]);
        assert_eq!(ds.samples()[1].seq_len, 3);
    }

    #[test]
    fn check_rejects_out_of_range_labels_and_tokens() {
        let ds = TextDataset::new([(vec![1, 2], 2)], 2, 0).unwrap();
        assert!(matches!(
            ds.check(2, 10),
            Err(TrainErr::InvalidLabel { label: 2, .. })
        ));

        let ds = TextDataset::new([(vec![1, 12], 0)], 2, 0).unwrap();
        assert!(ds.check(2, 10).is_err());
    }

    #[test]
    fn reads_jsonl() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"tokens": [4, 5, 6], "label": 1}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"tokens": [7], "label": 0}}"#).unwrap();

        let ds = TextDataset::from_jsonl(file.path(), 2, 0).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.samples()[0].tokens, [4, 5]);
        assert_eq!(ds.samples()[1].tokens, [7, 0]);
        assert_eq!(ds.samples()[1].label, 0);
    }
}
