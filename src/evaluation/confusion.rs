use std::fmt;

use crate::{Result, TrainErr};

/// Counts of predictions per class: `matrix[true][predicted]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Creates an empty matrix for `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self {
            matrix: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Builds the matrix of a set of predictions.
    ///
    /// # Arguments
    /// * `num_classes` - The amount of classes.
    /// * `predicted` - The predicted label of each sample.
    /// * `truth` - The true label of each sample.
    ///
    /// # Returns
    /// The matrix or an error if the slices differ in length or hold an out of range label.
    pub fn from_predictions(num_classes: usize, predicted: &[usize], truth: &[usize]) -> Result<Self> {
        if predicted.len() != truth.len() {
            return Err(TrainErr::SizeMismatch {
                what: "predictions",
                got: predicted.len(),
                expected: truth.len(),
            });
        }

        let mut cm = Self::new(num_classes);
        for (&pred, &label) in predicted.iter().zip(truth) {
            cm.add(label, pred)?;
        }

        Ok(cm)
    }

    /// Counts one prediction.
    pub fn add(&mut self, label: usize, predicted: usize) -> Result<()> {
        let num_classes = self.num_classes();
        if let Some(&bad) = [label, predicted].iter().find(|&&l| l >= num_classes) {
            return Err(TrainErr::InvalidLabel {
                label: bad,
                num_classes,
            });
        }

        self.matrix[label][predicted] += 1;
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.matrix.len()
    }

    pub fn get(&self, label: usize, predicted: usize) -> usize {
        self.matrix[label][predicted]
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    /// Samples of another class predicted as `class`.
    pub fn false_positives(&self, class: usize) -> usize {
        self.predicted(class) - self.true_positives(class)
    }

    /// Samples of `class` predicted as another one.
    pub fn false_negatives(&self, class: usize) -> usize {
        self.support(class) - self.true_positives(class)
    }

    /// The amount of samples whose true label is `class`.
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    /// The amount of samples predicted as `class`.
    pub fn predicted(&self, class: usize) -> usize {
        self.matrix.iter().map(|row| row[class]).sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.;
        }

        let correct: usize = (0..self.num_classes()).map(|i| self.matrix[i][i]).sum();
        correct as f32 / total as f32
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .matrix
            .iter()
            .flatten()
            .map(|n| n.to_string().len())
            .max()
            .unwrap_or(1);

        for row in &self.matrix {
            let cells: Vec<_> = row.iter().map(|n| format!("{n:>width$}")).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }

        Ok(())
    }
}
