use std::fmt;

use super::ConfusionMatrix;

/// Precision, recall, F1 and support of one class, or an average of several.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

/// Per-class metrics with their macro and weighted averages.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    names: Vec<String>,
    classes: Vec<ClassMetrics>,
    confusion: ConfusionMatrix,
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 { 0. } else { num as f32 / den as f32 }
}

impl ClassificationReport {
    /// Builds the report of a confusion matrix.
    ///
    /// # Arguments
    /// * `confusion` - The confusion matrix of the predictions.
    /// * `class_list` - A display name per class; missing ones fall back to the class index.
    pub fn new(confusion: ConfusionMatrix, class_list: &[String]) -> Self {
        let classes = (0..confusion.num_classes())
            .map(|class| {
                let tp = confusion.true_positives(class);
                let precision = ratio(tp, confusion.predicted(class));
                let recall = ratio(tp, confusion.support(class));
                let f1 = if precision + recall > 0. {
                    2. * precision * recall / (precision + recall)
                } else {
                    0.
                };

                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support: confusion.support(class),
                }
            })
            .collect();

        let names = (0..confusion.num_classes())
            .map(|i| class_list.get(i).cloned().unwrap_or_else(|| i.to_string()))
            .collect();

        Self {
            names,
            classes,
            confusion,
        }
    }

    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    pub fn accuracy(&self) -> f32 {
        self.confusion.accuracy()
    }

    /// The unweighted mean of every class.
    pub fn macro_avg(&self) -> ClassMetrics {
        let n = self.classes.len().max(1) as f32;
        let mut avg = self.sum(|_| 1.);
        avg.precision /= n;
        avg.recall /= n;
        avg.f1 /= n;
        avg
    }

    /// The mean of every class weighted by its support.
    pub fn weighted_avg(&self) -> ClassMetrics {
        let total = self.confusion.total();
        let mut avg = self.sum(|m| m.support as f32);
        if total > 0 {
            avg.precision /= total as f32;
            avg.recall /= total as f32;
            avg.f1 /= total as f32;
        }

        avg
    }

    fn sum(&self, weight: impl Fn(&ClassMetrics) -> f32) -> ClassMetrics {
        self.classes.iter().fold(ClassMetrics::default(), |acc, m| {
            let w = weight(m);
            ClassMetrics {
                precision: acc.precision + w * m.precision,
                recall: acc.recall + w * m.recall,
                f1: acc.f1 + w * m.f1,
                support: acc.support + m.support,
            }
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .names
            .iter()
            .map(String::len)
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or_default();

        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{name:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                m.precision, m.recall, m.f1, m.support
            )
        };

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (name, metrics) in self.names.iter().zip(&self.classes) {
            row(f, name, metrics)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy(),
            self.confusion.total()
        )?;
        row(f, "macro avg", &self.macro_avg())?;
        row(f, "weighted avg", &self.weighted_avg())
    }
}
