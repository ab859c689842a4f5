use log::debug;
use ndarray::ArrayView2;

use super::{ClassificationReport, ConfusionMatrix};
use crate::{
    Result, TrainErr,
    arch::{Model, loss::LossFn},
    data::DataLoader,
    params::ParamStore,
};

/// The outcome of a pass over a held out dataset.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f32,
    /// The mean of the per-batch losses.
    pub loss: f32,
    /// Present only for full-report evaluations.
    pub report: Option<ClassificationReport>,
}

/// Returns the index of the largest logit of each row, the first one on ties.
pub fn argmax(logits: ArrayView2<f32>) -> Vec<usize> {
    logits
        .outer_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, max), (i, &z)| {
                    if z > max { (i, z) } else { (best, max) }
                })
                .0
        })
        .collect()
}

/// Runs inference-only passes of a model over held out data.
#[derive(Debug, Clone)]
pub struct Evaluator<L: LossFn> {
    loss_fn: L,
    class_list: Vec<String>,
}

impl<L: LossFn> Evaluator<L> {
    /// Creates a new `Evaluator`.
    ///
    /// # Arguments
    /// * `loss_fn` - The loss to average over the batches.
    /// * `class_list` - The name of every class, used to label full reports.
    pub fn new(loss_fn: L, class_list: Vec<String>) -> Self {
        Self {
            loss_fn,
            class_list,
        }
    }

    /// Evaluates `model` over every batch of `loader`, from the start.
    ///
    /// `params` is only borrowed immutably, so neither values nor gradients can change, and
    /// `Model::infer` never applies a perturbation.
    ///
    /// # Arguments
    /// * `model` - The model to evaluate.
    /// * `params` - The model's parameters.
    /// * `loader` - The held out data.
    /// * `full_report` - Whether to also compute per-class metrics and the confusion matrix.
    ///
    /// # Returns
    /// The evaluation or an error if the loader yields no batches.
    pub fn evaluate<M: Model>(
        &self,
        model: &M,
        params: &ParamStore,
        loader: &mut DataLoader,
        full_report: bool,
    ) -> Result<Evaluation> {
        let num_classes = model.num_classes();
        let mut confusion = ConfusionMatrix::new(num_classes);
        let mut total_loss = 0.;
        let mut num_batches = 0usize;

        loader.reset();
        while let Some(batch) = loader.next_batch() {
            let logits = model.infer(params, &batch)?;
            total_loss += self.loss_fn.loss(logits.view(), batch.labels())?;
            num_batches += 1;

            for (&label, predicted) in batch.labels().iter().zip(argmax(logits.view())) {
                confusion.add(label, predicted)?;
            }
        }

        if num_batches == 0 {
            return Err(TrainErr::EmptyDataset { what: "evaluation" });
        }

        let loss = total_loss / num_batches as f32;
        let accuracy = confusion.accuracy();
        debug!(batches = num_batches, loss = loss, accuracy = accuracy; "evaluated");

        let report = full_report.then(|| ClassificationReport::new(confusion, &self.class_list));
        Ok(Evaluation {
            accuracy,
            loss,
            report,
        })
    }
}
