use std::{num::NonZeroUsize, time::Instant};

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};

use super::{Grads, Learner, PassCounters, TrainingState};
use crate::{
    Result, TrainErr,
    adversarial::{Adversary, Attack},
    arch::{Model, loss::LossFn},
    checkpoint::CheckpointPolicy,
    config::TrainConfig,
    data::{Batch, DataLoader},
    evaluation::{Evaluation, Evaluator, argmax},
    metrics::MetricsSink,
    optimization::Optimizer,
    params::ParamStore,
};

/// The scalar knobs of the training loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSettings {
    pub num_epochs: usize,
    pub epsilon: f32,
    pub k: usize,
    pub eval_every: NonZeroUsize,
    pub require_improvement: usize,
    pub early_stopping: bool,
}

impl From<&TrainConfig> for TrainSettings {
    fn from(config: &TrainConfig) -> Self {
        Self {
            num_epochs: config.num_epochs,
            epsilon: config.epsilon,
            k: config.k,
            eval_every: config.eval_every,
            require_improvement: config.require_improvement,
            early_stopping: config.early_stopping,
        }
    }
}

/// Drives adversarial training of a model: runs the per-batch schedule of the configured
/// attack, evaluates periodically on the dev set, keeps the best checkpoint and finally
/// tests it.
pub struct Trainer<M, O, L, S>
where
    M: Model,
    O: Optimizer + Send,
    L: LossFn,
    S: MetricsSink,
{
    learner: Learner<M, O, L>,
    attack: Attack,
    evaluator: Evaluator<L>,
    checkpoint: CheckpointPolicy,
    sink: S,
    settings: TrainSettings,
}

impl<M, O, L, S> Trainer<M, O, L, S>
where
    M: Model,
    O: Optimizer + Send,
    L: LossFn,
    S: MetricsSink,
{
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `learner` - The model, its parameters and optimizers.
    /// * `attack` - The adversarial strategy, fixed for the whole run.
    /// * `evaluator` - Evaluates on the dev and test sets.
    /// * `checkpoint` - Keeps the parameters with the best dev loss.
    /// * `sink` - Receives the periodic scalars.
    /// * `settings` - The loop's knobs.
    pub fn new(
        learner: Learner<M, O, L>,
        attack: Attack,
        evaluator: Evaluator<L>,
        checkpoint: CheckpointPolicy,
        sink: S,
        settings: TrainSettings,
    ) -> Self {
        Self {
            learner,
            attack,
            evaluator,
            checkpoint,
            sink,
            settings,
        }
    }

    pub fn params(&self) -> &ParamStore {
        self.learner.params()
    }

    pub fn model(&self) -> &M {
        self.learner.model()
    }

    pub fn counters(&self) -> PassCounters {
        self.learner.counters()
    }

    pub fn attack(&self) -> &Attack {
        &self.attack
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Trains then tests the best checkpoint.
    pub fn run(
        &mut self,
        train: &mut DataLoader,
        dev: &mut DataLoader,
        test: &mut DataLoader,
    ) -> Result<Evaluation> {
        self.train(train, dev)?;
        self.test(test)
    }

    /// Trains for the configured amount of epochs.
    ///
    /// # Arguments
    /// * `train` - The training data, re-iterated once per epoch.
    /// * `dev` - The validation data.
    ///
    /// # Returns
    /// The final training state.
    pub fn train(&mut self, train: &mut DataLoader, dev: &mut DataLoader) -> Result<TrainingState> {
        let start = Instant::now();
        let num_epochs = self.settings.num_epochs;
        let mut state = TrainingState::new();

        info!(
            batches = train.num_batches();
            "{} training for {num_epochs} epochs",
            self.attack.mode()
        );

        'epochs: for epoch in 0..num_epochs {
            info!("Epoch [{}/{num_epochs}]", epoch + 1);
            if let Attack::Free(free) = &mut self.attack {
                free.begin_epoch();
            }

            train.reset();
            while let Some(batch) = train.next_batch() {
                let (loss, logits) = self.train_step(&batch)?;

                if state.total_batch % self.settings.eval_every.get() == 0 {
                    self.report(&mut state, &batch, loss, logits.view(), dev, start)?;
                }

                state.total_batch += 1;

                if self.settings.early_stopping
                    && state.stagnated(self.settings.require_improvement)
                {
                    warn!("No optimization for a long time, auto-stopping...");
                    break 'epochs;
                }
            }
        }

        self.learner.model_mut().set_delta(None);
        self.sink.flush()?;
        Ok(state)
    }

    /// Reloads the best checkpoint and evaluates it with a full report.
    ///
    /// # Returns
    /// The test evaluation or `NoCheckpoint` if validation never improved.
    pub fn test(&mut self, test: &mut DataLoader) -> Result<Evaluation> {
        let start = Instant::now();
        let saved = self.checkpoint.reload(self.learner.params_mut())?;
        debug!(total_batch = saved.total_batch, best_loss = saved.best_loss; "reloaded checkpoint");

        let evaluation =
            self.evaluator
                .evaluate(self.learner.model(), self.learner.params(), test, true)?;

        info!(
            "Test Loss: {:>5.2},  Test Acc: {:>6.2}%",
            evaluation.loss,
            evaluation.accuracy * 100.
        );

        if let Some(report) = &evaluation.report {
            info!("Precision, Recall and F1-Score...\n{report}");
            info!("Confusion Matrix...\n{}", report.confusion());
        }

        info!("Time usage: {:.2?}", start.elapsed());
        Ok(evaluation)
    }

    /// Runs the schedule of the configured attack over one batch.
    ///
    /// # Returns
    /// The loss and logits of the clean forward pass, or those of the last sub-step for
    /// the free attack, which has no clean pass.
    fn train_step(&mut self, batch: &Batch) -> Result<(f32, Array2<f32>)> {
        let TrainSettings { epsilon, k, .. } = self.settings;
        let learner = &mut self.learner;

        match &mut self.attack {
            Attack::Identity(_) => {
                let clean = learner.pass(batch, Grads::Zero)?;
                learner.step()?;
                Ok(clean)
            }
            Attack::Fgsm(fgsm) => {
                let clean = learner.pass(batch, Grads::Accumulate)?;

                fgsm.attack(learner.params_mut(), epsilon, true)?;
                learner.counters_mut().bump_adv_step();
                learner.pass(batch, Grads::Accumulate)?;

                fgsm.restore(learner.params_mut())?;
                learner.counters_mut().bump_restore();
                learner.step()?;
                learner.zero_grad();
                Ok(clean)
            }
            Attack::Pgd(pgd) => {
                let clean = learner.pass(batch, Grads::Accumulate)?;
                pgd.backup_grad(learner.params());

                for t in 0..k {
                    pgd.attack(learner.params_mut(), epsilon, t == 0)?;
                    learner.counters_mut().bump_adv_step();

                    let grads = if t != k - 1 {
                        Grads::Zero
                    } else {
                        pgd.restore_grad(learner.params_mut())?;
                        Grads::Accumulate
                    };

                    learner.pass(batch, grads)?;
                }

                pgd.restore(learner.params_mut())?;
                learner.counters_mut().bump_restore();
                learner.step()?;
                learner.zero_grad();
                Ok(clean)
            }
            Attack::Free(free) => {
                let mut last = None;
                for t in 0..k {
                    learner.model_mut().set_delta(Some(free.delta().clone()));
                    last = Some(learner.pass(batch, Grads::Zero)?);

                    free.attack(learner.params_mut(), epsilon, t == 0)?;
                    learner.counters_mut().bump_adv_step();
                    learner.step()?;
                    free.clear_attacked_grad(learner.params_mut())?;
                }

                last.ok_or_else(|| {
                    TrainErr::InvalidConfig("K must be greater than 0 for FREE training".into())
                })
            }
        }
    }

    /// Evaluates on the dev set, keeps the checkpoint if it improved and reports the scalars.
    fn report(
        &mut self,
        state: &mut TrainingState,
        batch: &Batch,
        train_loss: f32,
        logits: ArrayView2<f32>,
        dev: &mut DataLoader,
        start: Instant,
    ) -> Result<()> {
        let correct = argmax(logits)
            .into_iter()
            .zip(batch.labels())
            .filter(|(predicted, label)| predicted == *label)
            .count();
        let train_acc = correct as f32 / batch.len() as f32;

        let dev_eval =
            self.evaluator
                .evaluate(self.learner.model(), self.learner.params(), dev, false)?;
        let improved = self
            .checkpoint
            .observe(state, dev_eval.loss, self.learner.params())?;

        info!(
            "Iter: {:>6},  Train Loss: {:>5.2},  Train Acc: {:>6.2}%,  Val Loss: {:>5.2},  Val Acc: {:>6.2}%,  Time: {:.2?} {}",
            state.total_batch,
            train_loss,
            train_acc * 100.,
            dev_eval.loss,
            dev_eval.accuracy * 100.,
            start.elapsed(),
            if improved { "*" } else { "" }
        );

        let step = state.total_batch;
        self.sink.add_scalar("loss/train", train_loss, step)?;
        self.sink.add_scalar("loss/dev", dev_eval.loss, step)?;
        self.sink.add_scalar("acc/train", train_acc, step)?;
        self.sink.add_scalar("acc/dev", dev_eval.accuracy, step)
    }
}
