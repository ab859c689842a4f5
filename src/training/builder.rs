use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::{Learner, TrainSettings, Trainer};
use crate::{
    Result,
    adversarial::Attack,
    arch::{Model, TextClassifier, loss::CrossEntropy},
    checkpoint::{CheckpointPolicy, CheckpointStore},
    config::{OptimizerConfig, TrainConfig},
    evaluation::Evaluator,
    metrics::MetricsSink,
    optimization::{Adam, GradientDescent, Optimizer},
    params::ParamStore,
};

/// The trainer a `TrainerBuilder` produces.
pub type ClassifierTrainer<S> = Trainer<TextClassifier, Box<dyn Optimizer + Send>, CrossEntropy, S>;

/// Builds `Trainer`s given a configuration.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration of the run.
    /// * `sink` - Where the periodic scalars are reported.
    ///
    /// # Returns
    /// A trainer with freshly initialized parameters or an error if the configuration is
    /// invalid.
    pub fn build<S: MetricsSink>(
        &self,
        config: &TrainConfig,
        sink: S,
    ) -> Result<ClassifierTrainer<S>> {
        config.validate()?;

        let mut rng = self.generate_rng(config.seed);
        let model = self.resolve_model(config);
        let params = model.init_params(&mut rng)?;
        info!(scalars = params.size(); "initialized {} parameter tensors", params.len());
        let optimizers = self.resolve_optimizers(config, &params);
        let attack = self.resolve_attack(config, &model);

        let learner = Learner::new(model, params, optimizers, CrossEntropy::new());
        let evaluator = Evaluator::new(CrossEntropy::new(), config.class_list.clone());
        let checkpoint = CheckpointPolicy::new(CheckpointStore::new(&config.save_path));

        Ok(Trainer::new(
            learner,
            attack,
            evaluator,
            checkpoint,
            sink,
            TrainSettings::from(config),
        ))
    }

    fn resolve_model(&self, config: &TrainConfig) -> TextClassifier {
        let model = &config.model;
        TextClassifier::new(
            model.vocab_size,
            model.embed_dim,
            model.hidden_dim,
            config.num_classes(),
            model.activation.into(),
        )
    }

    fn resolve_optimizers(
        &self,
        config: &TrainConfig,
        params: &ParamStore,
    ) -> Vec<Box<dyn Optimizer + Send>> {
        let lr = config.learning_rate;

        params
            .front()
            .map(|param| -> Box<dyn Optimizer + Send> {
                match config.optimizer {
                    OptimizerConfig::Adam { b1, b2, eps } => {
                        Box::new(Adam::new(param.len(), lr, b1, b2, eps))
                    }
                    OptimizerConfig::GradientDescent => Box::new(GradientDescent::new(lr)),
                }
            })
            .collect()
    }

    fn resolve_attack(&self, config: &TrainConfig, model: &TextClassifier) -> Attack {
        let delta_shape = (config.model.pad_size, config.model.embed_dim);
        Attack::new(config.adv_mode, model.embedding(), config.alpha, delta_shape)
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
