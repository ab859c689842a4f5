use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Result, TrainErr, adversarial::AdvMode, arch::activations::ActFn};

fn default_epsilon() -> f32 {
    1.0
}

fn default_k() -> usize {
    3
}

fn default_require_improvement() -> usize {
    1000
}

fn default_eval_every() -> NonZeroUsize {
    NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN)
}

fn default_b1() -> f32 {
    0.9
}

fn default_b2() -> f32 {
    0.999
}

fn default_eps() -> f32 {
    1e-8
}

/// The optimizer applied to every parameter, all sharing the run's `learning_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adam {
        #[serde(default = "default_b1")]
        b1: f32,
        #[serde(default = "default_b2")]
        b2: f32,
        #[serde(default = "default_eps")]
        eps: f32,
    },
    GradientDescent,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            b1: default_b1(),
            b2: default_b2(),
            eps: default_eps(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationConfig {
    #[default]
    Relu,
    Sigmoid,
}

impl From<ActivationConfig> for ActFn {
    fn from(value: ActivationConfig) -> Self {
        match value {
            ActivationConfig::Relu => ActFn::relu(),
            ActivationConfig::Sigmoid => ActFn::sigmoid(1.),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
    /// The fixed width every sequence is padded or truncated to.
    pub pad_size: usize,
    #[serde(default)]
    pub activation: ActivationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub train_path: PathBuf,
    pub dev_path: PathBuf,
    pub test_path: PathBuf,
    #[serde(default)]
    pub pad_id: usize,
}

/// The configuration of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub learning_rate: f32,
    pub num_epochs: usize,
    pub batch_size: NonZeroUsize,
    /// The perturbation budget.
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
    /// The amount of sub-steps of the multi step and free attacks.
    #[serde(rename = "K", alias = "k", default = "default_k")]
    pub k: usize,
    /// The multi step attack's step size, `epsilon` if missing.
    #[serde(default)]
    pub alpha: Option<f32>,
    #[serde(default)]
    pub adv_mode: AdvMode,
    pub class_list: Vec<String>,
    pub save_path: PathBuf,
    pub log_path: PathBuf,
    #[serde(default = "default_require_improvement")]
    pub require_improvement: usize,
    #[serde(default)]
    pub early_stopping: bool,
    #[serde(default = "default_eval_every")]
    pub eval_every: NonZeroUsize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    pub model: ModelConfig,
    pub data: DataConfig,
}

impl TrainConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn num_classes(&self) -> usize {
        self.class_list.len()
    }

    /// Checks every value is usable for a run.
    ///
    /// # Returns
    /// An `InvalidConfig` error describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f32| {
            if value > 0. && value.is_finite() {
                Ok(())
            } else {
                Err(TrainErr::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };

        positive("learning_rate", self.learning_rate)?;
        positive("epsilon", self.epsilon)?;
        if let Some(alpha) = self.alpha {
            positive("alpha", alpha)?;
        }

        if self.num_epochs == 0 {
            return Err(TrainErr::InvalidConfig(
                "num_epochs must be greater than 0".into(),
            ));
        }

        if matches!(self.adv_mode, AdvMode::Pgd | AdvMode::Free) && self.k == 0 {
            return Err(TrainErr::InvalidConfig(format!(
                "K must be greater than 0 for {} training",
                self.adv_mode
            )));
        }

        if self.class_list.len() < 2 {
            return Err(TrainErr::InvalidConfig(format!(
                "class_list must name at least 2 classes, got {}",
                self.class_list.len()
            )));
        }

        self.validate_model()
    }

    fn validate_model(&self) -> Result<()> {
        let ModelConfig {
            vocab_size,
            embed_dim,
            hidden_dim,
            pad_size,
            ..
        } = self.model;

        for (name, value) in [
            ("vocab_size", vocab_size),
            ("embed_dim", embed_dim),
            ("hidden_dim", hidden_dim),
            ("pad_size", pad_size),
        ] {
            if value == 0 {
                return Err(TrainErr::InvalidConfig(format!(
                    "model.{name} must be greater than 0"
                )));
            }
        }

        if self.data.pad_id >= vocab_size {
            return Err(TrainErr::InvalidConfig(format!(
                "data.pad_id ({}) must be a token of the vocabulary ({vocab_size})",
                self.data.pad_id
            )));
        }

        // the free attack reads one embedding gradient row per sequence position
        if self.adv_mode == AdvMode::Free && pad_size > vocab_size {
            return Err(TrainErr::InvalidConfig(format!(
                "FREE training needs pad_size ({pad_size}) <= vocab_size ({vocab_size})"
            )));
        }

        Ok(())
    }
}
