use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::Adversary;
use crate::{Result, params::ParamStore};

/// The adversarial training mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdvMode {
    #[default]
    Normal,
    Fgsm,
    Pgd,
    Free,
}

impl Display for AdvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdvMode::Normal => "NORMAL",
            AdvMode::Fgsm => "FGSM",
            AdvMode::Pgd => "PGD",
            AdvMode::Free => "FREE",
        };

        f.write_str(name)
    }
}

/// One strategy per adversarial mode.
#[derive(Debug, Clone)]
pub enum Attack {
    Identity(super::Identity),
    Fgsm(super::Fgsm),
    Pgd(super::Pgd),
    Free(super::Free),
}

impl Attack {
    /// Creates the strategy for `mode`.
    ///
    /// # Arguments
    /// * `mode` - The adversarial mode.
    /// * `target` - The name of the embedding parameter.
    /// * `alpha` - The multi step attack's step size, `epsilon` if `None`.
    /// * `delta_shape` - The `(pad_size, embed_dim)` of the free attack's perturbation.
    pub fn new(
        mode: AdvMode,
        target: &str,
        alpha: Option<f32>,
        delta_shape: (usize, usize),
    ) -> Self {
        match mode {
            AdvMode::Normal => Self::Identity(super::Identity),
            AdvMode::Fgsm => Self::Fgsm(super::Fgsm::new(target)),
            AdvMode::Pgd => Self::Pgd(super::Pgd::new(target, alpha)),
            AdvMode::Free => Self::Free(super::Free::new(target, delta_shape.0, delta_shape.1)),
        }
    }

    pub fn mode(&self) -> AdvMode {
        match self {
            Self::Identity(_) => AdvMode::Normal,
            Self::Fgsm(_) => AdvMode::Fgsm,
            Self::Pgd(_) => AdvMode::Pgd,
            Self::Free(_) => AdvMode::Free,
        }
    }
}

impl Adversary for Attack {
    fn attack(
        &mut self,
        params: &mut ParamStore,
        epsilon: f32,
        is_first_attack: bool,
    ) -> Result<()> {
        match self {
            Self::Identity(a) => a.attack(params, epsilon, is_first_attack),
            Self::Fgsm(a) => a.attack(params, epsilon, is_first_attack),
            Self::Pgd(a) => a.attack(params, epsilon, is_first_attack),
            Self::Free(a) => a.attack(params, epsilon, is_first_attack),
        }
    }

    fn restore(&mut self, params: &mut ParamStore) -> Result<()> {
        match self {
            Self::Identity(a) => a.restore(params),
            Self::Fgsm(a) => a.restore(params),
            Self::Pgd(a) => a.restore(params),
            Self::Free(a) => a.restore(params),
        }
    }
}
