//! Embedding-space adversarial perturbations.
//!
//! Every strategy targets a single parameter of the store, the input embedding table. The
//! single and multi step strategies perturb that parameter in place and must be restored
//! before the optimizer steps, while the free strategy keeps its own additive perturbation
//! that the model adds at forward time.

mod adversary;
mod attack;
mod direction;
mod fgsm;
mod free;
mod identity;
mod pgd;

pub use adversary::Adversary;
pub use attack::{AdvMode, Attack};
pub use fgsm::Fgsm;
pub use free::Free;
pub use identity::Identity;
pub use pgd::Pgd;
