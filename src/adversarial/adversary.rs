use crate::{Result, params::ParamStore};

/// An attack session over one parameter of a `ParamStore`.
pub trait Adversary {
    /// Perturbs the target along its current gradient.
    ///
    /// # Arguments
    /// * `params` - The store holding the target parameter.
    /// * `epsilon` - The perturbation budget.
    /// * `is_first_attack` - Whether this call opens the session, snapshotting the clean value.
    ///
    /// # Returns
    /// An error if the target doesn't exist or if a later call finds no open session.
    fn attack(&mut self, params: &mut ParamStore, epsilon: f32, is_first_attack: bool)
    -> Result<()>;

    /// Closes the session, putting back the clean value of the target.
    ///
    /// # Returns
    /// An error if no session is open.
    fn restore(&mut self, params: &mut ParamStore) -> Result<()>;
}
