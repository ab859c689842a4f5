use super::Adversary;
use crate::{Result, params::ParamStore};

/// The strategy that never perturbs anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Adversary for Identity {
    fn attack(&mut self, _: &mut ParamStore, _: f32, _: bool) -> Result<()> {
        Ok(())
    }

    fn restore(&mut self, _: &mut ParamStore) -> Result<()> {
        Ok(())
    }
}
