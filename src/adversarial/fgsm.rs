use log::debug;

use super::{Adversary, direction};
use crate::{Result, params::ParamStore};

/// Single step attack: one `epsilon` sized step along the normalized gradient.
#[derive(Debug, Clone)]
pub struct Fgsm {
    target: String,
}

impl Fgsm {
    /// Creates a new `Fgsm` attacking the parameter named `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Adversary for Fgsm {
    fn attack(
        &mut self,
        params: &mut ParamStore,
        epsilon: f32,
        is_first_attack: bool,
    ) -> Result<()> {
        let param = params.get_mut(&self.target)?;
        if is_first_attack {
            param.save_backup();
        }

        let (value, grad) = param.value_mut_and_grad();
        if !direction::ascend(value, grad, epsilon) {
            debug!(param = self.target.as_str(); "zero gradient, skipping perturbation");
        }

        Ok(())
    }

    fn restore(&mut self, params: &mut ParamStore) -> Result<()> {
        params.get_mut(&self.target)?.restore_backup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TrainErr, params::Parameter};

    fn store(grad: &[f32]) -> ParamStore {
        let mut store = ParamStore::new();
        let mut p = Parameter::new("embedding", vec![2, 2], vec![1., 2., 3., 4.]).unwrap();
        p.grad_mut().copy_from_slice(grad);
        store.register(p).unwrap();
        store
    }

    #[test]
    fn perturbs_along_the_unit_gradient() {
        let mut params = store(&[0., 3., 0., 4.]);
        let mut fgsm = Fgsm::new("embedding");
        fgsm.attack(&mut params, 0.5, true).unwrap();

        let value = params.get("embedding").unwrap().value();
        let expected = [1., 2.3, 3., 4.4];
        assert!(value.iter().zip(expected).all(|(v, e)| (v - e).abs() < 1e-6));

        fgsm.restore(&mut params).unwrap();
        assert_eq!(params.get("embedding").unwrap().value(), [1., 2., 3., 4.]);
    }

    #[test]
    fn zero_gradient_still_opens_a_session() {
        let mut params = store(&[0.; 4]);
        let mut fgsm = Fgsm::new("embedding");
        fgsm.attack(&mut params, 0.5, true).unwrap();
        assert_eq!(params.get("embedding").unwrap().value(), [1., 2., 3., 4.]);
        assert!(fgsm.restore(&mut params).is_ok());
    }

    #[test]
    fn restore_without_attack_fails() {
        let mut params = store(&[1.; 4]);
        let err = Fgsm::new("embedding").restore(&mut params).unwrap_err();
        assert!(matches!(err, TrainErr::NoBackup { .. }));
    }

    #[test]
    fn unknown_target_fails() {
        let mut params = store(&[1.; 4]);
        assert!(Fgsm::new("missing").attack(&mut params, 0.1, true).is_err());
    }
}
