use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Result, TrainErr};

/// Samples `n` values from a normal distribution.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `n` - The amount of values to sample.
/// * `mean` - The mean of the distribution.
/// * `std_dev` - The standard deviation of the distribution.
///
/// # Returns
/// The samples or an error if `std_dev` is not finite.
pub fn normal<R: Rng>(rng: &mut R, n: usize, mean: f32, std_dev: f32) -> Result<Vec<f32>> {
    let distribution = Normal::new(mean, std_dev)
        .map_err(|e| TrainErr::InvalidConfig(format!("invalid weight distribution: {e}")))?;

    Ok(distribution.sample_iter(rng).take(n).collect())
}

/// Samples `n` values using Xavier normal initialization.
pub fn xavier<R: Rng>(rng: &mut R, n: usize, fan_in: usize, fan_out: usize) -> Result<Vec<f32>> {
    let std_dev = (2. / (fan_in + fan_out) as f32).sqrt();
    normal(rng, n, 0., std_dev)
}
