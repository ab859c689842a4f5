use serde::{Deserialize, Serialize};

use crate::Result;

/// A single reported value of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub series: String,
    pub step: usize,
    pub value: f32,
}

/// A destination for scalar series keyed by (series name, step).
pub trait MetricsSink {
    /// Records `value` for `series` at `step`.
    fn add_scalar(&mut self, series: &str, value: f32, step: usize) -> Result<()>;

    /// Makes sure every recorded value reached its destination.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn add_scalar(&mut self, series: &str, value: f32, step: usize) -> Result<()> {
        (**self).add_scalar(series, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
