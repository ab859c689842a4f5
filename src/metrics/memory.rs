use super::{MetricsSink, Scalar};
use crate::Result;

/// Keeps every scalar in memory, in reporting order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    scalars: Vec<Scalar>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalars(&self) -> &[Scalar] {
        &self.scalars
    }

    /// Returns the `(step, value)` pairs of `series`.
    pub fn series(&self, series: &str) -> Vec<(usize, f32)> {
        self.scalars
            .iter()
            .filter(|s| s.series == series)
            .map(|s| (s.step, s.value))
            .collect()
    }
}

impl MetricsSink for MemorySink {
    fn add_scalar(&mut self, series: &str, value: f32, step: usize) -> Result<()> {
        self.scalars.push(Scalar {
            series: series.to_string(),
            step,
            value,
        });

        Ok(())
    }
}
