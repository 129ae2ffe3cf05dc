//! Sample statistics used by the statistical detectors

/// Mean and Bessel-corrected standard deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl SampleStats {
    /// Statistics over `values`, or `None` with fewer than two values.
    ///
    /// A sample whose values are all identical gets a standard deviation of
    /// exactly 0.0; rounding in the mean must not leave a tiny non-zero spread.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let count = values.len();
        if count < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / count as f64;

        let first = values[0];
        let std_dev = if values.iter().all(|v| *v == first) {
            0.0
        } else {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        };

        Some(Self {
            count,
            mean,
            std_dev,
        })
    }

    /// Whether values differ at all (standardization is meaningful)
    pub fn has_spread(&self) -> bool {
        self.std_dev > 0.0
    }

    /// Standardized deviation of `value`; `None` when there is no spread.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        self.has_spread().then(|| (value - self.mean) / self.std_dev)
    }
}
