//! Sample statistics used for outlier rejection.

const ROUNDING_SLACK: f64 = 1e-12;

/// Population mean and standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl MeanStd {
    /// Single pass over the samples. `None` for an empty sample.
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (mut sum, mut sq_sum, mut count) = (0.0, 0.0, 0usize);
        for v in samples {
            sum += v;
            sq_sum += v * v;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let mean = sum / n;
        // Cancellation can push the variance slightly negative.
        let variance = (sq_sum / n - mean * mean).max(0.0);
        Some(Self {
            mean,
            std: variance.sqrt(),
            count,
        })
    }

    /// True if `value` lies within `mean ± k·std` (bounds inclusive).
    ///
    /// The band is widened by a few ulps of the mean so that a constant sample
    /// still contains its own values after summation rounding.
    pub fn within(&self, value: f64, k: f64) -> bool {
        let half_width = k * self.std + ROUNDING_SLACK * self.mean.abs().max(1.0);
        value >= self.mean - half_width && value <= self.mean + half_width
    }
}

/// Median of the values, averaging the two central ones for even counts.
///
/// Sorts `values` in place. `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(0.5 * (values[mid - 1] + values[mid]))
    }
}
