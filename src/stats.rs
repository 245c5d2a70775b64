//! Streaming mean and variance.

/// Welford accumulator for the mean and sample variance of a stream of values.
///
/// Used to reduce along the shuffle axis without materialising the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn update(&mut self, sample: f64) {
        self.count += 1;
        let n = self.count as f64;

        let delta = sample - self.mean;
        self.mean += delta / n;
        let delta2 = sample - self.mean;
        self.m2 += delta * delta2;
    }

    /// Mean of the values seen so far, `None` before the first update.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.mean)
    }

    /// Sample variance (n - 1). A single value has zero variance.
    pub fn variance(&self) -> Option<f64> {
        match self.count {
            0 => None,
            1 => Some(0.0),
            n => Some(self.m2 / (n - 1) as f64),
        }
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(libm::sqrt)
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
