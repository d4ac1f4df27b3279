/// Piecewise-constant distribution over a discrete set of non-negative weights.
///
/// Built once from the weights, sampled by inverse CDF. When every weight is
/// zero the distribution is uniform over its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution1D {
    func: Vec<f32>,
    /// Inclusive prefix sums, `cdf[i] = f[0] + .. + f[i]`.
    cdf: Vec<f32>,
    /// Sum of all weights, equal to the last `cdf` entry.
    integral: f32,
}

impl Distribution1D {
    /// Build from weights. Negative or non-finite weights are treated as zero.
    pub fn new(weights: &[f32]) -> Self {
        let func: Vec<f32> = weights
            .iter()
            .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
            .collect();

        let mut running = 0.0;
        let cdf: Vec<f32> = func
            .iter()
            .map(|&w| {
                running += w;
                running
            })
            .collect();

        Self {
            func,
            cdf,
            integral: running,
        }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    pub fn is_empty(&self) -> bool {
        self.func.is_empty()
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn cdf(&self) -> &[f32] {
        &self.cdf
    }

    /// Draw an index for `u` in `[0, 1)` along with its probability.
    ///
    /// Returns the smallest index whose cumulative weight exceeds
    /// `u * integral`. `None` only for an empty distribution.
    pub fn sample(&self, u: f32) -> Option<(usize, f32)> {
        let n = self.count();
        if n == 0 {
            return None;
        }

        let u = u.clamp(0.0, 1.0);
        if self.integral <= 0.0 {
            let index = ((u * n as f32) as usize).min(n - 1);
            return Some((index, 1.0 / n as f32));
        }

        let target = u * self.integral;
        let mut index = self.cdf.partition_point(|&c| c <= target);
        if index >= n {
            // u rounded up to the full integral; take the last entry that can
            // actually be chosen.
            index = self.func.iter().rposition(|&w| w > 0.0).unwrap_or(n - 1);
        }

        Some((index, self.pdf(index)))
    }

    /// Probability of drawing `index`, independent of any sample.
    pub fn pdf(&self, index: usize) -> f32 {
        debug_assert!(index < self.count(), "index {} out of range", index);
        let Some(&weight) = self.func.get(index) else {
            return 0.0;
        };

        if self.integral > 0.0 {
            weight / self.integral
        } else {
            1.0 / self.count() as f32
        }
    }
}
