//! Control-chart statistics.
//!
//! Limits are `mean ± k·σ` over the non-null values of one metric, where σ is
//! the population standard deviation (divide by `n`). The mean is rounded to
//! one decimal *before* σ is computed against it, matching the figures the
//! dashboard has always shown. With fewer than two values σ is 0.

use serde::Serialize;

/// Default band width in standard deviations.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Mean and control limits for one metric series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    pub mean: f64,
    pub ucl: f64,
    pub lcl: f64,
}

impl ControlLimits {
    pub const EMPTY: Self = Self {
        mean: 0.0,
        ucl: 0.0,
        lcl: 0.0,
    };

    /// Compute limits for `values` with a band of `sigma` deviations.
    #[must_use]
    pub fn compute(values: &[f64], sigma: f64) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        // a negative or NaN band would put LCL above UCL
        let sigma = sigma.max(0.0);
        let mean = mean(values);
        let sd = population_stddev(values, mean);
        Self {
            mean,
            ucl: round1(sigma.mul_add(sd, mean)),
            lcl: round1(sigma.mul_add(-sd, mean).max(0.0)),
        }
    }
}

/// Arithmetic mean rounded to one decimal; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    round1(values.iter().sum::<f64>() / n)
}

/// Population standard deviation around `center`; 0 below two values.
#[must_use]
pub fn population_stddev(values: &[f64], center: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - center).powi(2)).sum();
    (sum_sq / n).sqrt()
}

/// Round half away from zero to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_value_example() {
        let limits = ControlLimits::compute(&[5.0, 7.0, 3.0], DEFAULT_SIGMA);
        assert!(approx(limits.mean, 5.0));
        assert!(approx(limits.ucl, 8.3));
        assert!(approx(limits.lcl, 1.7));
        let sd = population_stddev(&[5.0, 7.0, 3.0], 5.0);
        assert!((sd - 1.633).abs() < 1e-3);
    }

    #[test]
    fn empty_series_is_all_zero() {
        assert_eq!(ControlLimits::compute(&[], DEFAULT_SIGMA), ControlLimits::EMPTY);
    }

    #[test]
    fn single_value_has_zero_width_band() {
        let limits = ControlLimits::compute(&[4.25], DEFAULT_SIGMA);
        assert!(approx(limits.mean, 4.3));
        assert!(approx(limits.ucl, 4.3));
        assert!(approx(limits.lcl, 4.3));
    }

    #[test]
    fn lower_limit_is_floored_at_zero() {
        let limits = ControlLimits::compute(&[0.5, 1.0, 30.0], DEFAULT_SIGMA);
        assert!(approx(limits.lcl, 0.0));
        assert!(limits.ucl > limits.mean);
    }

    #[test]
    fn deviation_uses_rounded_mean() {
        // raw mean 1.05 rounds to 1.1; deviation is taken around 1.1
        let values = [1.0, 1.1];
        let sd = population_stddev(&values, mean(&values));
        assert!(approx(sd, (0.01_f64 / 2.0).sqrt()));
    }

    #[test]
    fn sigma_is_configurable() {
        let limits = ControlLimits::compute(&[5.0, 7.0, 3.0], 3.0);
        assert!(approx(limits.ucl, 9.9));
        assert!(approx(limits.lcl, 0.1));
    }

    #[test]
    fn negative_band_width_never_inverts_limits() {
        for sigma in [-2.0, f64::NAN] {
            let limits = ControlLimits::compute(&[5.0, 7.0, 3.0], sigma);
            assert!(limits.lcl <= limits.mean && limits.mean <= limits.ucl);
            assert!(approx(limits.ucl, 5.0));
            assert!(approx(limits.lcl, 5.0));
        }
    }
}
