//! Frequency sweep definition and post-processing helpers.

use std::sync::Arc;

use num_complex::Complex;

use crate::errors::ConfigError;
use crate::math::Scalar;

/// Linear frequency sweep requested from the solver.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSettings {
    /// First frequency in Hz.
    pub f_start: Scalar,
    /// Last frequency in Hz.
    pub f_stop: Scalar,
    /// Number of samples, including both ends.
    pub points: usize,
}

impl SweepSettings {
    /// Validates `0 < f_start < f_stop` and at least two points.
    pub fn new(f_start: Scalar, f_stop: Scalar, points: usize) -> Result<Self, ConfigError> {
        if !(f_start > 0.0) || !(f_stop > f_start) || !f_stop.is_finite() {
            return Err(ConfigError::InvalidSweep(format!(
                "need 0 < f_start < f_stop, got [{f_start}, {f_stop}]"
            )));
        }
        if points < 2 {
            return Err(ConfigError::InvalidSweep(format!("need at least 2 points, got {points}")));
        }
        Ok(Self { f_start, f_stop, points })
    }

    /// Sample frequencies in Hz, shared by every consumer of the sweep.
    #[must_use]
    pub fn frequencies(&self) -> Arc<[Scalar]> {
        linspace(self.f_start, self.f_stop, self.points).into()
    }

    /// Center of the band, `(f_start + f_stop) / 2`.
    #[must_use]
    pub fn center(&self) -> Scalar {
        0.5 * (self.f_start + self.f_stop)
    }

    /// Half of the band width, `(f_stop - f_start) / 2`.
    #[must_use]
    pub fn half_bandwidth(&self) -> Scalar {
        0.5 * (self.f_stop - self.f_start)
    }
}

/// Generates `n` linearly spaced samples in [start, stop].
///
/// The last sample is `stop` exactly.
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            let mut v: Vec<Scalar> = (0..n).map(|i| start + step * i as Scalar).collect();
            v[n - 1] = stop;
            v
        }
    }
}

/// Index of the sample closest to `value`; the lower index wins ties.
#[must_use]
pub fn nearest_index(samples: &[Scalar], value: Scalar) -> Option<usize> {
    samples
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .map(|(i, _)| i)
}

/// True if every sample is larger than its predecessor.
#[must_use]
pub fn is_strictly_increasing(samples: &[Scalar]) -> bool {
    samples.windows(2).all(|w| w[1] > w[0])
}

/// Magnitude in dB (20*log10(|x|)), clamping very small values.
#[must_use]
pub fn mag_db(values: impl IntoIterator<Item = Complex<Scalar>>) -> Vec<Scalar> {
    const MIN: Scalar = 1e-300;
    values
        .into_iter()
        .map(|v| 20.0 * (v.norm().max(MIN)).log10())
        .collect()
}

/// Phase in degrees of complex sequence.
#[must_use]
pub fn phase_deg(values: impl IntoIterator<Item = Complex<Scalar>>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.arg().to_degrees()).collect()
}
