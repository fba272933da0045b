//! Physical constants and unit helpers used by meshing and extraction.
//!
//! ## Accuracy
//!
//! The speed of light is exact by SI definition (2019 revision). The vacuum
//! permittivity and permeability are CODATA 2018 values with 11-12 significant
//! figures, which is far below the discretization error of any FDTD grid.

use std::f64::consts::PI;

/// Vacuum permittivity ε₀ in farads per meter (F/m).
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12;
/// Vacuum permeability μ₀ in henries per meter (H/m).
pub const VACUUM_PERMEABILITY: f64 = 1.256_637_062_12e-6;
/// Speed of light in vacuum _c_ in meters per second (m/s).
/// Exact value by SI definition (2019): 299,792,458 m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Drawing unit of layout coordinates (one micron) in meters.
pub const MICRON: f64 = 1.0e-6;

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * PI * hz
}

/// Returns the free-space wavelength in meters for a given frequency in hertz.
#[inline]
#[must_use]
pub fn wavelength_from_frequency(hz: f64) -> f64 {
    SPEED_OF_LIGHT / hz
}

/// Converts an energy level in dB into a linear ratio, `10^(dB/10)`.
///
/// Solvers stop once the residual field energy drops below this ratio of
/// its peak, so `-30 dB` becomes `1e-3`.
#[inline]
#[must_use]
pub fn energy_ratio_from_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn wavelength_matches_reference() {
        let freq = 1.0e9;
        let lambda = wavelength_from_frequency(freq);
        assert_relative_eq!(lambda, 0.299_792_458, max_relative = 1.0e-9);
    }

    #[test]
    fn energy_ratio_of_minus_thirty_db() {
        assert_relative_eq!(energy_ratio_from_db(-30.0), 1.0e-3, max_relative = 1.0e-12);
        assert_relative_eq!(energy_ratio_from_db(0.0), 1.0, max_relative = 1.0e-12);
    }

    #[test]
    fn light_speed_from_vacuum_constants() {
        let c = 1.0 / (VACUUM_PERMITTIVITY * VACUUM_PERMEABILITY).sqrt();
        assert_relative_eq!(c, SPEED_OF_LIGHT, max_relative = 1.0e-9);
    }
}
