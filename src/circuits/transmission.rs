//! Uniform transmission lines described by per-unit-length RLGC parameters.

use std::fmt;

use crate::math::Scalar;

use super::twoport::{TwoPort, C};

/// Distributed RLGC parameters per unit length.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RLGC {
    /// Series resistance per meter (Ω/m).
    pub r_per_m: Scalar,
    /// Series inductance per meter (H/m).
    pub l_per_m: Scalar,
    /// Shunt conductance per meter (S/m).
    pub g_per_m: Scalar,
    /// Shunt capacitance per meter (F/m).
    pub c_per_m: Scalar,
}

impl RLGC {
    /// Lossless line parameters (R=G=0).
    #[must_use]
    pub fn lossless(l_per_m: Scalar, c_per_m: Scalar) -> Self {
        Self { r_per_m: 0.0, l_per_m, g_per_m: 0.0, c_per_m }
    }

    /// Recovers RLGC from the propagation constant and characteristic
    /// impedance at angular frequency `omega`: `γ·Z = R + jωL` and
    /// `γ/Z = G + jωC`.
    #[must_use]
    pub fn from_gamma_z(gamma: C, z: C, omega: Scalar) -> Self {
        let series = gamma * z;
        let shunt = gamma / z;
        Self {
            r_per_m: series.re,
            l_per_m: series.im / omega,
            g_per_m: shunt.re,
            c_per_m: shunt.im / omega,
        }
    }

    /// Series impedance per meter `R + jωL`.
    #[must_use]
    pub fn series_impedance(&self, omega: Scalar) -> C {
        C::new(self.r_per_m, omega * self.l_per_m)
    }

    /// Shunt admittance per meter `G + jωC`.
    #[must_use]
    pub fn shunt_admittance(&self, omega: Scalar) -> C {
        C::new(self.g_per_m, omega * self.c_per_m)
    }

    /// Propagation constant `γ = √((R + jωL)(G + jωC))`.
    #[must_use]
    pub fn propagation_constant(&self, omega: Scalar) -> C {
        (self.series_impedance(omega) * self.shunt_admittance(omega)).sqrt()
    }

    /// Characteristic impedance `Z = √((R + jωL)/(G + jωC))`.
    #[must_use]
    pub fn characteristic_impedance(&self, omega: Scalar) -> C {
        (self.series_impedance(omega) / self.shunt_admittance(omega)).sqrt()
    }
}

impl fmt::Display for RLGC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "R   [Ohm/m]: {:.3e}", self.r_per_m)?;
        writeln!(f, "L'  [H/m]  : {:.3e}", self.l_per_m)?;
        writeln!(f, "G   [S/m]  : {:.3e}", self.g_per_m)?;
        write!(f, "C'  [F/m]  : {:.3e}", self.c_per_m)
    }
}

/// Uniform line of finite length.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionLine {
    /// Physical length in meters.
    pub length_m: Scalar,
    /// Distributed parameters.
    pub rlgc: RLGC,
}

impl TransmissionLine {
    /// Line of length `length_m` with the given RLGC per-unit parameters.
    #[must_use]
    pub fn new(length_m: Scalar, rlgc: RLGC) -> Self {
        Self { length_m, rlgc }
    }

    /// Lossless line shortcut.
    #[must_use]
    pub fn lossless(length_m: Scalar, l_per_m: Scalar, c_per_m: Scalar) -> Self {
        Self::new(length_m, RLGC::lossless(l_per_m, c_per_m))
    }

    /// Chain matrix `[[cosh γl, Z sinh γl], [sinh γl / Z, cosh γl]]`.
    ///
    /// Requires a non-zero shunt admittance, i.e. `omega > 0` or `G > 0`.
    #[must_use]
    pub fn to_twoport(&self, omega: Scalar) -> TwoPort {
        let gl = self.rlgc.propagation_constant(omega) * self.length_m;
        let z = self.rlgc.characteristic_impedance(omega);
        let (ch, sh) = (gl.cosh(), gl.sinh());
        TwoPort::from_abcd(ch, z * sh, sh / z, ch)
    }
}
