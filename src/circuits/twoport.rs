//! Two-port network parameters and the conversions between them.
//!
//! All conversions assume the same real reference impedance on both ports,
//! which is how the field solver's lumped ports are set up.

use num_complex::Complex;

use crate::math::Scalar;

/// Convenience alias for complex scalars.
pub type C = Complex<Scalar>;
/// Row-major 2×2 parameter matrix, `m[row][col]`.
pub type Matrix2 = [[C; 2]; 2];

const ONE: C = C::new(1.0, 0.0);
const TWO: C = C::new(2.0, 0.0);

/// Chain (ABCD) representation of a two-port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPort {
    /// A element.
    pub a: C,
    /// B element.
    pub b: C,
    /// C element.
    pub c: C,
    /// D element.
    pub d: C,
}

impl TwoPort {
    /// Constructs a two-port from explicit ABCD elements.
    #[must_use]
    pub fn from_abcd(a: C, b: C, c: C, d: C) -> Self {
        Self { a, b, c, d }
    }

    /// `AD - BC`, equal to one for reciprocal networks.
    #[must_use]
    pub fn determinant(&self) -> C {
        self.a * self.d - self.b * self.c
    }

    /// `self` followed by `rhs`.
    #[must_use]
    pub fn cascade(&self, rhs: &TwoPort) -> TwoPort {
        TwoPort {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
        }
    }

    /// Impedance matrix; `None` when `C == 0` (no finite open-circuit impedances).
    #[must_use]
    pub fn z_params(&self) -> Option<Matrix2> {
        if self.c.norm() == 0.0 {
            return None;
        }
        let inv_c = ONE / self.c;
        Some([[self.a * inv_c, self.determinant() * inv_c], [inv_c, self.d * inv_c]])
    }

    /// Admittance matrix; `None` when `B == 0` (no finite short-circuit admittances).
    #[must_use]
    pub fn y_params(&self) -> Option<Matrix2> {
        if self.b.norm() == 0.0 {
            return None;
        }
        let inv_b = ONE / self.b;
        Some([[self.d * inv_b, -self.determinant() * inv_b], [-inv_b, self.a * inv_b]])
    }

    /// Scattering parameters for reference impedance `z0`.
    #[must_use]
    pub fn to_s(&self, z0: Scalar) -> Option<SParameters> {
        let z0c = C::new(z0, 0.0);
        let bz = self.b / z0c;
        let cz = self.c * z0c;
        let den = self.a + bz + cz + self.d;
        if den.norm() == 0.0 {
            return None;
        }
        Some(SParameters {
            s11: (self.a + bz - cz - self.d) / den,
            s12: TWO * self.determinant() / den,
            s21: TWO / den,
            s22: (-self.a + bz - cz + self.d) / den,
        })
    }

    /// Chain parameters from scattering parameters; `None` when `S21 == 0`.
    #[must_use]
    pub fn from_s(s: &SParameters, z0: Scalar) -> Option<Self> {
        if s.s21.norm() == 0.0 {
            return None;
        }
        let z0c = C::new(z0, 0.0);
        let cross = s.s12 * s.s21;
        let den = TWO * s.s21;
        Some(Self {
            a: ((ONE + s.s11) * (ONE - s.s22) + cross) / den,
            b: z0c * ((ONE + s.s11) * (ONE + s.s22) - cross) / den,
            c: ((ONE - s.s11) * (ONE - s.s22) - cross) / (den * z0c),
            d: ((ONE - s.s11) * (ONE + s.s22) + cross) / den,
        })
    }
}

/// Scattering parameters of a two-port under one real reference impedance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SParameters {
    /// Reflection at port 1.
    pub s11: C,
    /// Reverse transmission.
    pub s12: C,
    /// Forward transmission.
    pub s21: C,
    /// Reflection at port 2.
    pub s22: C,
}

impl SParameters {
    /// Completes a half-measured two-port by mirroring the column of the
    /// excited port onto the other: exciting port 1 gives `S22 := S11` and
    /// `S12 := S21`, exciting port 2 gives `S11 := S22` and `S21 := S12`.
    #[must_use]
    pub fn mirrored_from(column: [C; 2], basis_port: usize) -> Self {
        let [c0, c1] = column;
        if basis_port == 2 {
            // column = [S12, S22]
            Self { s11: c1, s12: c0, s21: c0, s22: c1 }
        } else {
            // column = [S11, S21]
            Self { s11: c0, s12: c1, s21: c1, s22: c0 }
        }
    }

    /// As a row-major matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix2 {
        [[self.s11, self.s12], [self.s21, self.s22]]
    }

    /// Returns |S21| in dB.
    #[must_use]
    pub fn s21_db(&self) -> Scalar {
        20.0 * self.s21.norm().max(1e-300).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(z: C) -> TwoPort {
        TwoPort::from_abcd(ONE, z, C::default(), ONE)
    }

    fn shunt(y: C) -> TwoPort {
        TwoPort::from_abcd(ONE, C::default(), y, ONE)
    }

    #[test]
    fn series_resistor_s_parameters() {
        let s = series(C::new(50.0, 0.0)).to_s(50.0).unwrap();
        assert_relative_eq!(s.s21.norm(), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(s.s11.re, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(s.s12.re, s.s21.re, epsilon = 1e-12);
        assert_relative_eq!(s.s21_db(), 20.0 * (2.0_f64 / 3.0).log10(), epsilon = 1e-12);
    }

    #[test]
    fn s_to_chain_roundtrip_of_a_tee() {
        let t = series(C::new(10.0, 5.0)).cascade(&shunt(C::new(1e-3, -2e-3))).cascade(&series(C::new(3.0, 0.0)));
        let back = TwoPort::from_s(&t.to_s(50.0).unwrap(), 50.0).unwrap();
        for (x, y) in [(back.a, t.a), (back.b, t.b), (back.c, t.c), (back.d, t.d)] {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-9);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn z_and_y_of_a_pi_section_are_inverse() {
        let t = shunt(C::new(2e-3, 1e-3)).cascade(&series(C::new(20.0, 8.0))).cascade(&shunt(C::new(1e-3, 0.0)));
        let z = t.z_params().unwrap();
        let y = t.y_params().unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let prod = z[i][0] * y[0][j] + z[i][1] * y[1][j];
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(prod.re, expected, epsilon = 1e-9);
                assert_relative_eq!(prod.im, 0.0, epsilon = 1e-9);
            }
        }
        // Shunt elements at the ports show up directly in the short-circuit admittances.
        assert_relative_eq!(y[0][0].re, 2e-3 + (1.0 / C::new(20.0, 8.0)).re, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_conversions_return_none() {
        assert!(series(C::new(5.0, 0.0)).z_params().is_none());
        assert!(shunt(C::new(1e-3, 0.0)).y_params().is_none());
        let blocked = SParameters { s11: ONE, s12: C::default(), s21: C::default(), s22: ONE };
        assert!(TwoPort::from_s(&blocked, 50.0).is_none());
    }

    #[test]
    fn mirroring_makes_the_network_symmetric() {
        let col = [C::new(0.1, -0.2), C::new(0.7, 0.4)];
        let s = SParameters::mirrored_from(col, 1);
        assert_eq!(s.s11, s.s22);
        assert_eq!(s.s12, s.s21);
        let s = SParameters::mirrored_from(col, 2);
        assert_eq!(s.s22, col[1]);
        assert_eq!(s.s11, s.s22);
        assert_eq!(s.s21, s.s12);
    }
}
