//! Shared numerical primitives: scalar aliases, tolerant ordering and phase unwrapping.

use num_complex::Complex;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Primary complex scalar type used for phasors and network parameters.
pub type CScalar = Complex<Scalar>;

/// Coordinates closer than this (in drawing units) are treated as one mesh line.
pub const COORD_TOLERANCE: Scalar = 1.0e-6;

/// Sorts `values` ascending and collapses runs whose neighbors differ by at
/// most `tol`. The first value of each run is kept, so the result only depends
/// on the input multiset.
#[must_use]
pub fn sorted_dedup(mut values: Vec<Scalar>, tol: Scalar) -> Vec<Scalar> {
    values.sort_by(|a, b| a.total_cmp(b));
    let mut out: Vec<Scalar> = Vec::with_capacity(values.len());
    for v in values {
        match out.last() {
            Some(&last) if v - last <= tol => {}
            _ => out.push(v),
        }
    }
    out
}

/// Unwraps a phase sequence so that adjacent samples never differ by more
/// than half of `period`.
///
/// Each step is folded into `[-period/2, period/2)`; a step that lands exactly
/// on `-period/2` while the raw step was positive is kept positive. Corrections
/// accumulate from the first sample onward, so the input must be ordered along
/// the swept variable.
#[must_use]
pub fn unwrap_phase(phase: &[Scalar], period: Scalar) -> Vec<Scalar> {
    let half = period / 2.0;
    let mut out = Vec::with_capacity(phase.len());
    let mut correction = 0.0;
    for (k, &p) in phase.iter().enumerate() {
        if k > 0 {
            let step = p - phase[k - 1];
            let mut folded = (step + half).rem_euclid(period) - half;
            if folded == -half && step > 0.0 {
                folded = half;
            }
            if step.abs() >= half {
                correction += folded - step;
            }
        }
        out.push(p + correction);
    }
    out
}
