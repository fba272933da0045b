//! Per-unit-length RLGC extraction from two-port S-parameters.
//!
//! For every sweep sample the S-matrix is converted to Z and Y parameters and
//!
//! ```text
//! Zline  = sqrt(Z11 / Y11)
//! γ0·l   = atanh(1 / (Zline · Y11))
//! ```
//!
//! `atanh` only returns the principal branch, so `Im(γ0·l)` jumps whenever the
//! electrical length crosses a branch boundary. The phase is unwrapped across
//! frequency with period π/2 before `γ` is formed. This only works if the true
//! phase advances by less than π/4 between neighbouring samples; sparser
//! sweeps are rejected with [`NumericalError::SweepTooSparse`].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::circuits::twoport::{SParameters, TwoPort, C};
use crate::circuits::RLGC;
use crate::constants::angular_frequency;
use crate::errors::{ConfigError, RangeError, Result};
use crate::math::{unwrap_phase, Scalar};
use crate::sparams::{FrequencySweepResult, SMatrixSweep};
use crate::sweep::{is_strictly_increasing, nearest_index};

/// Unwrapping period of `Im(γ0·l)`.
pub const UNWRAP_PERIOD: Scalar = FRAC_PI_2;

/// Largest accepted phase step between adjacent samples, a margin below the
/// π/4 limit of unwrapping with period π/2.
pub const MAX_PHASE_STEP: Scalar = 0.9 * FRAC_PI_4;

/// Failures of the numerical post-processing.
#[derive(Debug, Error, PartialEq)]
pub enum NumericalError {
    /// `Zline·Y11 = ±1` makes `atanh(1/(Zline·Y11))` infinite.
    #[error("Zline*Y11 = {value} at {frequency:.6e} Hz is an arctanh singularity")]
    ArctanhSingularity {
        /// Sample frequency in Hz.
        frequency: Scalar,
        /// The offending product.
        value: Scalar,
    },
    /// An intermediate value is NaN or infinite.
    #[error("{quantity} is not finite at {frequency:.6e} Hz")]
    NonFinite {
        /// Which quantity.
        quantity: &'static str,
        /// Sample frequency in Hz.
        frequency: Scalar,
    },
    /// S, Z or Y parameters do not exist for this sample.
    #[error("{target} parameters undefined at {frequency:.6e} Hz")]
    ConversionFailed {
        /// Parameter set that could not be formed.
        target: &'static str,
        /// Sample frequency in Hz.
        frequency: Scalar,
    },
    /// The sweep is too coarse for phase unwrapping.
    #[error(
        "phase step {step:.4} rad between {f_low:.6e} Hz and {f_high:.6e} Hz exceeds {limit:.4} rad; use a denser sweep"
    )]
    SweepTooSparse {
        /// Lower sample frequency.
        f_low: Scalar,
        /// Upper sample frequency.
        f_high: Scalar,
        /// Unwrapped phase step.
        step: Scalar,
        /// Largest accepted step.
        limit: Scalar,
    },
    /// Extraction needs exactly two ports.
    #[error("RLGC extraction needs a two-port, got {0} ports")]
    NotTwoPort(usize),
    /// A driven port shows no incident wave, so its column is undefined.
    #[error("incident wave at port {port} vanishes at {frequency:.6e} Hz")]
    ZeroIncidentWave {
        /// Driven port.
        port: u32,
        /// Sample frequency in Hz.
        frequency: Scalar,
    },
    /// Frequencies are not strictly increasing.
    #[error("frequency axis is not strictly increasing")]
    UnorderedSweep,
}

/// Line parameters over the full sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RlgcCurve {
    frequencies: Arc<[Scalar]>,
    length: Scalar,
    gamma: Vec<C>,
    zline: Vec<C>,
    rlgc: Vec<RLGC>,
}

impl RlgcCurve {
    /// Frequency axis, shared with the S-parameter sweep.
    #[must_use]
    pub fn frequencies(&self) -> &Arc<[Scalar]> {
        &self.frequencies
    }

    /// Physical line length in meters.
    #[must_use]
    pub fn length(&self) -> Scalar {
        self.length
    }

    /// Unwrapped propagation constant per meter.
    #[must_use]
    pub fn gamma(&self) -> &[C] {
        &self.gamma
    }

    /// Characteristic impedance.
    #[must_use]
    pub fn zline(&self) -> &[C] {
        &self.zline
    }

    /// RLGC per sample.
    #[must_use]
    pub fn rlgc(&self) -> &[RLGC] {
        &self.rlgc
    }

    /// Resistance per meter over frequency.
    #[must_use]
    pub fn r(&self) -> Vec<Scalar> {
        self.rlgc.iter().map(|p| p.r_per_m).collect()
    }

    /// Inductance per meter over frequency.
    #[must_use]
    pub fn l(&self) -> Vec<Scalar> {
        self.rlgc.iter().map(|p| p.l_per_m).collect()
    }

    /// Conductance per meter over frequency.
    #[must_use]
    pub fn g(&self) -> Vec<Scalar> {
        self.rlgc.iter().map(|p| p.g_per_m).collect()
    }

    /// Capacitance per meter over frequency.
    #[must_use]
    pub fn c(&self) -> Vec<Scalar> {
        self.rlgc.iter().map(|p| p.c_per_m).collect()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rlgc.len()
    }

    /// True if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rlgc.is_empty()
    }
}

/// RLGC at one frequency, as reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RlgcReport {
    /// Requested target frequency in Hz.
    pub target_frequency: Scalar,
    /// Sweep sample actually used, nearest to the target.
    pub frequency: Scalar,
    /// Physical line length in meters.
    pub length: Scalar,
    /// Extracted parameters.
    pub rlgc: RLGC,
    /// Characteristic impedance.
    pub zline: C,
    /// Propagation constant per meter.
    pub gamma: C,
    /// Driven port if the S-matrix was completed by symmetry.
    pub symmetry_basis: Option<u32>,
}

impl fmt::Display for RlgcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RLGC line parameters")?;
        writeln!(f, "Physical line length: {:.3e} m", self.length)?;
        writeln!(f, "Extraction frequency {:.3} GHz", self.frequency / 1e9)?;
        if let Some(port) = self.symmetry_basis {
            writeln!(f, "S-parameters completed by symmetry from port {port}")?;
        }
        writeln!(f, "{}", self.rlgc)?;
        write!(f, "Zline [Ohm]: {:.3}", self.zline.re)
    }
}

/// Extracts RLGC of a uniform line of known physical length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RlgcExtractor {
    length: Scalar,
}

impl RlgcExtractor {
    /// Extractor for a line of `length` meters.
    pub fn new(length: Scalar) -> std::result::Result<Self, ConfigError> {
        if !(length > 0.0) || !length.is_finite() {
            return Err(ConfigError::InvalidParameter { name: "length", reason: format!("must be positive, got {length}") });
        }
        Ok(Self { length })
    }

    /// Line length in meters.
    #[must_use]
    pub fn length(&self) -> Scalar {
        self.length
    }

    /// RLGC over the full sweep with continuous phase.
    pub fn curve(&self, result: &FrequencySweepResult) -> Result<RlgcCurve> {
        self.curve_from_sweep(result.sweep())
    }

    /// Same as [`RlgcExtractor::curve`] for an untagged sweep.
    pub fn curve_from_sweep(&self, sweep: &SMatrixSweep) -> Result<RlgcCurve> {
        let _span = tracing::info_span!("rlgc_curve", samples = sweep.len(), length = self.length).entered();
        let freqs = sweep.frequencies();
        if sweep.port_count() != 2 {
            return Err(NumericalError::NotTwoPort(sweep.port_count()).into());
        }
        if !is_strictly_increasing(freqs) {
            return Err(NumericalError::UnorderedSweep.into());
        }
        let z0 = sweep.z0()[0];
        if sweep.z0()[1] != z0 {
            return Err(ConfigError::InvalidParameter {
                name: "z0",
                reason: format!("ports use different reference impedances {:?}", sweep.z0()),
            }
            .into());
        }

        let mut zline = Vec::with_capacity(sweep.len());
        let mut gl_re = Vec::with_capacity(sweep.len());
        let mut gl_im = Vec::with_capacity(sweep.len());
        for (k, &f) in freqs.iter().enumerate() {
            let s = sweep.two_port(k).ok_or(NumericalError::NotTwoPort(sweep.port_count()))?;
            let (z, gl) = line_sample(&s, z0, f)?;
            zline.push(z);
            gl_re.push(gl.re);
            gl_im.push(gl.im);
        }

        let phase = unwrap_phase(&gl_im, UNWRAP_PERIOD);
        check_density(freqs, &phase)?;

        let mut gamma = Vec::with_capacity(phase.len());
        let mut rlgc = Vec::with_capacity(phase.len());
        for (k, (&re, &im)) in gl_re.iter().zip(&phase).enumerate() {
            let g = C::new(re, im) / self.length;
            let params = RLGC::from_gamma_z(g, zline[k], angular_frequency(freqs[k]));
            if ![params.r_per_m, params.l_per_m, params.g_per_m, params.c_per_m].iter().all(|v| v.is_finite()) {
                return Err(NumericalError::NonFinite { quantity: "RLGC", frequency: freqs[k] }.into());
            }
            gamma.push(g);
            rlgc.push(params);
        }
        Ok(RlgcCurve { frequencies: Arc::clone(freqs), length: self.length, gamma, zline, rlgc })
    }

    /// RLGC at the sweep sample nearest to `target_hz`.
    ///
    /// The target must lie inside `[f_min, f_max)`; it is never clamped.
    pub fn extract(&self, result: &FrequencySweepResult, target_hz: Scalar) -> Result<RlgcReport> {
        let freqs = result.sweep().frequencies();
        let (Some(&min), Some(&max)) = (freqs.first(), freqs.last()) else {
            return Err(ConfigError::InvalidSweep("empty frequency axis".into()).into());
        };
        if !(target_hz < max) {
            return Err(RangeError::TargetAboveSweep { target: target_hz, max }.into());
        }
        if target_hz < min {
            return Err(RangeError::TargetBelowSweep { target: target_hz, min }.into());
        }
        let curve = self.curve(result)?;
        let k = nearest_index(freqs, target_hz).ok_or(RangeError::TargetBelowSweep { target: target_hz, min })?;
        let report = RlgcReport {
            target_frequency: target_hz,
            frequency: freqs[k],
            length: self.length,
            rlgc: curve.rlgc[k],
            zline: curve.zline[k],
            gamma: curve.gamma[k],
            symmetry_basis: result.basis_port(),
        };
        tracing::info!(
            frequency = report.frequency,
            r = report.rlgc.r_per_m,
            l = report.rlgc.l_per_m,
            g = report.rlgc.g_per_m,
            c = report.rlgc.c_per_m,
            zline = report.zline.re,
            "rlgc extracted"
        );
        Ok(report)
    }
}

/// `Zline` and the principal-branch `γ0·l` of one sample.
fn line_sample(s: &SParameters, z0: Scalar, f: Scalar) -> Result<(C, C)> {
    let chain = TwoPort::from_s(s, z0).ok_or(NumericalError::ConversionFailed { target: "ABCD", frequency: f })?;
    let z = chain.z_params().ok_or(NumericalError::ConversionFailed { target: "Z", frequency: f })?;
    let y = chain.y_params().ok_or(NumericalError::ConversionFailed { target: "Y", frequency: f })?;
    let (z11, y11) = (z[0][0], y[0][0]);
    let zline = (z11 / y11).sqrt();
    let product = zline * y11;
    if product.im == 0.0 && product.re.abs() == 1.0 {
        return Err(NumericalError::ArctanhSingularity { frequency: f, value: product.re }.into());
    }
    let gl = product.inv().atanh();
    if !(zline.is_finite() && gl.is_finite()) {
        return Err(NumericalError::NonFinite { quantity: "Zline or gamma", frequency: f }.into());
    }
    Ok((zline, gl))
}

/// The electrical length of a passive line grows with frequency, so every
/// unwrapped step must lie in `(0, MAX_PHASE_STEP]`. A true step beyond π/4
/// folds back into `[-π/4, π/4)` and shows up as a non-positive step.
fn check_density(freqs: &[Scalar], phase: &[Scalar]) -> std::result::Result<(), NumericalError> {
    for (k, w) in phase.windows(2).enumerate() {
        let step = w[1] - w[0];
        if !(step > 0.0 && step <= MAX_PHASE_STEP) {
            return Err(NumericalError::SweepTooSparse {
                f_low: freqs[k],
                f_high: freqs[k + 1],
                step,
                limit: MAX_PHASE_STEP,
            });
        }
    }
    Ok(())
}
