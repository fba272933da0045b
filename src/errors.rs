//! Shared error types used across submodules.

use thiserror::Error;

use crate::math::Scalar;
use crate::mesh::GeometryError;
use crate::rlgc::NumericalError;
use crate::simulation::SolverError;

/// Invalid user parameters, detected while the model is being set up.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Two ports were registered under the same number.
    #[error("duplicate port number {0}")]
    DuplicatePort(u32),
    /// Port numbers start at one.
    #[error("port number must be at least 1")]
    ZeroPortNumber,
    /// A direction string outside `{x, -x, y, -y, z, -z}`.
    #[error("invalid port direction `{0}`")]
    InvalidDirection(String),
    /// A boundary-condition string that does not name a known condition.
    #[error("invalid boundary condition `{0}`")]
    InvalidBoundary(String),
    /// A port number referenced by an excitation pass was never registered.
    #[error("unknown port {0}")]
    UnknownPort(u32),
    /// An excitation pass without any active port.
    #[error("excitation pass does not drive any port")]
    EmptyExcitation,
    /// The same set of ports was scheduled twice, which would reuse a result path.
    #[error("excitation pass {0:?} is scheduled more than once")]
    DuplicatePass(Vec<u32>),
    /// A port whose S-matrix column was neither measured nor derivable by symmetry.
    #[error("port {0} was never excited and its S-matrix column cannot be assumed")]
    UnexcitedPort(u32),
    /// A sweep whose bounds are not strictly increasing or has too few points.
    #[error("invalid frequency sweep: {0}")]
    InvalidSweep(String),
    /// A port whose source layer carries no polygon.
    #[error("port {port} has no geometry on layer {layer}")]
    MissingPortGeometry {
        /// Port number.
        port: u32,
        /// Source layer that was searched.
        layer: u32,
    },
    /// A port that targets a metal missing from the stack.
    #[error("port {port} targets unknown metal `{metal}`")]
    UnknownMetal {
        /// Port number.
        port: u32,
        /// Requested metal name.
        metal: String,
    },
    /// The layer stack is empty or out of z order.
    #[error("invalid layer stack: {0}")]
    InvalidStack(String),
    /// Any other inconsistent parameter.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// A frequency outside the range the data can answer for.
#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    /// Extraction target at or beyond the last sweep sample.
    #[error("target frequency {target:.6e} Hz is not below the sweep maximum {max:.6e} Hz")]
    TargetAboveSweep {
        /// Requested target in Hz.
        target: Scalar,
        /// Highest sweep frequency in Hz.
        max: Scalar,
    },
    /// Extraction target below the first sweep sample.
    #[error("target frequency {target:.6e} Hz is below the sweep minimum {min:.6e} Hz")]
    TargetBelowSweep {
        /// Requested target in Hz.
        target: Scalar,
        /// Lowest sweep frequency in Hz.
        min: Scalar,
    },
    /// Requested sweep not covered by the excitation spectrum of the solver run.
    #[error("sweep [{start:.6e}, {stop:.6e}] Hz exceeds the excited band [{band_start:.6e}, {band_stop:.6e}] Hz")]
    SweepOutsideExcitation {
        /// Requested sweep start.
        start: Scalar,
        /// Requested sweep stop.
        stop: Scalar,
        /// Lowest excited frequency.
        band_start: Scalar,
        /// Highest excited frequency.
        band_stop: Scalar,
    },
    /// Raw data does not contain the samples the sweep needs.
    #[error("port data has {found} samples, expected {expected}")]
    SampleCount {
        /// Samples required.
        expected: usize,
        /// Samples present.
        found: usize,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum CpwError {
    /// Wraps configuration errors.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Wraps meshing and layout errors.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Wraps frequency range errors.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Wraps numerical failures of the extraction.
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    /// Wraps failures reported by the external solver.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Convenience result alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, CpwError>;
