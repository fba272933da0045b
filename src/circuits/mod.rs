//! Two-port network parameters and distributed line models.

/// Two-port network representations and conversions.
pub mod twoport;
/// Transmission line primitives and ABCD parameterization.
pub mod transmission;

pub use transmission::{TransmissionLine, RLGC};
pub use twoport::{SParameters, TwoPort};
