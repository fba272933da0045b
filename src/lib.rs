#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Fundamental physical constants used throughout the library.
pub mod constants;
/// Shared numerical primitives (scalar aliases, dedup, phase unwrapping).
pub mod math;
/// Polygon-per-layer layout model.
pub mod layout;
/// Dielectric and metal layer stack.
pub mod stackup;
/// Non-uniform rectilinear mesh generation.
pub mod mesh;
/// Port descriptors and excitation passes.
pub mod ports;
/// Two-port networks and transmission line models.
pub mod circuits;
/// Frequency sweep definition and post-processing helpers.
pub mod sweep;
/// Solver-ready model and excitation-pass orchestration.
pub mod simulation;
/// S-parameter assembly from per-pass port data.
pub mod sparams;
/// RLGC extraction with frequency-continuous phase.
pub mod rlgc;
/// Error types shared between modules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
