//! Non-uniform rectilinear mesh generation for the field solver.
//!
//! Every polygon edge coordinate becomes a mesh line so the solver's
//! staircased metal matches the drawn geometry. Gaps between edge lines are
//! split uniformly, using the refined cell size inside conductor extents and
//! the wavelength-derived maximum elsewhere, and both ends of each axis are
//! extended through a fixed margin and an air region with geometrically graded
//! cells.

mod axis;
mod generator;

use thiserror::Error;

pub use axis::MeshAxis;
pub use generator::{Mesh, MeshGenerator};

use crate::constants::{wavelength_from_frequency, MICRON};
use crate::errors::ConfigError;
use crate::layout::LayerNumber;
use crate::math::Scalar;

/// Default ratio between a graded cell and its inward neighbor.
pub const DEFAULT_GROWTH_RATIO: Scalar = 1.3;
/// Fewest cells per wavelength the wavelength-derived cell size may use.
pub const MIN_CELLS_PER_WAVELENGTH: Scalar = 10.0;
/// Air region added beyond the margin, as a fraction of the free-space wavelength.
pub const AIR_MARGIN_WAVELENGTHS: Scalar = 0.1;

/// Malformed geometry or meshing parameters.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// Maximum cell size is zero, negative or not finite.
    #[error("maximum cell size must be positive, got {0}")]
    NonPositiveCellSize(Scalar),
    /// Refined cell size is not positive or larger than the maximum.
    #[error("refined cell size {refined} must lie in (0, {max}]")]
    RefinedExceedsMax {
        /// Refined (conductor) cell size.
        refined: Scalar,
        /// Maximum cell size.
        max: Scalar,
    },
    /// Growth ratio of the graded margin cells must exceed one.
    #[error("growth ratio must be greater than 1, got {0}")]
    InvalidGrowthRatio(Scalar),
    /// Margins must be finite and non-negative.
    #[error("margin `{name}` must be non-negative, got {value}")]
    NegativeMargin {
        /// Which margin.
        name: &'static str,
        /// Offending value.
        value: Scalar,
    },
    /// A layer that should drive the mesh carries no polygon.
    #[error("layer {0} is expected to drive meshing but has no polygons")]
    EmptyLayer(LayerNumber),
    /// Nothing at all to mesh.
    #[error("no layers drive the mesh")]
    NoMeshLayers,
    /// Polygon with fewer than three distinct vertices.
    #[error("polygon on layer {layer} has only {vertices} vertices")]
    DegeneratePolygon {
        /// Layer of the polygon.
        layer: LayerNumber,
        /// Vertex count after removing the closing vertex.
        vertices: usize,
    },
    /// Polygon outline that encloses no area.
    #[error("polygon on layer {layer} has zero area")]
    ZeroAreaPolygon {
        /// Layer of the polygon.
        layer: LayerNumber,
    },
    /// Polygon vertex with NaN or infinite coordinate.
    #[error("polygon on layer {layer} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Layer of the polygon.
        layer: LayerNumber,
    },
    /// Mesh lines are not strictly increasing.
    #[error("mesh lines must be strictly increasing (index {0})")]
    NonMonotonicAxis(usize),
}

/// Cell-size and margin parameters in drawing units.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSettings {
    /// Largest cell allowed anywhere.
    pub max_cell: Scalar,
    /// Largest cell allowed inside conductor extents.
    pub refined_cell: Scalar,
    /// Distance from the geometry to the first fixed outer line.
    pub margin: Scalar,
    /// Additional air region beyond the margin.
    pub air_margin: Scalar,
    /// Maximum ratio of a graded outer cell to its inward neighbor.
    pub growth_ratio: Scalar,
}

impl MeshSettings {
    /// Settings with explicit cell sizes and margins, using [`DEFAULT_GROWTH_RATIO`].
    #[must_use]
    pub fn new(max_cell: Scalar, refined_cell: Scalar, margin: Scalar, air_margin: Scalar) -> Self {
        Self { max_cell, refined_cell, margin, air_margin, growth_ratio: DEFAULT_GROWTH_RATIO }
    }

    /// Derives the maximum cell size from the shortest wavelength in the stack.
    ///
    /// With `λ = c / f_stop` expressed in drawing units of `unit` meters,
    /// `max_cell = λ / (√eps_max · cells_per_wavelength)` and the air margin is
    /// `0.1 · λ`.
    pub fn from_wavelength(
        f_stop_hz: Scalar,
        eps_max: Scalar,
        cells_per_wavelength: Scalar,
        refined_cell: Scalar,
        margin: Scalar,
        unit: Scalar,
    ) -> Result<Self, ConfigError> {
        if !(cells_per_wavelength >= MIN_CELLS_PER_WAVELENGTH) {
            return Err(ConfigError::InvalidParameter {
                name: "cells_per_wavelength",
                reason: format!("must be at least {MIN_CELLS_PER_WAVELENGTH}, got {cells_per_wavelength}"),
            });
        }
        if !(f_stop_hz > 0.0) || !(unit > 0.0) || !(eps_max >= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "f_stop_hz",
                reason: "frequency and unit must be positive, eps_max at least 1".into(),
            });
        }
        let wavelength_air = wavelength_from_frequency(f_stop_hz) / unit;
        Ok(Self::new(
            wavelength_air / (eps_max.sqrt() * cells_per_wavelength),
            refined_cell,
            margin,
            AIR_MARGIN_WAVELENGTHS * wavelength_air,
        ))
    }

    /// Same as [`MeshSettings::from_wavelength`] for micron drawings.
    pub fn from_wavelength_um(
        f_stop_hz: Scalar,
        eps_max: Scalar,
        cells_per_wavelength: Scalar,
        refined_cell: Scalar,
        margin: Scalar,
    ) -> Result<Self, ConfigError> {
        Self::from_wavelength(f_stop_hz, eps_max, cells_per_wavelength, refined_cell, margin, MICRON)
    }

    /// Overrides the growth ratio.
    #[must_use]
    pub fn with_growth_ratio(mut self, ratio: Scalar) -> Self {
        self.growth_ratio = ratio;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GeometryError> {
        if !(self.max_cell > 0.0) || !self.max_cell.is_finite() {
            return Err(GeometryError::NonPositiveCellSize(self.max_cell));
        }
        if !(self.refined_cell > 0.0) || self.refined_cell > self.max_cell {
            return Err(GeometryError::RefinedExceedsMax { refined: self.refined_cell, max: self.max_cell });
        }
        if !(self.growth_ratio > 1.0) || !self.growth_ratio.is_finite() {
            return Err(GeometryError::InvalidGrowthRatio(self.growth_ratio));
        }
        for (name, value) in [("margin", self.margin), ("air_margin", self.air_margin)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(GeometryError::NegativeMargin { name, value });
            }
        }
        Ok(())
    }
}
