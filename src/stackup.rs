//! Technology layer stack: dielectric strata and metal layers.

use crate::constants::{VACUUM_PERMEABILITY, VACUUM_PERMITTIVITY};
use crate::errors::ConfigError;
use crate::layout::LayerNumber;
use crate::math::Scalar;

/// Linear isotropic dielectric material.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name as used by the stackup file.
    pub name: String,
    /// Relative permittivity εᵣ.
    pub epsilon_r: Scalar,
    /// Dielectric loss tangent tan δ.
    pub loss_tangent: Scalar,
    /// Bulk conductivity σ in S/m.
    pub conductivity: Scalar,
}

impl Material {
    /// Lossless material with relative permittivity `epsilon_r`.
    #[must_use]
    pub fn lossless(name: impl Into<String>, epsilon_r: Scalar) -> Self {
        Self { name: name.into(), epsilon_r, loss_tangent: 0.0, conductivity: 0.0 }
    }

    /// Absolute permittivity ε = εᵣ·ε₀ in F/m.
    #[must_use]
    pub fn permittivity(&self) -> Scalar {
        self.epsilon_r * VACUUM_PERMITTIVITY
    }

    /// Plane-wave phase velocity 1/√(με) in m/s for a non-magnetic material.
    #[must_use]
    pub fn phase_velocity(&self) -> Scalar {
        1.0 / (VACUUM_PERMEABILITY * self.permittivity()).sqrt()
    }
}

/// One dielectric stratum, `[z_bottom, z_bottom + thickness]` in drawing units.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Dielectric {
    /// Fill material.
    pub material: Material,
    /// Lower z coordinate.
    pub z_bottom: Scalar,
    /// Layer thickness.
    pub thickness: Scalar,
}

impl Dielectric {
    /// Upper z coordinate.
    #[must_use]
    pub fn z_top(&self) -> Scalar {
        self.z_bottom + self.thickness
    }
}

/// Metal layer drawn on a GDS layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Metal {
    /// Technology name, e.g. `TopMetal2`.
    pub name: String,
    /// GDS layer carrying this metal.
    pub layer: LayerNumber,
    /// Lower z coordinate in drawing units.
    pub z_bottom: Scalar,
    /// Thickness in drawing units.
    pub thickness: Scalar,
    /// Conductivity in S/m.
    pub conductivity: Scalar,
}

impl Metal {
    /// Upper z coordinate.
    #[must_use]
    pub fn z_top(&self) -> Scalar {
        self.z_bottom + self.thickness
    }
}

/// Read-only layer stack. Dielectrics are non-empty and ordered bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    dielectrics: Vec<Dielectric>,
    metals: Vec<Metal>,
}

impl LayerStack {
    /// Validates and builds a stack.
    ///
    /// Dielectrics must be non-empty, have positive thickness and strictly
    /// increasing bottoms without overlap. Metals must have positive thickness
    /// and distinct layer numbers and names; they are stored in z order.
    pub fn new(dielectrics: Vec<Dielectric>, mut metals: Vec<Metal>) -> Result<Self, ConfigError> {
        if dielectrics.is_empty() {
            return Err(ConfigError::InvalidStack("no dielectric layers".into()));
        }
        for d in &dielectrics {
            if !(d.thickness > 0.0) || !(d.material.epsilon_r >= 1.0) {
                return Err(ConfigError::InvalidStack(format!(
                    "dielectric `{}` needs thickness > 0 and epsilon_r >= 1",
                    d.material.name
                )));
            }
        }
        for pair in dielectrics.windows(2) {
            if pair[1].z_bottom < pair[0].z_top() {
                return Err(ConfigError::InvalidStack(format!(
                    "dielectric `{}` starts below the top of `{}`",
                    pair[1].material.name, pair[0].material.name
                )));
            }
        }
        for (i, m) in metals.iter().enumerate() {
            if !(m.thickness > 0.0) {
                return Err(ConfigError::InvalidStack(format!("metal `{}` needs thickness > 0", m.name)));
            }
            if metals[..i].iter().any(|o| o.layer == m.layer || o.name == m.name) {
                return Err(ConfigError::InvalidStack(format!("metal `{}` is defined twice", m.name)));
            }
        }
        metals.sort_by(|a, b| a.z_bottom.total_cmp(&b.z_bottom));
        Ok(Self { dielectrics, metals })
    }

    /// Dielectric strata, bottom to top.
    #[must_use]
    pub fn dielectrics(&self) -> &[Dielectric] {
        &self.dielectrics
    }

    /// Metals, bottom to top.
    #[must_use]
    pub fn metals(&self) -> &[Metal] {
        &self.metals
    }

    /// Largest relative permittivity in the stack; drives the wavelength-based cell size.
    #[must_use]
    pub fn eps_max(&self) -> Scalar {
        self.dielectrics.iter().map(|d| d.material.epsilon_r).fold(1.0, Scalar::max)
    }

    /// GDS layer numbers of all metals, used to filter the layout.
    #[must_use]
    pub fn metal_layer_numbers(&self) -> Vec<LayerNumber> {
        self.metals.iter().map(|m| m.layer).collect()
    }

    /// Metal drawn on `layer`.
    #[must_use]
    pub fn metal_by_layer(&self, layer: LayerNumber) -> Option<&Metal> {
        self.metals.iter().find(|m| m.layer == layer)
    }

    /// Metal called `name`.
    #[must_use]
    pub fn metal_by_name(&self, name: &str) -> Option<&Metal> {
        self.metals.iter().find(|m| m.name == name)
    }

    /// Every z interface of the stack: dielectric boundaries and metal bottoms/tops.
    #[must_use]
    pub fn z_interfaces(&self) -> Vec<Scalar> {
        let dielectric = self.dielectrics.iter().flat_map(|d| [d.z_bottom, d.z_top()]);
        let metal = self.metals.iter().flat_map(|m| [m.z_bottom, m.z_top()]);
        dielectric.chain(metal).collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::SPEED_OF_LIGHT;

    fn sg13_like() -> LayerStack {
        LayerStack::new(
            vec![
                Dielectric { material: Material::lossless("Substrate", 11.9), z_bottom: 0.0, thickness: 500.0 },
                Dielectric { material: Material::lossless("SiO2", 4.1), z_bottom: 500.0, thickness: 15.0 },
            ],
            vec![
                Metal { name: "TopMetal2".into(), layer: 134, z_bottom: 511.0, thickness: 3.0, conductivity: 3.0e7 },
                Metal { name: "Metal1".into(), layer: 8, z_bottom: 501.0, thickness: 0.4, conductivity: 2.0e7 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn metals_are_z_sorted_and_queryable() {
        let stack = sg13_like();
        assert_eq!(stack.metal_layer_numbers(), vec![8, 134]);
        assert_eq!(stack.metal_by_name("TopMetal2").unwrap().layer, 134);
        assert_relative_eq!(stack.metal_by_layer(8).unwrap().z_top(), 501.4);
        assert!(stack.metal_by_name("Metal5").is_none());
        assert_relative_eq!(stack.eps_max(), 11.9);
    }

    #[test]
    fn overlapping_dielectrics_are_rejected() {
        let err = LayerStack::new(
            vec![
                Dielectric { material: Material::lossless("A", 4.0), z_bottom: 0.0, thickness: 10.0 },
                Dielectric { material: Material::lossless("B", 4.0), z_bottom: 5.0, thickness: 10.0 },
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStack(_)));
        assert!(LayerStack::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn vacuum_like_material_travels_at_light_speed() {
        let air = Material::lossless("Air", 1.0);
        assert_relative_eq!(air.phase_velocity(), SPEED_OF_LIGHT, max_relative = 1.0e-9);
    }
}
