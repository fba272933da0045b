use crate::layout::{LayerNumber, Layout};
use crate::math::{sorted_dedup, Scalar, COORD_TOLERANCE};
use crate::stackup::LayerStack;

use super::axis::{grade_toward, split_uniform, MeshAxis};
use super::{GeometryError, MeshSettings};

/// Rectilinear mesh: one axis per spatial direction, in drawing units.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Lines along x.
    pub x: MeshAxis,
    /// Lines along y.
    pub y: MeshAxis,
    /// Lines along z.
    pub z: MeshAxis,
}

impl Mesh {
    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.x.cell_count() * self.y.cell_count() * self.z.cell_count()
    }
}

/// Builds mesh axes from layout polygons and the layer stack.
#[derive(Debug, Clone)]
pub struct MeshGenerator {
    settings: MeshSettings,
}

impl MeshGenerator {
    /// Validates `settings` and creates a generator.
    pub fn new(settings: MeshSettings) -> Result<Self, GeometryError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &MeshSettings {
        &self.settings
    }

    /// Generates the full mesh. Every layer in `drive_layers` must carry at
    /// least one polygon; those that are metals in `stack` also mark
    /// conductor extents for refinement.
    pub fn generate(&self, layout: &Layout, stack: &LayerStack, drive_layers: &[LayerNumber]) -> Result<Mesh, GeometryError> {
        let _span = tracing::info_span!("mesh_generation", layers = drive_layers.len()).entered();
        let (x, y) = self.xy_axes(layout, stack, drive_layers)?;
        let z = self.z_axis(stack)?;
        tracing::debug!(x = x.len(), y = y.len(), z = z.len(), "mesh lines per axis");
        Ok(Mesh { x, y, z })
    }

    /// Builds the lateral axes from polygon vertices.
    pub fn xy_axes(
        &self,
        layout: &Layout,
        stack: &LayerStack,
        drive_layers: &[LayerNumber],
    ) -> Result<(MeshAxis, MeshAxis), GeometryError> {
        if drive_layers.is_empty() {
            return Err(GeometryError::NoMeshLayers);
        }
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut x_conductors = Vec::new();
        let mut y_conductors = Vec::new();
        for &layer in drive_layers {
            let polygons = layout.polygons(layer);
            if polygons.is_empty() {
                return Err(GeometryError::EmptyLayer(layer));
            }
            let is_metal = stack.metal_by_layer(layer).is_some();
            for poly in polygons {
                for v in poly.vertices() {
                    xs.push(v.x);
                    ys.push(v.y);
                }
                if is_metal {
                    let b = poly.bbox();
                    x_conductors.push((b.min.x, b.max.x));
                    y_conductors.push((b.min.y, b.max.y));
                }
            }
        }
        Ok((self.build_axis(xs, x_conductors)?, self.build_axis(ys, y_conductors)?))
    }

    /// Builds the vertical axis from stack interfaces, refining inside metal thickness.
    pub fn z_axis(&self, stack: &LayerStack) -> Result<MeshAxis, GeometryError> {
        let conductors = stack.metals().iter().map(|m| (m.z_bottom, m.z_top())).collect();
        self.build_axis(stack.z_interfaces(), conductors)
    }

    fn build_axis(&self, edges: Vec<Scalar>, conductors: Vec<(Scalar, Scalar)>) -> Result<MeshAxis, GeometryError> {
        let s = &self.settings;
        let fixed = sorted_dedup(edges, COORD_TOLERANCE);
        let conductors = merge_intervals(conductors);
        let (first, last) = match (fixed.first(), fixed.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return Err(GeometryError::NoMeshLayers),
        };

        let mut interior = Vec::with_capacity(fixed.len());
        for (i, &a) in fixed.iter().enumerate() {
            interior.push(a);
            if let Some(&b) = fixed.get(i + 1) {
                // Conductor extents end on fixed lines, so the midpoint decides the whole gap.
                let h = if covered(&conductors, 0.5 * (a + b)) { s.refined_cell } else { s.max_cell };
                interior.extend(split_uniform(a, b, h));
            }
        }

        let inner_low = interior.get(1).map_or(s.refined_cell, |&l| l - first);
        let inner_high = interior.len().checked_sub(2).map_or(s.refined_cell, |i| last - interior[i]);
        let low = self.extend(first, -1.0, inner_low);
        let high = self.extend(last, 1.0, inner_high);

        let mut lines = Vec::with_capacity(low.len() + interior.len() + high.len());
        lines.extend(low.into_iter().rev());
        lines.extend(interior);
        lines.extend(high);
        MeshAxis::new(lines)
    }

    /// Outward lines beyond `edge`: graded through the margin, then the air region.
    fn extend(&self, edge: Scalar, dir: Scalar, inner_cell: Scalar) -> Vec<Scalar> {
        let s = &self.settings;
        let mut out = Vec::new();
        let mut pos = edge;
        let mut h = inner_cell;
        for dist in [s.margin, s.air_margin] {
            if dist <= COORD_TOLERANCE {
                continue;
            }
            let target = pos + dir * dist;
            let (lines, last) = grade_toward(pos, target, h, s.max_cell, s.growth_ratio);
            out.extend(lines);
            pos = target;
            h = last;
        }
        out
    }
}

fn merge_intervals(mut intervals: Vec<(Scalar, Scalar)>) -> Vec<(Scalar, Scalar)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(Scalar, Scalar)> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

fn covered(intervals: &[(Scalar, Scalar)], x: Scalar) -> bool {
    intervals.iter().any(|&(lo, hi)| lo <= x && x <= hi)
}
