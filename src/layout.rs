//! Polygon-per-layer layout model handed over by the layout reader.
//!
//! Coordinates are in drawing units (microns). Polygons are immutable once
//! constructed; the reader is expected to have merged via stacks and split
//! cutouts already, so holes arrive as separate polygons with clockwise
//! orientation.

use std::collections::BTreeMap;

use crate::math::Scalar;
use crate::mesh::GeometryError;

/// GDS layer number.
pub type LayerNumber = u32;
/// GDS datatype / purpose code.
pub type Purpose = u32;

/// Planar point in drawing units.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: Scalar,
    /// Vertical coordinate.
    pub y: Scalar,
}

impl Point2 {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned planar extent.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    /// Lower-left corner.
    pub min: Point2,
    /// Upper-right corner.
    pub max: Point2,
}

impl Bbox {
    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// A closed polygon on one layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    layer: LayerNumber,
    purpose: Purpose,
    vertices: Vec<Point2>,
}

impl Polygon {
    /// Creates a polygon, rejecting degenerate or non-finite vertex lists.
    ///
    /// Repeated consecutive vertices and a repeated closing vertex (as stored
    /// in GDS boundaries) are dropped. What remains must span a non-zero area.
    pub fn new(layer: LayerNumber, purpose: Purpose, mut vertices: Vec<Point2>) -> Result<Self, GeometryError> {
        if vertices.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { layer });
        }
        vertices.dedup();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(GeometryError::DegeneratePolygon { layer, vertices: vertices.len() });
        }
        let polygon = Self { layer, purpose, vertices };
        if polygon.signed_area() == 0.0 {
            return Err(GeometryError::ZeroAreaPolygon { layer });
        }
        Ok(polygon)
    }

    /// Axis-aligned rectangle with corners `(x0, y0)` and `(x1, y1)`, counter-clockwise.
    pub fn rect(layer: LayerNumber, purpose: Purpose, x0: Scalar, y0: Scalar, x1: Scalar, y1: Scalar) -> Result<Self, GeometryError> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { layer });
        }
        let (xl, xh) = (x0.min(x1), x0.max(x1));
        let (yl, yh) = (y0.min(y1), y0.max(y1));
        Self::new(
            layer,
            purpose,
            vec![Point2::new(xl, yl), Point2::new(xh, yl), Point2::new(xh, yh), Point2::new(xl, yh)],
        )
    }

    /// Layer number.
    #[must_use]
    pub fn layer(&self) -> LayerNumber {
        self.layer
    }

    /// Purpose code.
    #[must_use]
    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    /// Vertex list without the closing duplicate.
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// Shoelace area, positive for counter-clockwise outlines.
    #[must_use]
    pub fn signed_area(&self) -> Scalar {
        let n = self.vertices.len();
        let twice: Scalar = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        0.5 * twice
    }

    /// True for clockwise outlines, which the reader emits for cutouts.
    #[must_use]
    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn bbox(&self) -> Bbox {
        let first = self.vertices[0];
        self.vertices.iter().fold(Bbox { min: first, max: first }, |b, p| Bbox {
            min: Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
            max: Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
        })
    }
}

/// Read-only collection of polygons keyed by layer number.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    layers: BTreeMap<LayerNumber, Vec<Polygon>>,
}

impl Layout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layout from polygons, keeping only the listed layers and purposes.
    ///
    /// Empty filter lists accept everything.
    #[must_use]
    pub fn filtered<I>(polygons: I, layers: &[LayerNumber], purposes: &[Purpose]) -> Self
    where
        I: IntoIterator<Item = Polygon>,
    {
        let mut layout = Self::new();
        for poly in polygons {
            let layer_ok = layers.is_empty() || layers.contains(&poly.layer);
            let purpose_ok = purposes.is_empty() || purposes.contains(&poly.purpose);
            if layer_ok && purpose_ok {
                layout.insert(poly);
            }
        }
        layout
    }

    /// Adds a polygon on its layer.
    pub fn insert(&mut self, polygon: Polygon) {
        self.layers.entry(polygon.layer).or_default().push(polygon);
    }

    /// Polygons on `layer` (empty if none).
    #[must_use]
    pub fn polygons(&self, layer: LayerNumber) -> &[Polygon] {
        self.layers.get(&layer).map_or(&[], Vec::as_slice)
    }

    /// Iterates over every polygon in layer order.
    pub fn iter(&self) -> impl Iterator<Item = &Polygon> {
        self.layers.values().flatten()
    }

    /// Layer numbers present in the layout.
    pub fn layer_numbers(&self) -> impl Iterator<Item = LayerNumber> + '_ {
        self.layers.keys().copied()
    }

    /// Total polygon count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    /// True if no polygon was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounding box of all polygons on `layer`.
    #[must_use]
    pub fn layer_bbox(&self, layer: LayerNumber) -> Option<Bbox> {
        self.polygons(layer).iter().map(Polygon::bbox).reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn closing_vertex_is_dropped() {
        let p = Polygon::new(
            1,
            0,
            vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(2.0, 1.0), Point2::new(0.0, 0.0)],
        )
        .unwrap();
        assert_eq!(p.vertices().len(), 3);
    }

    #[test]
    fn orientation_marks_holes() {
        let outer = Polygon::rect(1, 0, 0.0, 0.0, 10.0, 4.0).unwrap();
        assert_relative_eq!(outer.signed_area(), 40.0);
        assert!(!outer.is_hole());

        let mut verts = outer.vertices().to_vec();
        verts.reverse();
        let hole = Polygon::new(1, 0, verts).unwrap();
        assert!(hole.is_hole());
    }

    #[test]
    fn degenerate_polygons_are_rejected() {
        let err = Polygon::new(5, 0, vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]).unwrap_err();
        assert_eq!(err, GeometryError::DegeneratePolygon { layer: 5, vertices: 2 });
        let err = Polygon::rect(5, 0, 0.0, 0.0, Scalar::NAN, 1.0).unwrap_err();
        assert_eq!(err, GeometryError::NonFiniteCoordinate { layer: 5 });
        let err = Polygon::rect(5, 0, Scalar::INFINITY, 0.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, GeometryError::NonFiniteCoordinate { layer: 5 });
    }

    #[test]
    fn repeated_vertices_do_not_count() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let err = Polygon::new(5, 0, vec![a, b, b, a]).unwrap_err();
        assert_eq!(err, GeometryError::DegeneratePolygon { layer: 5, vertices: 2 });

        let c = Point2::new(1.0, 1.0);
        let p = Polygon::new(5, 0, vec![a, b, b, c, a]).unwrap();
        assert_eq!(p.vertices(), &[a, b, c]);
    }

    #[test]
    fn flat_outlines_are_rejected() {
        let collinear = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert_eq!(Polygon::new(5, 0, collinear).unwrap_err(), GeometryError::ZeroAreaPolygon { layer: 5 });
        // A zero-width rectangle collapses to two distinct corners.
        assert_eq!(Polygon::rect(5, 0, 0.0, 0.0, 0.0, 1.0).unwrap_err(), GeometryError::DegeneratePolygon { layer: 5, vertices: 2 });
    }

    #[test]
    fn filtering_by_layer_and_purpose() {
        let polys = vec![
            Polygon::rect(134, 0, 0.0, 0.0, 1.0, 1.0).unwrap(),
            Polygon::rect(134, 20, 0.0, 0.0, 1.0, 1.0).unwrap(),
            Polygon::rect(201, 0, 0.0, 0.0, 1.0, 1.0).unwrap(),
            Polygon::rect(8, 0, 0.0, 0.0, 1.0, 1.0).unwrap(),
        ];
        let layout = Layout::filtered(polys, &[134, 201], &[0]);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.layer_numbers().collect::<Vec<_>>(), vec![134, 201]);
        assert!(layout.polygons(8).is_empty());
    }

    #[test]
    fn layer_bbox_spans_all_polygons() {
        let mut layout = Layout::new();
        layout.insert(Polygon::rect(1, 0, -3.0, 0.0, 1.0, 2.0).unwrap());
        layout.insert(Polygon::rect(1, 0, 0.0, -5.0, 4.0, 1.0).unwrap());
        let b = layout.layer_bbox(1).unwrap();
        assert_eq!(b.min, Point2::new(-3.0, -5.0));
        assert_eq!(b.max, Point2::new(4.0, 2.0));
        assert!(layout.layer_bbox(2).is_none());
    }
}
