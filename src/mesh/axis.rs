use crate::math::{Scalar, COORD_TOLERANCE};

use super::GeometryError;

/// Strictly increasing mesh line coordinates along one axis.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAxis {
    lines: Vec<Scalar>,
}

impl MeshAxis {
    /// Wraps `lines`, which must be finite and strictly increasing.
    pub fn new(lines: Vec<Scalar>) -> Result<Self, GeometryError> {
        if let Some(i) = lines.iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::NonMonotonicAxis(i));
        }
        if let Some(i) = lines.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GeometryError::NonMonotonicAxis(i + 1));
        }
        Ok(Self { lines })
    }

    /// Line coordinates.
    #[must_use]
    pub fn lines(&self) -> &[Scalar] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if there are no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of cells (gaps between lines).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    /// Cell widths in order.
    pub fn gaps(&self) -> impl Iterator<Item = Scalar> + '_ {
        self.lines.windows(2).map(|w| w[1] - w[0])
    }

    /// Widest cell, or zero for fewer than two lines.
    #[must_use]
    pub fn max_gap(&self) -> Scalar {
        self.gaps().fold(0.0, Scalar::max)
    }

    /// Number of lines within [`COORD_TOLERANCE`] of `coord`.
    #[must_use]
    pub fn occurrences(&self, coord: Scalar) -> usize {
        self.lines.iter().filter(|&&l| (l - coord).abs() <= COORD_TOLERANCE).count()
    }

    /// First and last line.
    #[must_use]
    pub fn bounds(&self) -> Option<(Scalar, Scalar)> {
        Some((*self.lines.first()?, *self.lines.last()?))
    }
}

/// Lines strictly inside `(a, b)` splitting it into equal cells no wider than `h`.
///
/// Each line is computed directly from the endpoints, so the result does not
/// depend on accumulated rounding.
pub(super) fn split_uniform(a: Scalar, b: Scalar, h: Scalar) -> impl Iterator<Item = Scalar> {
    let span = b - a;
    // Slack keeps an exact multiple of `h` from gaining an extra cell through rounding.
    let n = ((span / h) * (1.0 - 1.0e-12)).ceil().max(1.0) as usize;
    (1..n).map(move |k| a + span * (k as Scalar) / (n as Scalar))
}

/// Lines from `start` (exclusive) to `target` (inclusive) whose cells grow by
/// at most `ratio` per step, starting from a neighbor cell of width `h_prev`,
/// and never exceed `h_max`.
///
/// Returns the lines and the width of the last cell. When the remaining
/// distance is too short for a full step the tail is closed with one cell, or
/// two equal cells, so no sliver cell is produced.
pub(super) fn grade_toward(
    start: Scalar,
    target: Scalar,
    h_prev: Scalar,
    h_max: Scalar,
    ratio: Scalar,
) -> (Vec<Scalar>, Scalar) {
    let dir = if target >= start { 1.0 } else { -1.0 };
    let mut lines = Vec::new();
    let mut pos = start;
    let mut h = h_prev;
    loop {
        let remaining = (target - pos).abs();
        if remaining <= COORD_TOLERANCE {
            break;
        }
        let next = (h * ratio).min(h_max);
        if remaining <= next {
            lines.push(target);
            h = remaining;
            break;
        }
        if remaining < 2.0 * next {
            let half = 0.5 * remaining;
            lines.push(pos + dir * half);
            lines.push(target);
            h = half;
            break;
        }
        pos += dir * next;
        lines.push(pos);
        h = next;
    }
    (lines, h)
}
