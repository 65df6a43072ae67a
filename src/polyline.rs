//! Polyline geometry for route paths.
//!
//! Route legs arrive as separate point lists. They are kept as decoded
//! `[lng, lat]` coordinates and merged into a single multi-line path whose
//! bounding box is used to frame the map.

use serde::{Deserialize, Serialize};

/// A polyline as an ordered list of `[lng, lat]` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<[f64; 2]>,
}

impl Polyline {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<[f64; 2]> {
        self.points
    }

    fn first(&self) -> Option<&[f64; 2]> {
        self.points.first()
    }

    fn last(&self) -> Option<&[f64; 2]> {
        self.points.last()
    }
}

/// Axis-aligned bounds as `[min_lng, min_lat, max_lng, max_lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    /// Bounds of nothing: min at +inf, max at -inf.
    pub const EMPTY: BoundingBox = BoundingBox([
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    ]);

    pub fn min_lng(&self) -> f64 {
        self.0[0]
    }

    pub fn min_lat(&self) -> f64 {
        self.0[1]
    }

    pub fn max_lng(&self) -> f64 {
        self.0[2]
    }

    pub fn max_lat(&self) -> f64 {
        self.0[3]
    }

    /// False for the bounds of an empty geometry.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }

    fn extend(&mut self, [lng, lat]: [f64; 2]) {
        self.0[0] = self.0[0].min(lng);
        self.0[1] = self.0[1].min(lat);
        self.0[2] = self.0[2].max(lng);
        self.0[3] = self.0[3].max(lat);
    }
}

/// An ordered collection of polylines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiLine {
    lines: Vec<Polyline>,
}

impl MultiLine {
    /// Merges lines that touch end-to-start into single lines.
    ///
    /// Order is preserved: line `i + 1` is appended to line `i` when the last
    /// point of `i` equals the first point of `i + 1`, in which case the
    /// shared point appears once. Empty lines are dropped.
    pub fn merge(lines: impl IntoIterator<Item = Polyline>) -> Self {
        let mut merged: Vec<Polyline> = Vec::new();

        for line in lines {
            if line.points.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(current) if current.last() == line.first() => {
                    current.points.extend(line.points.into_iter().skip(1));
                }
                _ => merged.push(line),
            }
        }

        Self { lines: merged }
    }

    pub fn lines(&self) -> &[Polyline] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Min/max over every coordinate of every line.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::EMPTY;
        for point in self.lines.iter().flat_map(|line| line.points.iter()) {
            bbox.extend(*point);
        }
        bbox
    }
}
