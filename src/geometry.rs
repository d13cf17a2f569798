//! Path geometry assembly.
//!
//! Solutions carry their geometry as an XY polyline with an M measure per
//! vertex: M grows monotonically along the path and equals the traversed
//! cost at every link boundary, linearly interpolated across intermediate
//! vertices by Euclidean length.

use geo::{Coord, EuclideanDistance, EuclideanLength, LineLocatePoint, LineString, Point};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub m: f64,
}

/// Assembled route polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathLine {
    pub srid: Option<i32>,
    pub points: Vec<PathPoint>,
}

// Joint vertices between consecutive links are only dropped when they
// coincide exactly up to this slack.
const JOIN_EPSILON: f64 = 1e-9;

impl PathLine {
    pub fn new(srid: Option<i32>) -> Self {
        Self {
            srid,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_m(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.m)
    }

    pub fn push_point(&mut self, x: f64, y: f64, m: f64) {
        if let Some(last) = self.points.last() {
            if (last.x - x).abs() <= JOIN_EPSILON
                && (last.y - y).abs() <= JOIN_EPSILON
            {
                return;
            }
        }
        self.points.push(PathPoint { x, y, m });
    }

    /// Appends one link's polyline. `reverse` flips the stored direction
    /// when the traversal runs against it. M is interpolated from `m_start`
    /// to `m_end` along the segment's own length.
    pub fn append_segment(&mut self, line: &LineString<f64>, reverse: bool, m_start: f64, m_end: f64) {
        let coords: Vec<Coord<f64>> = if reverse {
            line.coords().rev().copied().collect()
        } else {
            line.coords().copied().collect()
        };
        if coords.is_empty() {
            return;
        }
        let total = polyline_length(&coords);
        let mut walked = 0.0;
        let mut prev: Option<Coord<f64>> = None;
        for c in coords {
            if let Some(p) = prev {
                walked += segment_length(p, c);
            }
            let m = if total > 0.0 {
                m_start + (m_end - m_start) * (walked / total)
            } else {
                m_start
            };
            self.push_point(c.x, c.y, m);
            prev = Some(c);
        }
        // guard against length rounding drift on the closing vertex
        if let Some(last) = self.points.last_mut() {
            last.m = m_end;
        }
    }
}

fn segment_length(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

fn polyline_length(coords: &[Coord<f64>]) -> f64 {
    coords.windows(2).map(|w| segment_length(w[0], w[1])).sum()
}

/// Euclidean length of a stored link polyline.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.euclidean_length()
}

/// Straight-line distance between two points.
pub fn point_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    a.euclidean_distance(&b)
}

/// Locates `point` on `line` as a length fraction in `0.0..=1.0`.
/// Degenerate (zero-length) lines locate at 0.
pub fn locate_fraction(line: &LineString<f64>, point: Point<f64>) -> f64 {
    line.line_locate_point(&point).unwrap_or(0.0)
}

/// Point at a length fraction along the line.
pub fn point_at_fraction(line: &LineString<f64>, fraction: f64) -> Option<Point<f64>> {
    let coords: Vec<Coord<f64>> = line.coords().copied().collect();
    if coords.is_empty() {
        return None;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let total = polyline_length(&coords);
    if total == 0.0 {
        return Some(Point::new(coords[0].x, coords[0].y));
    }
    let goal = fraction * total;
    let mut walked = 0.0;
    for w in coords.windows(2) {
        let seg = segment_length(w[0], w[1]);
        if walked + seg >= goal {
            let t = if seg > 0.0 { (goal - walked) / seg } else { 0.0 };
            return Some(Point::new(
                w[0].x + (w[1].x - w[0].x) * t,
                w[0].y + (w[1].y - w[0].y) * t,
            ));
        }
        walked += seg;
    }
    let last = coords[coords.len() - 1];
    Some(Point::new(last.x, last.y))
}

/// Sub-polyline between two length fractions (`start <= end`). Returns
/// `None` when the cut collapses to a single point.
pub fn line_substring(line: &LineString<f64>, start: f64, end: f64) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = line.coords().copied().collect();
    if coords.len() < 2 {
        return None;
    }
    let start = start.clamp(0.0, 1.0);
    let end = end.clamp(0.0, 1.0);
    if end <= start {
        return None;
    }
    let total = polyline_length(&coords);
    if total == 0.0 {
        return None;
    }
    let lo = start * total;
    let hi = end * total;

    let mut out: Vec<Coord<f64>> = Vec::new();
    let mut walked = 0.0;
    for w in coords.windows(2) {
        let seg = segment_length(w[0], w[1]);
        let seg_start = walked;
        let seg_end = walked + seg;
        if seg_end >= lo && seg_start <= hi && seg > 0.0 {
            let t0 = ((lo - seg_start) / seg).clamp(0.0, 1.0);
            let t1 = ((hi - seg_start) / seg).clamp(0.0, 1.0);
            let a = Coord {
                x: w[0].x + (w[1].x - w[0].x) * t0,
                y: w[0].y + (w[1].y - w[0].y) * t0,
            };
            let b = Coord {
                x: w[0].x + (w[1].x - w[0].x) * t1,
                y: w[0].y + (w[1].y - w[0].y) * t1,
            };
            push_coord(&mut out, a);
            push_coord(&mut out, b);
        }
        walked = seg_end;
    }
    if out.len() < 2 {
        return None;
    }
    Some(LineString::from(out))
}

fn push_coord(out: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    if let Some(last) = out.last() {
        if (last.x - c.x).abs() <= JOIN_EPSILON && (last.y - c.y).abs() <= JOIN_EPSILON {
            return;
        }
    }
    out.push(c);
}
