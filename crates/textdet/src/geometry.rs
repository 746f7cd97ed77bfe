//! Planar geometry over `geo_types::Coord<f64>` point sequences.
//!
//! Polygons are passed as open rings: the closing edge from the last point
//! back to the first is implied. Nothing in here touches images.

use std::f64::consts::PI;

use geo::{ConvexHull, Simplify};
use geo_types::{Coord, LineString, MultiPoint};

use crate::config::ARC_TOLERANCE;

const EPSILON: f64 = 1e-12;

/// Euclidean distance between two points.
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn clip(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Round to the nearest integer, ties towards positive infinity.
///
/// `2.5 -> 3`, `-2.5 -> -2`. Every rounding step of the detector goes
/// through here so there is exactly one tie rule.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Shoelace area, positive for counter-clockwise rings in a y-up frame.
pub fn signed_area(points: &[Coord<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Length of the closed ring through `points`.
pub fn perimeter(points: &[Coord<f64>]) -> f64 {
    arc_length(points, true)
}

pub fn arc_length(points: &[Coord<f64>], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 1 => open + distance(last, first),
        _ => open,
    }
}

/// Douglas-Peucker simplification of a closed ring.
pub fn approximate_polygon(points: &[Coord<f64>], epsilon: f64) -> Vec<Coord<f64>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let mut ring = LineString::new(points.to_vec());
    ring.close();
    let simplified = ring.simplify(&epsilon);
    let mut coords: Vec<Coord<f64>> = simplified.coords().copied().collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

/// Rectangle of arbitrary rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: Coord<f64>,
    pub width: f64,
    pub height: f64,
    /// Rotation of the width axis in degrees
    pub angle: f64,
}

impl RotatedRect {
    pub fn short_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corners from the half-extents rotated by `angle` and moved to `center`.
    pub fn corners(&self) -> [Coord<f64>; 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let mut corners = [Coord { x: 0.0, y: 0.0 }; 4];
        for (i, corner) in corners.iter_mut().enumerate() {
            let x = (if i & 1 == 1 { -self.width } else { self.width }) / 2.0;
            let y = (if i & 2 == 2 { -self.height } else { self.height }) / 2.0;
            *corner = Coord {
                x: x * cos - y * sin + self.center.x,
                y: x * sin + y * cos + self.center.y,
            };
        }
        corners
    }
}

/// Convex hull as an open counter-clockwise ring without repeated points.
pub fn convex_hull(points: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let multi_point: MultiPoint<f64> = points.iter().copied().collect();
    let hull = multi_point.convex_hull();
    let mut ring: Vec<Coord<f64>> = hull.exterior().coords().copied().collect();
    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    ring
}

/// Minimum-area enclosing rectangle by rotating calipers over the convex hull.
///
/// Returns `None` when there are no points or a coordinate is not finite.
pub fn min_area_rect(points: &[Coord<f64>]) -> Option<RotatedRect> {
    if points.is_empty() || points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }

    let hull = convex_hull(points);
    let n = hull.len();
    let origin = *hull.first().unwrap_or(&points[0]);
    let mut best = RotatedRect {
        center: origin,
        width: 0.0,
        height: 0.0,
        angle: 0.0,
    };
    let mut best_area = f64::INFINITY;

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let edge_len = distance(p1, p2);
        if edge_len < EPSILON {
            continue;
        }

        let (ux, uy) = ((p2.x - p1.x) / edge_len, (p2.y - p1.y) / edge_len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let (dx, dy) = (p.x - p1.x, p.y - p1.y);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if area < best_area {
            best_area = area;
            let cu = (min_u + max_u) / 2.0;
            let cv = (min_v + max_v) / 2.0;
            best = RotatedRect {
                center: Coord {
                    x: p1.x + cu * ux + cv * vx,
                    y: p1.y + cu * uy + cv * vy,
                },
                width,
                height,
                angle: uy.atan2(ux).to_degrees(),
            };
        }
    }

    Some(best)
}

/// Outward offset with round joins (Minkowski sum with a disc).
///
/// The polygon is taken as its convex hull. Arc resolution follows the
/// Clipper convention: the chord of each arc step stays within
/// `ARC_TOLERANCE` of the circle. An empty result means the input was
/// degenerate or `delta` was negative or not finite.
pub fn offset_round(points: &[Coord<f64>], delta: f64) -> Vec<Vec<Coord<f64>>> {
    if !delta.is_finite() || delta < 0.0 || points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Vec::new();
    }
    let ring = convex_hull(points);
    if ring.len() < 3 || signed_area(&ring).abs() < EPSILON {
        return Vec::new();
    }
    if delta < EPSILON {
        return vec![ring];
    }

    let n = ring.len();
    let normals: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            let len = distance(a, b);
            Coord {
                x: (b.y - a.y) / len,
                y: -(b.x - a.x) / len,
            }
        })
        .collect();

    let tolerance = if ARC_TOLERANCE > delta * ARC_TOLERANCE {
        delta * ARC_TOLERANCE
    } else {
        ARC_TOLERANCE
    };
    let mut steps_per_circle = PI / (1.0 - tolerance / delta).acos();
    if steps_per_circle > delta * PI {
        steps_per_circle = delta * PI;
    }
    let steps_per_rad = steps_per_circle / (2.0 * PI);

    let mut output = Vec::with_capacity(n * 4);
    for (i, p) in ring.iter().enumerate() {
        let from = normals[(i + n - 1) % n];
        let to = normals[i];
        let cross = from.x * to.y - from.y * to.x;
        let dot = from.x * to.x + from.y * to.y;
        let sweep = cross.atan2(dot);
        let steps = ((steps_per_rad * sweep.abs()).round() as usize).max(1);
        let start = from.y.atan2(from.x);
        for k in 0..=steps {
            let theta = start + sweep * k as f64 / steps as f64;
            output.push(Coord {
                x: p.x + theta.cos() * delta,
                y: p.y + theta.sin() * delta,
            });
        }
    }
    output.dedup_by(|a, b| distance(*a, *b) < EPSILON);
    if output.len() > 1 && distance(output[0], output[output.len() - 1]) < EPSILON {
        output.pop();
    }

    vec![output]
}
