use geo_types::Coord;
use rayon::prelude::*;
use tracing::trace;

use crate::{
    config::{MIN_BOX_SIDE, MIN_CONTOUR_SIDE, MIN_UNCLIPPED_SIDE, UNCLIP_RATIO},
    geometry::{distance, min_area_rect, offset_round, perimeter, signed_area},
    types::{CandidateBox, Contour},
};

/// Corners of a minimum-area rectangle plus its shorter side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniBox {
    /// `[top-left, top-right, bottom-right, bottom-left]`
    pub points: [Coord<f64>; 4],
    pub short_side: f64,
}

/// Minimum-area rectangle of `points` with its corners put in
/// top-left, top-right, bottom-right, bottom-left slots.
pub fn get_mini_box(points: &[Coord<f64>]) -> Option<MiniBox> {
    let rect = min_area_rect(points)?;
    let mut corners = rect.corners();
    corners.sort_by(|a, b| a.x.total_cmp(&b.x));

    let (top_left, bottom_left) = if corners[1].y > corners[0].y {
        (corners[0], corners[1])
    } else {
        (corners[1], corners[0])
    };
    let (top_right, bottom_right) = if corners[3].y > corners[2].y {
        (corners[2], corners[3])
    } else {
        (corners[3], corners[2])
    };

    Some(MiniBox {
        points: [top_left, top_right, bottom_right, bottom_left],
        short_side: rect.short_side(),
    })
}

/// Expand a box to undo the shrink the segmentation target was trained with.
///
/// The offset distance is `|area| * UNCLIP_RATIO / perimeter`; only the
/// primary output path of the offset is returned. Empty when the box is
/// degenerate.
pub fn unclip(points: &[Coord<f64>; 4]) -> Vec<Coord<f64>> {
    let length = perimeter(points);
    if !(length > 0.0) {
        return Vec::new();
    }
    let offset = signed_area(points).abs() * UNCLIP_RATIO / length;
    offset_round(points, offset).into_iter().next().unwrap_or_default()
}

/// Order four corners clockwise (in image coordinates) starting with the
/// corner of minimum `x + y`.
///
/// Slot 0 takes the minimum `x + y`, slot 2 the maximum. Of the remaining
/// two, the one with the smaller `y - x` takes slot 1.
pub fn order_points_clockwise(points: [Coord<f64>; 4]) -> [Coord<f64>; 4] {
    let sum = |p: &Coord<f64>| p.x + p.y;
    let diff = |p: &Coord<f64>| p.y - p.x;

    let first = (0..4)
        .min_by(|&a, &b| sum(&points[a]).total_cmp(&sum(&points[b])))
        .unwrap_or(0);
    // On an exact tie prefer the corner opposite `first` in the input ring
    let opposite = (first + 2) % 4;
    let third = (0..4)
        .filter(|&i| i != first)
        .max_by(|&a, &b| {
            sum(&points[a])
                .total_cmp(&sum(&points[b]))
                .then((a == opposite).cmp(&(b == opposite)))
        })
        .unwrap_or(opposite);

    let mut rest = (0..4).filter(|&i| i != first && i != third);
    let (a, b) = match (rest.next(), rest.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return points,
    };
    let (second, fourth) = if diff(&points[b]) < diff(&points[a]) {
        (b, a)
    } else {
        (a, b)
    };

    [points[first], points[second], points[third], points[fourth]]
}

/// Width and height of an ordered quadrilateral: the longer of each pair of
/// opposite edges.
pub fn rect_extent(points: &[Coord<f64>; 4]) -> (f64, f64) {
    let width = distance(points[0], points[1]).max(distance(points[3], points[2]));
    let height = distance(points[0], points[3]).max(distance(points[1], points[2]));
    (width, height)
}

/// Turns contours into oriented boxes on the canvas.
#[derive(Debug, Clone, Default)]
pub struct BoxBuilder;

impl BoxBuilder {
    /// Run the five box steps on one contour. `None` means the contour was
    /// filtered out or its geometry was degenerate.
    pub fn build(&self, contour: &Contour) -> Option<CandidateBox> {
        let points = contour.to_f64();

        let mini = get_mini_box(&points)?;
        if mini.short_side < MIN_CONTOUR_SIDE {
            trace!(short_side = mini.short_side, "contour below minimum side");
            return None;
        }

        let expanded = unclip(&mini.points);
        if expanded.is_empty() {
            trace!("unclip produced no polygon");
            return None;
        }

        let mini = get_mini_box(&expanded)?;
        if mini.short_side < MIN_UNCLIPPED_SIDE {
            trace!(short_side = mini.short_side, "unclipped box below minimum side");
            return None;
        }

        let ordered = order_points_clockwise(mini.points);
        let (width, height) = rect_extent(&ordered);
        if width <= MIN_BOX_SIDE || height <= MIN_BOX_SIDE {
            trace!(width, height, "box below minimum extent");
            return None;
        }

        Some(CandidateBox {
            points: ordered,
            width,
            height,
        })
    }

    /// Build boxes for all contours in parallel, keeping discovery order.
    pub fn build_all(&self, contours: &[Contour]) -> Vec<CandidateBox> {
        contours
            .par_iter()
            .filter_map(|contour| self.build(contour))
            .collect()
    }
}
