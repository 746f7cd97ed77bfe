use geo_types::Coord;

use crate::{
    algorithms::boxes::{order_points_clockwise, rect_extent},
    geometry::{clip, round_half_up},
    types::{CandidateBox, DetectedBoxRect, ImageDescriptor},
};

/// Rescales canvas-space boxes into original image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub ratio_x: f64,
    pub ratio_y: f64,
    /// Clip bounds. These are the canvas extents, not the original ones.
    pub max_x: f64,
    pub max_y: f64,
}

impl CoordinateMapper {
    pub fn from_descriptor(descriptor: &ImageDescriptor) -> Self {
        Self {
            ratio_x: f64::from(descriptor.width) / f64::from(descriptor.dest_width),
            ratio_y: f64::from(descriptor.height) / f64::from(descriptor.dest_height),
            max_x: f64::from(descriptor.dest_width),
            max_y: f64::from(descriptor.dest_height),
        }
    }

    /// Scale, round half-up and clip one canvas point.
    pub fn map_point(&self, point: Coord<f64>) -> [i32; 2] {
        let x = clip(round_half_up(point.x * self.ratio_x), 0.0, self.max_x);
        let y = clip(round_half_up(point.y * self.ratio_y), 0.0, self.max_y);
        [x as i32, y as i32]
    }

    /// Map all four corners and order them again, since clipping and
    /// per-axis scaling can move the minimum `x + y` corner. Width and height
    /// are re-measured on the mapped corners and rounded.
    pub fn map_box(&self, candidate: &CandidateBox) -> DetectedBoxRect {
        let corners = candidate.points.map(|p| {
            let [x, y] = self.map_point(p);
            Coord {
                x: f64::from(x),
                y: f64::from(y),
            }
        });
        let corners = order_points_clockwise(corners);
        let (width, height) = rect_extent(&corners);

        DetectedBoxRect {
            rect: corners.map(|p| [p.x as i32, p.y as i32]),
            width: round_half_up(width) as u32,
            height: round_half_up(height) as u32,
        }
    }

    pub fn map_all(&self, candidates: &[CandidateBox]) -> Vec<DetectedBoxRect> {
        candidates.iter().map(|c| self.map_box(c)).collect()
    }
}
