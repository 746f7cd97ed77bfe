use geo_types::Coord;
use image::{imageops, GrayImage};

use crate::{
    config::APPROX_EPSILON_RATIO,
    geometry::{approximate_polygon, perimeter},
    traits::ContourExtractor,
    types::{BinaryMask, Contour},
};

/// Imageproc-based contour extractor
///
/// Every border is returned, outer and hole alike, with no hierarchy
/// filtering. Each border is simplified with Douglas-Peucker at a tolerance
/// of 0.1% of its arc length.
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, mask: &BinaryMask) -> Vec<Contour> {
        imageproc::contours::find_contours::<i32>(&pad(mask))
            .into_iter()
            .map(|contour| {
                // Undo the one-pixel border
                let points: Vec<Coord<f64>> = contour
                    .points
                    .iter()
                    .map(|p| Coord {
                        x: f64::from(p.x - 1),
                        y: f64::from(p.y - 1),
                    })
                    .collect();
                simplify_contour(&points)
            })
            .collect()
    }
}

/// Surround `mask` with one background pixel on every side. The tracer
/// misses borders of regions that touch the image edge otherwise.
fn pad(mask: &BinaryMask) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    padded
}

fn simplify_contour(points: &[Coord<f64>]) -> Contour {
    let epsilon = APPROX_EPSILON_RATIO * perimeter(points);
    let points = approximate_polygon(points, epsilon)
        .into_iter()
        .map(|p| Coord {
            x: p.x as i32,
            y: p.y as i32,
        })
        .collect();
    Contour { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = GrayImage::new(32, 32);
        assert!(ImageprocContourExtractor.extract_contours(&mask).is_empty());
    }

    #[test]
    fn test_square_simplifies_to_corners() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 10, 10, 30, 30);

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 1);

        let mut corners = contours[0].points.clone();
        corners.sort_by_key(|p| (p.x, p.y));
        assert_eq!(
            corners,
            vec![
                Coord { x: 10, y: 10 },
                Coord { x: 10, y: 29 },
                Coord { x: 29, y: 10 },
                Coord { x: 29, y: 29 },
            ]
        );
    }

    #[test]
    fn test_hole_borders_are_listed() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 10, 10, 50, 50);
        for y in 20..40 {
            for x in 20..40 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 2, "outer border and hole border");
    }

    #[test]
    fn test_separate_regions_in_discovery_order() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 40, 5, 50, 15);
        fill(&mut mask, 5, 40, 15, 50);

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 2);
        // Raster scan meets the upper region first
        assert!(contours[0].points.iter().all(|p| p.y < 20));
        assert!(contours[1].points.iter().all(|p| p.y >= 40));
    }

    fn x_range(contour: &Contour) -> (i32, i32) {
        let xs = contour.points.iter().map(|p| p.x);
        (xs.clone().min().unwrap(), xs.max().unwrap())
    }

    fn y_range(contour: &Contour) -> (i32, i32) {
        let ys = contour.points.iter().map(|p| p.y);
        (ys.clone().min().unwrap(), ys.max().unwrap())
    }

    #[test]
    fn test_full_width_band() {
        let mut mask = GrayImage::new(96, 32);
        fill(&mut mask, 0, 10, 96, 21);

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(x_range(&contours[0]), (0, 95));
        assert_eq!(y_range(&contours[0]), (10, 20));
    }

    #[test]
    fn test_full_height_band() {
        let mut mask = GrayImage::new(32, 96);
        fill(&mut mask, 5, 0, 12, 96);

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(x_range(&contours[0]), (5, 11));
        assert_eq!(y_range(&contours[0]), (0, 95));
    }

    #[test]
    fn test_full_mask() {
        let mut mask = GrayImage::new(40, 24);
        fill(&mut mask, 0, 0, 40, 24);

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        let mut corners = contours[0].points.clone();
        corners.sort_by_key(|p| (p.x, p.y));
        assert_eq!(
            corners,
            vec![
                Coord { x: 0, y: 0 },
                Coord { x: 0, y: 23 },
                Coord { x: 39, y: 0 },
                Coord { x: 39, y: 23 },
            ]
        );
    }

    #[test]
    fn test_full_mask_with_hole() {
        let mut mask = GrayImage::new(40, 24);
        fill(&mut mask, 0, 0, 40, 24);
        mask.put_pixel(20, 12, Luma([0]));

        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 2, "outer border and hole border");
        assert_eq!(x_range(&contours[0]), (0, 39));
        let (hole_min, hole_max) = x_range(&contours[1]);
        assert!(hole_min >= 19 && hole_max <= 21);
    }

    #[test]
    fn test_single_pixel_region() {
        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(3, 3, Luma([255]));
        let contours = ImageprocContourExtractor.extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Coord { x: 3, y: 3 }]);
    }
}
