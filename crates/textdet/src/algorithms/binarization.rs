use image::{GrayImage, Luma};

use crate::{
    config::PROBABILITY_THRESHOLD,
    traits::Binarizer,
    types::{BinaryMask, ProbabilityMap},
};

const FOREGROUND: u8 = 255;

/// Threshold followed by one pass of 2x2 dilation.
///
/// The model is trained against shrunk text regions, so the thresholded
/// mask grows by one pixel towards the right and bottom.
#[derive(Debug, Clone)]
pub struct ThresholdDilateBinarizer {
    pub threshold: f32,
}

impl Default for ThresholdDilateBinarizer {
    fn default() -> Self {
        Self {
            threshold: PROBABILITY_THRESHOLD,
        }
    }
}

impl Binarizer for ThresholdDilateBinarizer {
    fn binarize(&self, map: &ProbabilityMap) -> BinaryMask {
        dilate_2x2(&threshold(map, self.threshold))
    }
}

/// 255 where `p > threshold`, 0 elsewhere.
pub fn threshold(map: &ProbabilityMap, threshold: f32) -> BinaryMask {
    let data = map
        .data
        .iter()
        .map(|&p| if p > threshold { FOREGROUND } else { 0 })
        .collect();
    GrayImage::from_raw(map.width, map.height, data)
        .unwrap_or_else(|| GrayImage::new(map.width, map.height))
}

/// Dilation with a 2x2 all-ones element anchored at its bottom-right cell.
///
/// `out(x, y) = max(in(x-1..=x, y-1..=y))`, pixels outside the image ignored.
pub fn dilate_2x2(mask: &BinaryMask) -> BinaryMask {
    let (width, height) = mask.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut value = mask.get_pixel(x, y).0[0];
            if x > 0 {
                value = value.max(mask.get_pixel(x - 1, y).0[0]);
            }
            if y > 0 {
                value = value.max(mask.get_pixel(x, y - 1).0[0]);
            }
            if x > 0 && y > 0 {
                value = value.max(mask.get_pixel(x - 1, y - 1).0[0]);
            }
            result.put_pixel(x, y, Luma([value]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let map = ProbabilityMap::new(4, 1, vec![0.0, 0.3, 0.31, 1.0]).unwrap();
        let mask = threshold(&map, 0.3);
        assert_eq!(mask.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_dilate_grows_right_and_down() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, Luma([255]));

        let dilated = dilate_2x2(&mask);

        let on: Vec<(u32, u32)> = dilated
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(on, vec![(2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_dilate_clips_at_border() {
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(2, 2, Luma([255]));
        let dilated = dilate_2x2(&mask);
        assert_eq!(dilated.as_raw().iter().filter(|&&v| v == 255).count(), 1);
    }

    #[test]
    fn test_all_zero_map_gives_empty_mask() {
        let mask = ThresholdDilateBinarizer::default().binarize(&ProbabilityMap::zeros(64, 32));
        assert_eq!(mask.dimensions(), (64, 32));
        assert!(mask.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_binarize_square_grows_by_one() {
        let mut map = ProbabilityMap::zeros(20, 20);
        for y in 5..10 {
            for x in 5..10 {
                map.data[y * 20 + x] = 0.9;
            }
        }
        let mask = ThresholdDilateBinarizer::default().binarize(&map);
        let count = mask.as_raw().iter().filter(|&&v| v == 255).count();
        assert_eq!(count, 6 * 6);
        assert_eq!(mask.get_pixel(10, 10).0[0], 255);
        assert_eq!(mask.get_pixel(4, 4).0[0], 0);
    }
}
