pub mod builder;

use tracing::debug;

use crate::{
    algorithms::{BoxBuilder, CoordinateMapper},
    traits::{Binarizer, ContourExtractor},
    types::{DetectedBoxRect, ImageDescriptor, ProbabilityMap},
};

/// Post-processing pipeline from a probability map to boxes in original
/// image coordinates.
pub struct Pipeline {
    binarizer: Box<dyn Binarizer>,
    contour_extractor: Box<dyn ContourExtractor>,
    box_builder: BoxBuilder,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        binarizer: Box<dyn Binarizer>,
        contour_extractor: Box<dyn ContourExtractor>,
        box_builder: BoxBuilder,
    ) -> Self {
        Self {
            binarizer,
            contour_extractor,
            box_builder,
        }
    }

    /// Run binarization, contour extraction, box building and coordinate
    /// mapping. `map` must cover the descriptor's canvas.
    pub fn process(&self, map: &ProbabilityMap, descriptor: &ImageDescriptor) -> Vec<DetectedBoxRect> {
        // Step 1: Threshold and dilate
        let mask = self.binarizer.binarize(map);

        // Step 2: Region boundaries, simplified
        let contours = self.contour_extractor.extract_contours(&mask);

        // Step 3: Oriented, expanded and filtered boxes on the canvas
        let candidates = self.box_builder.build_all(&contours);

        // Step 4: Back to original coordinates
        let boxes = CoordinateMapper::from_descriptor(descriptor).map_all(&candidates);

        debug!(
            contours = contours.len(),
            boxes = boxes.len(),
            "post-processing finished"
        );
        boxes
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        "Pipeline: 1 binarizer, 1 contour extractor, 1 box builder, 1 coordinate mapper".to_string()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BinaryMask, ChannelPlanes, Contour};
    use geo_types::Coord;

    fn descriptor(width: u32, height: u32, dest_width: u32, dest_height: u32) -> ImageDescriptor {
        ImageDescriptor {
            width,
            height,
            dest_width,
            dest_height,
            planes: ChannelPlanes::default(),
        }
    }

    fn square_map(size: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> ProbabilityMap {
        let mut map = ProbabilityMap::zeros(size, size);
        for y in y0..y1 {
            for x in x0..x1 {
                map.data[(y * size + x) as usize] = 0.9;
            }
        }
        map
    }

    #[test]
    fn test_empty_map_yields_no_boxes() {
        let pipeline = Pipeline::default();
        let boxes = pipeline.process(&ProbabilityMap::zeros(64, 64), &descriptor(64, 64, 64, 64));
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_square_region() {
        let pipeline = Pipeline::default();
        let boxes = pipeline.process(&square_map(256, 100, 100, 150, 150), &descriptor(256, 256, 256, 256));
        assert_eq!(boxes.len(), 1);

        let [tl, tr, br, bl] = boxes[0].rect;
        // Dilated region spans 100..=150, expanded by about 19 pixels per side
        for (corner, expected) in [(tl, [81, 81]), (tr, [169, 81]), (br, [169, 169]), (bl, [81, 169])] {
            assert!((corner[0] - expected[0]).abs() <= 2, "{corner:?} vs {expected:?}");
            assert!((corner[1] - expected[1]).abs() <= 2, "{corner:?} vs {expected:?}");
        }
        assert!(boxes[0].width > 3 && boxes[0].height > 3);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut map = ProbabilityMap::zeros(64, 64);
        for y in 10..40 {
            for x in 10..40 {
                map.data[y * 64 + x] = 0.3;
            }
        }
        let boxes = Pipeline::default().process(&map, &descriptor(64, 64, 64, 64));
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_default_binarizer_uses_fixed_threshold() {
        let mut map = ProbabilityMap::zeros(64, 64);
        for y in 10..40 {
            for x in 10..40 {
                map.data[y * 64 + x] = 0.31;
            }
        }
        let boxes = Pipeline::builder().build().process(&map, &descriptor(64, 64, 64, 64));
        assert_eq!(boxes.len(), 1);
    }

    struct FixedExtractor(Vec<Contour>);

    impl ContourExtractor for FixedExtractor {
        fn extract_contours(&self, _mask: &BinaryMask) -> Vec<Contour> {
            self.0.clone()
        }
    }

    #[test]
    fn test_custom_extractor() {
        let contour = Contour {
            points: vec![
                Coord { x: 10, y: 10 },
                Coord { x: 40, y: 10 },
                Coord { x: 40, y: 30 },
                Coord { x: 10, y: 30 },
            ],
        };
        let pipeline = Pipeline::builder()
            .set_contour_extractor(FixedExtractor(vec![contour]))
            .build();
        // Canvas is half the original size in both directions
        let boxes = pipeline.process(&ProbabilityMap::zeros(64, 64), &descriptor(128, 128, 64, 64));
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].rect[0][0] < 20);
        assert!(boxes[0].rect[2][0] > 80);
    }
}
