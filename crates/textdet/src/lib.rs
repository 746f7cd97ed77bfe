//! # Text Detection Post-Processing Library
//!
//! Turns the probability map of a DB-style text segmentation network into
//! oriented, clockwise-ordered quadrilaterals in original image coordinates.
//!
//! ## Core Features
//!
//! - **Canvas preparation**: resize onto a 32-aligned canvas and normalize to a `[1, 3, H, W]` tensor
//! - **Model seam**: any [`SegmentationModel`] works, closures included; ONNX Runtime behind the `onnx` feature
//! - **Pipeline System**: binarize, trace contours, build and expand boxes, map back to the source image
//! - **GeoJSON Support**: export results as polygons with image metadata
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use textdet::{Detector, DetectionConfig, PrecomputedModel};
//!
//! let detector = Detector::new(DetectionConfig::from_env())?;
//! let mut model = PrecomputedModel::open("probability.png")?;
//!
//! let image = image::open("page.jpg")?;
//! let result = detector.detect(&image, &mut model)?;
//!
//! for detected in &result.boxes {
//!     println!("{:?} {}x{}", detected.rect, detected.width, detected.height);
//! }
//! result.save_geojson("boxes.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Post-processing only
//!
//! ```rust,no_run
//! use textdet::{Pipeline, ProbabilityMap, preprocessing::Preprocessor};
//!
//! let descriptor = Preprocessor::new(1280).prepare(&image::open("page.jpg")?)?;
//! let map = ProbabilityMap::zeros(descriptor.dest_width, descriptor.dest_height);
//!
//! let pipeline = Pipeline::builder().build();
//! let boxes = pipeline.process(&map, &descriptor);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod config;
pub mod types;
pub mod traits;
pub mod geometry;
pub mod preprocessing;
pub mod algorithms;
pub mod pipeline;
pub mod model;
pub mod detector;
pub mod io;

// Re-exports for convenience
pub use error::{DetectError, Result};
pub use config::DetectionConfig;
pub use types::{
    BinaryMask, CandidateBox, Contour, DetectedBoxRect, DetectionResult, ImageDescriptor,
    InputTensor, ProbabilityMap,
};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{builder::PipelineBuilder, Pipeline};
pub use model::{PrecomputedModel, SegmentationModel};
#[cfg(feature = "onnx")]
pub use model::OnnxSegmentationModel;
pub use detector::{detect, Detector};
pub use io::{result_schema, BoxProperties};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn band_map(width: u32, height: u32, rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) -> ProbabilityMap {
        let mut map = ProbabilityMap::zeros(width, height);
        for y in rows {
            for x in cols.clone() {
                map.data[(y * width + x) as usize] = 0.8;
            }
        }
        map
    }

    #[test]
    fn test_detector_with_closure_model() {
        let detector = Detector::new(DetectionConfig::default()).expect("Should accept default config");
        let image = DynamicImage::ImageRgb8(RgbImage::new(320, 160));

        let mut model = |tensor: &InputTensor| -> Result<ProbabilityMap> {
            Ok(band_map(tensor.width, tensor.height, 40..60, 30..250))
        };
        let result = detector.detect(&image, &mut model).expect("Should detect successfully");

        assert_eq!(result.boxes.len(), 1, "Should find the text band");
        let detected = &result.boxes[0];
        assert!(detected.width > detected.height);
        assert!(detected.rect.iter().all(|&[x, y]| (0..=320).contains(&x) && (0..=160).contains(&y)));
    }

    #[test]
    fn test_pipeline_info() {
        let pipeline = Pipeline::builder().build();
        assert!(pipeline.info().contains("binarizer"));
    }

    #[test]
    fn test_geojson_export() {
        let detector = Detector::new(DetectionConfig::new(640)).expect("Should accept config");
        let image = DynamicImage::ImageRgb8(RgbImage::new(128, 128));
        let mut model = PrecomputedModel::new(band_map(128, 128, 10..30, 10..100));

        let result = detector.detect(&image, &mut model).expect("Should detect successfully");
        let geojson = result.to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), 1);
    }

    #[test]
    fn test_multiple_regions_keep_scan_order() {
        let detector = Detector::new(DetectionConfig::default()).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(256, 256));
        let mut model = |tensor: &InputTensor| -> Result<ProbabilityMap> {
            let mut map = band_map(tensor.width, tensor.height, 20..40, 150..240);
            for y in 150..170 {
                for x in 20..120 {
                    map.data[(y * tensor.width + x) as usize] = 0.9;
                }
            }
            Ok(map)
        };

        let result = detector.detect(&image, &mut model).unwrap();
        assert_eq!(result.boxes.len(), 2);
        assert!(result.boxes[0].rect[0][1] < result.boxes[1].rect[0][1]);
    }
}
