//! End-to-end detection: canvas, model, post-processing.

use image::DynamicImage;
use tracing::{debug, instrument};

use crate::{
    config::DetectionConfig,
    error::{DetectError, Result},
    model::SegmentationModel,
    pipeline::Pipeline,
    preprocessing::{normalize, Preprocessor},
    types::DetectionResult,
};

/// Text detector bound to one configuration.
///
/// The detector holds no model; callers pass an already loaded
/// [`SegmentationModel`] to each call, so one detector can serve several
/// models and concurrent calls only contend on the model they share.
pub struct Detector {
    config: DetectionConfig,
    preprocessor: Preprocessor,
    pipeline: Pipeline,
}

impl Detector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        Self::with_pipeline(config, Pipeline::default())
    }

    pub fn with_pipeline(config: DetectionConfig, pipeline: Pipeline) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            preprocessor: Preprocessor::new(config.side_length_limit),
            pipeline,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect text regions in `image`.
    ///
    /// An image without text is a success with no boxes. The input image is
    /// never modified.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect<M>(&self, image: &DynamicImage, model: &mut M) -> Result<DetectionResult>
    where
        M: SegmentationModel + ?Sized,
    {
        let descriptor = self.preprocessor.prepare(image)?;
        let tensor = normalize(&descriptor)?;

        let map = model.infer(&tensor)?;
        if (map.width, map.height) != (descriptor.dest_width, descriptor.dest_height) {
            return Err(DetectError::Inference(format!(
                "probability map is {}x{}, canvas is {}x{}",
                map.width, map.height, descriptor.dest_width, descriptor.dest_height
            )));
        }

        let boxes = self.pipeline.process(&map, &descriptor);
        debug!(boxes = boxes.len(), "detection finished");

        Ok(DetectionResult { descriptor, boxes })
    }
}

/// One-shot detection with a default pipeline.
pub fn detect<M>(
    image: &DynamicImage,
    model: &mut M,
    side_length_limit: u32,
) -> Result<DetectionResult>
where
    M: SegmentationModel + ?Sized,
{
    Detector::new(DetectionConfig::new(side_length_limit))?.detect(image, model)
}
