use crate::{
    algorithms::{BoxBuilder, ImageprocContourExtractor, ThresholdDilateBinarizer},
    pipeline::Pipeline,
    traits::{Binarizer, ContourExtractor},
};

/// Builder for creating post-processing pipelines with a fluent API
pub struct PipelineBuilder {
    binarizer: Option<Box<dyn Binarizer>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            binarizer: None,
            contour_extractor: None,
        }
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let binarizer = self
            .binarizer
            .unwrap_or_else(|| Box::new(ThresholdDilateBinarizer::default()));

        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor));

        Pipeline::new(binarizer, contour_extractor, BoxBuilder)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
