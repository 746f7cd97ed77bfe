//! The segmentation model seam: input tensor in, probability map out.

use std::path::Path;

use crate::{
    error::{DetectError, Result},
    types::{InputTensor, ProbabilityMap},
};

/// A loaded segmentation model.
///
/// Construction is the readiness step: an implementation must be fully
/// initialised (runtime, weights) once it exists, and report failures there
/// as [`DetectError::ModelLoad`]. `infer` failures are [`DetectError::Inference`].
pub trait SegmentationModel {
    fn infer(&mut self, input: &InputTensor) -> Result<ProbabilityMap>;
}

impl<F> SegmentationModel for F
where
    F: FnMut(&InputTensor) -> Result<ProbabilityMap>,
{
    fn infer(&mut self, input: &InputTensor) -> Result<ProbabilityMap> {
        self(input)
    }
}

/// Serves a probability map that was computed ahead of time.
///
/// A map stored at another resolution is resampled nearest-neighbour onto
/// the requested canvas.
#[derive(Debug, Clone)]
pub struct PrecomputedModel {
    map: ProbabilityMap,
}

impl PrecomputedModel {
    pub fn new(map: ProbabilityMap) -> Self {
        Self { map }
    }

    /// Load a grayscale raster where `255` means probability `1.0`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path).map_err(|e| DetectError::ModelLoad(e.to_string()))?;
        Ok(Self::new(ProbabilityMap::from_luma(&image.to_luma8())))
    }

    fn resample(&self, width: u32, height: u32) -> ProbabilityMap {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let sy = (u64::from(y) * u64::from(self.map.height) / u64::from(height)) as u32;
            for x in 0..width {
                let sx = (u64::from(x) * u64::from(self.map.width) / u64::from(width)) as u32;
                data.push(self.map.get(sx, sy));
            }
        }
        ProbabilityMap { width, height, data }
    }
}

impl SegmentationModel for PrecomputedModel {
    fn infer(&mut self, input: &InputTensor) -> Result<ProbabilityMap> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(DetectError::Inference("stored probability map is empty".to_string()));
        }
        if (self.map.width, self.map.height) == (input.width, input.height) {
            return Ok(self.map.clone());
        }
        Ok(self.resample(input.width, input.height))
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmentationModel;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use ndarray::Array4;
    use ort::{
        session::{builder::GraphOptimizationLevel, Session},
        value::Value,
    };
    use tracing::debug;

    use super::SegmentationModel;
    use crate::{
        error::{DetectError, Result},
        types::{InputTensor, ProbabilityMap},
    };

    /// ONNX Runtime session for a DB-style text segmentation network.
    pub struct OnnxSegmentationModel {
        session: Session,
    }

    impl std::fmt::Debug for OnnxSegmentationModel {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OnnxSegmentationModel")
                .field("session", &"<Session>")
                .finish()
        }
    }

    impl OnnxSegmentationModel {
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let load_err = |e: ort::Error| DetectError::ModelLoad(e.to_string());
            let session = Session::builder()
                .map_err(load_err)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(load_err)?
                .commit_from_file(path.as_ref())
                .map_err(load_err)?;
            debug!(path = %path.as_ref().display(), "loaded segmentation model");
            Ok(Self { session })
        }
    }

    impl SegmentationModel for OnnxSegmentationModel {
        fn infer(&mut self, input: &InputTensor) -> Result<ProbabilityMap> {
            let infer_err = |e: ort::Error| DetectError::Inference(e.to_string());

            let array = Array4::from_shape_vec(input.shape(), input.data.clone())
                .map_err(|e| DetectError::Inference(e.to_string()))?;
            let value = Value::from_array(array).map_err(infer_err)?;
            let outputs = self.session.run(ort::inputs![value]).map_err(infer_err)?;
            let (output_shape, output_data) =
                outputs[0].try_extract_tensor::<f32>().map_err(infer_err)?;

            // [1, 1, H, W]
            if output_shape.len() != 4 {
                return Err(DetectError::Inference(format!(
                    "unexpected output rank {}",
                    output_shape.len()
                )));
            }
            let height = output_shape[2] as u32;
            let width = output_shape[3] as u32;
            ProbabilityMap::new(width, height, output_data.to_vec())
        }
    }
}
