use geo_types::Coord;
use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Thresholded and dilated probability map: one byte (0 or 255) per canvas pixel.
pub type BinaryMask = GrayImage;

/// Row-major R, G and B planes of the destination canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPlanes {
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

/// Original and destination (canvas) geometry of one input image.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ImageDescriptor {
    /// Original image dimensions
    pub width: u32,
    pub height: u32,
    /// Canvas dimensions, each a multiple of 32 and at least 32
    pub dest_width: u32,
    pub dest_height: u32,
    #[serde(skip)]
    #[schemars(skip)]
    pub planes: ChannelPlanes,
}

impl ImageDescriptor {
    /// Number of pixels on the destination canvas
    pub fn canvas_len(&self) -> usize {
        self.dest_width as usize * self.dest_height as usize
    }
}

/// Normalized model input laid out as `[1, 3, H, W]` with planes in B, G, R order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }
}

/// Per-pixel text probability produced by the segmentation model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ProbabilityMap {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(DetectError::Inference(format!(
                "probability map has {} values, expected {}x{} = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Map with every probability set to zero.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Interpret a grayscale raster as probabilities (`value / 255`).
    pub fn from_luma(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect(),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Boundary of one connected mask region in canvas pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Coord<i32>>,
}

impl Contour {
    pub fn to_f64(&self) -> Vec<Coord<f64>> {
        self.points
            .iter()
            .map(|p| Coord {
                x: f64::from(p.x),
                y: f64::from(p.y),
            })
            .collect()
    }
}

/// Box in canvas space, corners clockwise from the minimum `x + y` corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateBox {
    pub points: [Coord<f64>; 4],
    pub width: f64,
    pub height: f64,
}

/// Detected text region in original image coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DetectedBoxRect {
    /// Corners `[x, y]`, clockwise starting at the minimum `x + y` corner
    pub rect: [[i32; 2]; 4],
    pub width: u32,
    pub height: u32,
}

/// Output of one detection call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DetectionResult {
    pub descriptor: ImageDescriptor,
    /// Boxes in contour discovery order
    pub boxes: Vec<DetectedBoxRect>,
}
