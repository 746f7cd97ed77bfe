//! Canvas sizing, resizing and tensor normalization.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::{CANVAS_MULTIPLE, NORMALIZE_MEAN, NORMALIZE_STD},
    error::{DetectError, Result},
    geometry::round_half_up,
    types::{ChannelPlanes, ImageDescriptor, InputTensor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Normalize one 8-bit value with the ImageNet statistics of `channel`.
pub fn normalize_value(value: u8, channel: Channel) -> f64 {
    let c = channel.index();
    (f64::from(value) / 255.0 - NORMALIZE_MEAN[c]) / NORMALIZE_STD[c]
}

/// Inverse of [`normalize_value`], back on the 0..=255 scale.
pub fn denormalize_value(normalized: f64, channel: Channel) -> f64 {
    let c = channel.index();
    (normalized * NORMALIZE_STD[c] + NORMALIZE_MEAN[c]) * 255.0
}

/// How an image of a given size maps onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePlan {
    pub scale: f64,
    /// Sides after scaling, before any rounding
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub dest_width: u32,
    pub dest_height: u32,
}

/// Work out canvas dimensions for a `width` x `height` image.
///
/// When the longer side exceeds `limit` both sides are scaled by
/// `limit / longer`. Each side is then rounded to whole pixels and to the
/// nearest multiple of 32 on its own (ties round up), never below 32.
pub fn plan_resize(width: u32, height: u32, limit: u32) -> Result<ResizePlan> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidImage(format!(
            "image has no usable dimensions ({width}x{height})"
        )));
    }
    if limit == 0 {
        return Err(DetectError::Config(
            "side length limit must be greater than zero".to_string(),
        ));
    }

    let longer = width.max(height);
    let (scale, scaled_width, scaled_height) = if longer > limit {
        // Multiply before dividing so the longer side lands exactly on `limit`
        let scale_side = |side: u32| f64::from(side) * f64::from(limit) / f64::from(longer);
        (
            f64::from(limit) / f64::from(longer),
            scale_side(width),
            scale_side(height),
        )
    } else {
        (1.0, f64::from(width), f64::from(height))
    };

    let dest_width = to_canvas_multiple(scaled_width);
    let dest_height = to_canvas_multiple(scaled_height);
    if dest_width == 0 || dest_height == 0 {
        return Err(DetectError::InvalidImage(
            "destination canvas resolved to zero".to_string(),
        ));
    }

    Ok(ResizePlan {
        scale,
        scaled_width,
        scaled_height,
        dest_width,
        dest_height,
    })
}

/// Canvas dimensions for a `width` x `height` image.
pub fn destination_size(width: u32, height: u32, limit: u32) -> Result<(u32, u32)> {
    let plan = plan_resize(width, height, limit)?;
    Ok((plan.dest_width, plan.dest_height))
}

fn to_canvas_multiple(side: f64) -> u32 {
    let multiple = f64::from(CANVAS_MULTIPLE);
    let pixels = round_half_up(side);
    let rounded = round_half_up(pixels / multiple) * multiple;
    (rounded as u32).max(CANVAS_MULTIPLE)
}

/// Resizes images onto the detection canvas.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    pub side_length_limit: u32,
}

impl Preprocessor {
    pub fn new(side_length_limit: u32) -> Self {
        Self { side_length_limit }
    }

    /// Decode an encoded raster (PNG, JPEG, TIFF).
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        Ok(image::load_from_memory(bytes)?)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        Ok(image::open(path)?)
    }

    /// Resize `image` onto the canvas with a nearest-neighbour kernel and split it
    /// into R, G, B planes. Alpha is dropped; `image` is left untouched.
    pub fn prepare(&self, image: &DynamicImage) -> Result<ImageDescriptor> {
        let (width, height) = (image.width(), image.height());
        let plan = plan_resize(width, height, self.side_length_limit)?;
        debug!(
            width,
            height,
            dest_width = plan.dest_width,
            dest_height = plan.dest_height,
            scale = plan.scale,
            "planned detection canvas"
        );

        let rgb = image.to_rgb8();
        let canvas = if rgb.dimensions() == (plan.dest_width, plan.dest_height) {
            rgb
        } else {
            image::imageops::resize(&rgb, plan.dest_width, plan.dest_height, FilterType::Nearest)
        };

        Ok(ImageDescriptor {
            width,
            height,
            dest_width: plan.dest_width,
            dest_height: plan.dest_height,
            planes: split_planes(&canvas),
        })
    }
}

fn split_planes(canvas: &RgbImage) -> ChannelPlanes {
    let len = canvas.width() as usize * canvas.height() as usize;
    let mut planes = ChannelPlanes {
        red: Vec::with_capacity(len),
        green: Vec::with_capacity(len),
        blue: Vec::with_capacity(len),
    };
    for pixel in canvas.pixels() {
        planes.red.push(pixel[0]);
        planes.green.push(pixel[1]);
        planes.blue.push(pixel[2]);
    }
    planes
}

/// Build the `[1, 3, H, W]` model input. Planes are emitted B, G, R.
pub fn normalize(descriptor: &ImageDescriptor) -> Result<InputTensor> {
    let expected = descriptor.canvas_len();
    let planes = [
        (&descriptor.planes.blue, Channel::Blue),
        (&descriptor.planes.green, Channel::Green),
        (&descriptor.planes.red, Channel::Red),
    ];
    if let Some((plane, channel)) = planes.iter().find(|(plane, _)| plane.len() != expected) {
        return Err(DetectError::InvalidImage(format!(
            "{channel:?} plane has {} values, expected {expected}",
            plane.len()
        )));
    }

    let normalized: Vec<Vec<f32>> = planes
        .par_iter()
        .map(|(plane, channel)| {
            plane
                .iter()
                .map(|&v| normalize_value(v, *channel) as f32)
                .collect()
        })
        .collect();

    Ok(InputTensor {
        width: descriptor.dest_width,
        height: descriptor.dest_height,
        data: normalized.concat(),
    })
}
