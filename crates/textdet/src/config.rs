//! Detection constants and the user-facing configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Default limit for the longer canvas side.
pub const DEFAULT_SIDE_LENGTH_LIMIT: u32 = 1280;

/// Environment variable overriding the side-length limit.
pub const SIDE_LENGTH_LIMIT_ENV: &str = "LIMIT_SIDE_LENGTH";

/// Canvas dimensions are multiples of this value.
pub const CANVAS_MULTIPLE: u32 = 32;

/// Probabilities strictly above this become foreground.
pub const PROBABILITY_THRESHOLD: f32 = 0.3;

pub const UNCLIP_RATIO: f64 = 1.5;

/// Contours whose minimum-area rectangle has a shorter side below this are dropped.
pub const MIN_CONTOUR_SIDE: f64 = 3.0;

/// Same filter applied after unclip expansion.
pub const MIN_UNCLIPPED_SIDE: f64 = MIN_CONTOUR_SIDE + 2.0;

/// Final boxes need width and height strictly above this.
pub const MIN_BOX_SIDE: f64 = 3.0;

/// Maximum deviation of a round-join arc from the true circle.
pub const ARC_TOLERANCE: f64 = 0.25;

/// Douglas-Peucker tolerance as a fraction of contour arc length.
pub const APPROX_EPSILON_RATIO: f64 = 0.001;

/// ImageNet statistics, R, G, B.
pub const NORMALIZE_MEAN: [f64; 3] = [0.485, 0.456, 0.406];
pub const NORMALIZE_STD: [f64; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Longer side of the canvas is scaled down to at most this many pixels
    #[schemars(range(min = 1))]
    pub side_length_limit: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            side_length_limit: DEFAULT_SIDE_LENGTH_LIMIT,
        }
    }
}

impl DetectionConfig {
    pub fn new(side_length_limit: u32) -> Self {
        Self { side_length_limit }
    }

    /// Read the limit from `LIMIT_SIDE_LENGTH`, falling back to the default
    /// when the variable is unset, unparsable or zero.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(SIDE_LENGTH_LIMIT_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let side_length_limit = value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_SIDE_LENGTH_LIMIT);
        Self { side_length_limit }
    }

    pub fn validate(&self) -> Result<()> {
        if self.side_length_limit == 0 {
            return Err(DetectError::Config(
                "side_length_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
