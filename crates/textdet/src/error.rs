use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    /// Input could not be decoded or has no usable dimensions.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Failed to load segmentation model: {0}")]
    ModelLoad(String),

    #[error("Segmentation inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A saved detection result is missing data or is malformed.
    #[error("Malformed detection result: {0}")]
    InvalidResult(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::InvalidImage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
