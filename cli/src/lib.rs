use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use textdet::{DetectionConfig, DetectionResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    DetectError(#[from] textdet::DetectError),
    #[error("Job '{0}' has no probability map and no model is configured")]
    MissingModel(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// How detection results are written out
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    /// Boxes and image descriptor as plain JSON
    #[default]
    Json,
    /// FeatureCollection with one polygon per box
    Geojson,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Geojson => "geojson",
        }
    }

    pub fn render(&self, result: &DetectionResult) -> Result<String, CliError> {
        Ok(match self {
            Self::Json => result.to_json()?,
            Self::Geojson => result.to_geojson_string()?,
        })
    }

    pub fn write<P: AsRef<Path>>(&self, result: &DetectionResult, path: P) -> Result<(), CliError> {
        fs::write(path, self.render(result)?)?;
        Ok(())
    }
}

/// One image to run detection on
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ImageJob {
    pub name: String,
    pub image: String,
    /// Grayscale probability raster used instead of the model
    pub probability_map: Option<String>,
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchConfig {
    pub output_dir: String,
    /// ONNX segmentation model shared by jobs without a probability map
    pub model: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "DetectionConfig::from_env")]
    pub detection: DetectionConfig,
    pub jobs: Vec<ImageJob>,
}

impl BatchConfig {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BatchConfig)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: BatchConfig = toml::from_str(content)?;
        config.detection.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let config: BatchConfig = serde_json::from_str(content)?;
        config.detection.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Where the result of `job` is written
    pub fn output_path(&self, job: &ImageJob) -> PathBuf {
        Path::new(&self.output_dir).join(format!("{}.{}", job.name, self.format.extension()))
    }
}
