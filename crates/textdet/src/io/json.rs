use std::path::Path;

use schemars::schema::RootSchema;

use crate::{error::Result, types::DetectionResult};

impl DetectionResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn schema() -> RootSchema {
        result_schema()
    }
}

/// JSON Schema of the serialized [`DetectionResult`].
pub fn result_schema() -> RootSchema {
    schemars::schema_for!(DetectionResult)
}
