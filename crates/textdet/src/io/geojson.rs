use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DetectError, Result},
    types::{ChannelPlanes, DetectedBoxRect, DetectionResult, ImageDescriptor},
};

/// Properties attached to every box feature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[schemars(description = "Properties for detected text box features")]
pub struct BoxProperties {
    #[schemars(description = "Position of the box in discovery order")]
    pub index: usize,
    #[schemars(description = "Box width in original image pixels")]
    pub width: u32,
    #[schemars(description = "Box height in original image pixels")]
    pub height: u32,
}

const DIMENSION_KEYS: [&str; 4] = ["image_width", "image_height", "dest_width", "dest_height"];

impl DetectionResult {
    /// Export as a FeatureCollection with one closed polygon per box. Image and
    /// canvas dimensions travel as foreign members.
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.boxes.len());

        for (i, detected) in self.boxes.iter().enumerate() {
            let mut ring: Vec<Vec<f64>> = detected
                .rect
                .iter()
                .map(|&[x, y]| vec![f64::from(x), f64::from(y)])
                .collect();
            ring.push(ring[0].clone());

            let properties = BoxProperties {
                index: i,
                width: detected.width,
                height: detected.height,
            };
            let properties = match serde_json::to_value(properties)? {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            };

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(i))),
                properties,
                foreign_members: None,
            });
        }

        let descriptor = &self.descriptor;
        let mut foreign_members = JsonObject::new();
        let dimensions = [
            descriptor.width,
            descriptor.height,
            descriptor.dest_width,
            descriptor.dest_height,
        ];
        for (key, value) in DIMENSION_KEYS.iter().zip(dimensions) {
            foreign_members.insert(key.to_string(), serde_json::Value::from(value));
        }
        foreign_members.insert(
            "box_count".to_string(),
            serde_json::Value::from(self.boxes.len()),
        );

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    pub fn save_geojson<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    pub fn from_geojson_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_string(&geojson_str)
    }

    /// Load a result written by [`DetectionResult::to_geojson`]. Channel planes
    /// are not stored and come back empty.
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        let geojson: FeatureCollection = geojson_str.parse()?;

        let foreign_members = geojson
            .foreign_members
            .as_ref()
            .ok_or_else(|| DetectError::InvalidResult("Missing image dimensions in GeoJSON".to_string()))?;
        let dimension = |key: &str| {
            foreign_members
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| DetectError::InvalidResult(format!("Missing or invalid {key}")))
        };

        let descriptor = ImageDescriptor {
            width: dimension(DIMENSION_KEYS[0])?,
            height: dimension(DIMENSION_KEYS[1])?,
            dest_width: dimension(DIMENSION_KEYS[2])?,
            dest_height: dimension(DIMENSION_KEYS[3])?,
            planes: ChannelPlanes::default(),
        };

        let mut boxes = Vec::with_capacity(geojson.features.len());
        for feature in geojson.features {
            let Some(Geometry { value: Value::Polygon(rings), .. }) = feature.geometry else {
                continue;
            };
            let Some(ring) = rings.first() else {
                continue;
            };
            if ring.len() < 4 {
                return Err(DetectError::InvalidResult(format!(
                    "box polygon has {} positions, expected at least 4",
                    ring.len()
                )));
            }

            let mut rect = [[0i32; 2]; 4];
            for (slot, position) in rect.iter_mut().zip(ring) {
                let x = position.first().copied().unwrap_or_default();
                let y = position.get(1).copied().unwrap_or_default();
                *slot = [x as i32, y as i32];
            }

            let properties: Option<BoxProperties> = feature
                .properties
                .map(|p| serde_json::from_value(serde_json::Value::Object(p)))
                .transpose()?;
            let (width, height) = properties.map(|p| (p.width, p.height)).unwrap_or_default();

            boxes.push(DetectedBoxRect { rect, width, height });
        }

        Ok(DetectionResult { descriptor, boxes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> DetectionResult {
        DetectionResult {
            descriptor: ImageDescriptor {
                width: 200,
                height: 100,
                dest_width: 224,
                dest_height: 96,
                planes: ChannelPlanes::default(),
            },
            boxes: vec![
                DetectedBoxRect {
                    rect: [[10, 10], [60, 10], [60, 30], [10, 30]],
                    width: 50,
                    height: 20,
                },
                DetectedBoxRect {
                    rect: [[100, 40], [150, 45], [148, 65], [98, 60]],
                    width: 50,
                    height: 20,
                },
            ],
        }
    }

    #[test]
    fn test_feature_per_box() {
        let collection = sample().to_geojson().unwrap();
        assert_eq!(collection.features.len(), 2);

        let feature = &collection.features[1];
        let Some(Value::Polygon(rings)) = feature.geometry.as_ref().map(|g| g.value.clone()) else {
            panic!("expected polygon geometry");
        };
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0][0], rings[0][4]);
        assert_eq!(rings[0][1], vec![150.0, 45.0]);

        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["index"], 1);
        assert_eq!(properties["width"], 50);

        let members = collection.foreign_members.unwrap();
        assert_eq!(members["image_width"], 200);
        assert_eq!(members["dest_height"], 96);
        assert_eq!(members["box_count"], 2);
    }

    #[test]
    fn test_empty_result() {
        let mut result = sample();
        result.boxes.clear();
        let collection = result.to_geojson().unwrap();
        assert!(collection.features.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boxes.geojson");
        let result = sample();
        result.save_geojson(&path).unwrap();

        let loaded = DetectionResult::from_geojson_file(&path).unwrap();
        assert_eq!(loaded, result);
    }

    #[test]
    fn test_short_polygon_is_invalid_result() {
        let text = r#"{
            "type": "FeatureCollection",
            "image_width": 10, "image_height": 10, "dest_width": 32, "dest_height": 32,
            "features": [{
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [5, 0], [0, 0]]]}
            }]
        }"#;
        assert!(matches!(
            DetectionResult::from_geojson_string(text),
            Err(DetectError::InvalidResult(_))
        ));
    }

    #[test]
    fn test_missing_dimensions() {
        let text = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            DetectionResult::from_geojson_string(text),
            Err(DetectError::InvalidResult(_))
        ));
    }
}
