use serde::Deserialize;
use serde_json::Value;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * A region boundary from the static boundary dataset.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /**
     * Region name from the configured name property. Empty when the property is missing.
     */
    pub name: String,
    /**
     * The GeoJSON feature as read from the file.
     */
    pub feature: Value,
}

/**
 * Read-only set of region boundaries used for the choropleth map.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryDataset {
    features: Vec<BoundaryFeature>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Value>,
}

impl BoundaryDataset {
    /**
     * Reads the dataset from a GeoJSON file.
     *
     * # Arguments
     * `path`: Path to a GeoJSON `FeatureCollection`.
     * `name_property`: Feature property holding the region name.
     *
     * # Returns
     * The dataset or an `Initialization` error.
     */
    pub fn load(path: &str, name_property: &str) -> Result<Self, ApplicationError> {
        let contents = std::fs::read_to_string(path).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read boundary file {path}: {err}")))?;
        let dataset = Self::from_geojson(&contents, name_property)?;
        tracing::info!("Loaded {} region boundaries from {}", dataset.features.len(), path);
        Ok(dataset)
    }

    /**
     * Parses the dataset from GeoJSON text.
     */
    pub fn from_geojson(contents: &str, name_property: &str) -> Result<Self, ApplicationError> {
        let collection: FeatureCollection = serde_json::from_str(contents).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to parse boundary file: {err}")))?;
        if collection.kind != "FeatureCollection" {
            return Err(ApplicationError::new(ErrorType::Initialization, format!("Boundary file must be a FeatureCollection, found {}", collection.kind)));
        }
        let features = collection
            .features
            .into_iter()
            .map(|feature| {
                let name = feature.get("properties").and_then(|properties| properties.get(name_property)).and_then(Value::as_str).unwrap_or_default().to_string();
                if name.is_empty() {
                    tracing::warn!("Boundary feature without a '{}' property", name_property);
                }
                BoundaryFeature { name, feature }
            })
            .collect();
        Ok(BoundaryDataset { features })
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_geojson() {
        let contents = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"Metropolitan Manila"},"geometry":null},
            {"type":"Feature","properties":{"id":7},"geometry":null}
        ]}"#;
        let dataset = BoundaryDataset::from_geojson(contents, "name").unwrap();
        assert_eq!(dataset.features().len(), 2);
        assert_eq!(dataset.features()[0].name, "Metropolitan Manila");
        assert_eq!(dataset.features()[1].name, "");
    }

    #[test]
    fn test_from_geojson_rejects_other_types() {
        let err = BoundaryDataset::from_geojson(r#"{"type":"Feature","features":[]}"#, "name").unwrap_err();
        assert_eq!(err.error_type, ErrorType::Initialization);
        assert!(BoundaryDataset::from_geojson("not json", "name").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = BoundaryDataset::load("./does/not/exist.geojson", "name").unwrap_err();
        assert_eq!(err.error_type, ErrorType::Initialization);
    }
}
