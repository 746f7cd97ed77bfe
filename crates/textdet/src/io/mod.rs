pub mod geojson;
pub mod json;

pub use self::geojson::BoxProperties;
pub use self::json::result_schema;
