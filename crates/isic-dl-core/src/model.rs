//! Records exchanged with the archive API and stored in the metadata cache.
//!
//! Only the identifier (and, for detail records, the segmentation list) is
//! interpreted; every other field is carried through verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File extension used for every downloaded asset.
pub const ASSET_EXTENSION: &str = "jpg";

/// Asset file name for an identifier: `{id}.jpg`.
pub fn asset_file_name(id: &str) -> String {
    format!("{}.{}", id, ASSET_EXTENSION)
}

/// One entry of the paginated image listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A mask annotation belonging to one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Segmentation {
    pub fn mask_file_name(&self) -> String {
        asset_file_name(&self.id)
    }
}

/// Image detail enriched with its segmentation sub-records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub segmentation: Vec<Segmentation>,
}

impl DetailRecord {
    pub fn image_file_name(&self) -> String {
        asset_file_name(&self.id)
    }

    /// The `meta.clinical` object, if the record carries one.
    pub fn clinical(&self) -> Option<&Map<String, Value>> {
        self.fields
            .get("meta")
            .and_then(|meta| meta.get("clinical"))
            .and_then(Value::as_object)
    }
}
