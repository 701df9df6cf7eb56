//! Archive REST API access.
//!
//! The pipeline talks to the archive through the [`IsicSource`] trait; the
//! production implementation is the curl-backed [`IsicApi`]. Endpoints are
//! described as relative paths plus query pairs and joined onto the
//! configured base URL at call time.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod fake;

pub use client::IsicApi;
pub use error::ApiError;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use url::Url;

/// Read-only access to the archive, shared by all workers of a batch phase.
pub trait IsicSource: Sync {
    /// GET `endpoint` and decode the body as JSON.
    fn get_json(&self, endpoint: &Endpoint) -> Result<Value, ApiError>;

    /// GET `endpoint` and stream the body into `dest`. Returns the number of bytes written.
    fn download(&self, endpoint: &Endpoint, dest: &Path) -> Result<u64, ApiError>;
}

/// GET `endpoint` and decode it into `T`.
pub fn fetch<S, T>(source: &S, endpoint: &Endpoint) -> Result<T, ApiError>
where
    S: IsicSource + ?Sized,
    T: DeserializeOwned,
{
    let value = source.get_json(endpoint)?;
    serde_json::from_value(value).map_err(|source| ApiError::Json {
        url: endpoint.to_string(),
        source,
    })
}

/// A relative API path with query parameters, e.g. `image?limit=10&offset=0&sort=name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Token handshake (HTTP Basic credentials).
    pub fn authentication() -> Self {
        Self::new("user/authentication")
    }

    /// One page of the image listing, sorted by name.
    pub fn images_page(limit: usize, offset: usize) -> Self {
        Self::new("image")
            .with("limit", limit)
            .with("offset", offset)
            .with("sort", "name")
    }

    pub fn image_detail(id: &str) -> Self {
        Self::new(format!("image/{}", id))
    }

    /// Segmentation sub-records of one image.
    pub fn segmentations_of(image_id: &str) -> Self {
        Self::new("segmentation").with("imageId", image_id)
    }

    pub fn image_file(id: &str) -> Self {
        Self::new(format!("image/{}/download", id))
    }

    pub fn mask_file(segmentation_id: &str) -> Self {
        Self::new(format!("segmentation/{}/mask", segmentation_id))
    }

    /// Absolute URL of this endpoint under `base` (which must end with `/`).
    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.join(&self.path)?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}
