//! In-memory `IsicSource` for unit tests; records every call.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::{ApiError, Endpoint, IsicSource};

#[derive(Default)]
pub(crate) struct FakeSource {
    json: HashMap<String, Value>,
    files: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_json(mut self, endpoint: &str, body: Value) -> Self {
        self.json.insert(endpoint.to_string(), body);
        self
    }

    pub(crate) fn with_file(mut self, endpoint: &str, body: &[u8]) -> Self {
        self.files.insert(endpoint.to_string(), body.to_vec());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &Endpoint) -> String {
        let key = endpoint.to_string();
        self.calls.lock().unwrap().push(key.clone());
        key
    }

    fn not_found(key: String) -> ApiError {
        ApiError::Http {
            status: 404,
            url: key,
        }
    }
}

impl IsicSource for FakeSource {
    fn get_json(&self, endpoint: &Endpoint) -> Result<Value, ApiError> {
        let key = self.record(endpoint);
        match self.json.get(&key) {
            Some(v) => Ok(v.clone()),
            None => Err(Self::not_found(key)),
        }
    }

    fn download(&self, endpoint: &Endpoint, dest: &Path) -> Result<u64, ApiError> {
        let key = self.record(endpoint);
        match self.files.get(&key) {
            Some(body) => {
                std::fs::write(dest, body)?;
                Ok(body.len() as u64)
            }
            None => Err(Self::not_found(key)),
        }
    }
}
