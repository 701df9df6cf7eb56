//! Curl-backed API client.
//!
//! Authenticates once with HTTP Basic credentials, then sends the returned
//! token as `Girder-Token` on every request. Each call builds its own curl
//! handle, so one client can be shared by all worker threads.

use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::{ApiError, Endpoint, IsicSource};
use crate::config::IsicConfig;
use crate::storage;

const USER_AGENT: &str = concat!("isic-dl/", env!("CARGO_PKG_VERSION"));
const TOKEN_HEADER: &str = "Girder-Token";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "authToken")]
    auth_token: AuthToken,
}

#[derive(Debug, Deserialize)]
struct AuthToken {
    token: String,
}

/// Authenticated session against the archive API.
#[derive(Debug, Clone)]
pub struct IsicApi {
    base_url: Url,
    token: Option<String>,
    connect_timeout: Duration,
}

impl IsicApi {
    /// Unauthenticated client for `base_url`. A trailing `/` is added if missing
    /// so endpoint paths are joined under it rather than replacing its last segment.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, ApiError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&base)?,
            token: None,
            connect_timeout,
        })
    }

    /// Build a client from config and authenticate with `username`/`password`.
    pub fn login(config: &IsicConfig, username: &str, password: &str) -> Result<Self, ApiError> {
        let mut api = Self::new(
            &config.api_base_url,
            Duration::from_secs(config.connect_timeout_secs),
        )?;
        api.authenticate(username, password)?;
        Ok(api)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = Endpoint::authentication().url(&self.base_url)?;
        let mut easy = self.easy_for(&url)?;
        let mut auth = curl::easy::Auth::new();
        auth.basic(true);
        easy.http_auth(&auth)?;
        easy.username(username)?;
        easy.password(password)?;

        let body = match perform_collect(&mut easy, &url) {
            Ok(body) => body,
            Err(ApiError::Http { status, .. }) if status == 401 || status == 403 => {
                return Err(ApiError::Auth(format!(
                    "credentials rejected (HTTP {})",
                    status
                )));
            }
            Err(e) => return Err(e),
        };
        let parsed: AuthResponse = serde_json::from_slice(&body).map_err(|source| ApiError::Json {
            url: url.to_string(),
            source,
        })?;
        if parsed.auth_token.token.is_empty() {
            return Err(ApiError::Auth("empty token in response".to_string()));
        }
        self.token = Some(parsed.auth_token.token);
        tracing::info!("authenticated against {}", self.base_url);
        Ok(())
    }

    fn easy_for(&self, url: &Url) -> Result<curl::easy::Easy, ApiError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.useragent(USER_AGENT)?;

        if let Some(token) = &self.token {
            let mut list = curl::easy::List::new();
            list.append(&format!("{}: {}", TOKEN_HEADER, token))?;
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

/// Perform the transfer, buffering the body in memory. Fails on non-2xx.
fn perform_collect(easy: &mut curl::easy::Easy, url: &Url) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    check_status(easy, url)?;
    Ok(body)
}

fn check_status(easy: &mut curl::easy::Easy, url: &Url) -> Result<(), ApiError> {
    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            url: url.to_string(),
        });
    }
    Ok(())
}

impl IsicSource for IsicApi {
    fn get_json(&self, endpoint: &Endpoint) -> Result<Value, ApiError> {
        let url = endpoint.url(&self.base_url)?;
        let mut easy = self.easy_for(&url)?;
        let body = perform_collect(&mut easy, &url)?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Json {
            url: url.to_string(),
            source,
        })
    }

    fn download(&self, endpoint: &Endpoint, dest: &Path) -> Result<u64, ApiError> {
        let url = endpoint.url(&self.base_url)?;
        let part = storage::temp_path(dest);
        let result = stream_to_file(self, &url, &part);
        match result {
            Ok(written) => {
                std::fs::rename(&part, dest)?;
                Ok(written)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                Err(e)
            }
        }
    }
}

fn stream_to_file(api: &IsicApi, url: &Url, part: &Path) -> Result<u64, ApiError> {
    let mut file = File::create(part)?;
    let mut written = 0u64;
    let mut write_error: Option<std::io::Error> = None;

    let mut easy = api.easy_for(url)?;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Err(e) = performed {
        if e.is_write_error() {
            if let Some(io_err) = write_error.take() {
                return Err(ApiError::Storage(io_err));
            }
        }
        return Err(ApiError::Curl(e));
    }
    check_status(&mut easy, url)?;
    file.flush()?;
    Ok(written)
}
