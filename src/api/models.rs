use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of the /download endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
}

/// Response from the /download endpoint
///
/// Only `url` is part of the contract; anything else the backend sends is
/// carried along untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DownloadResponse {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response from the /limits endpoint: requests left in each window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimits {
    pub minute: i64,
    pub hour: i64,
    pub day: i64,
}

pub const API_URL_ENV: &str = "INSTA_DL_API_URL";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Default config, with the base URL taken from `INSTA_DL_API_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::new(value.trim()),
            _ => Self::default(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
