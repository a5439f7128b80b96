use futures::Stream;
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, DownloadRequest, DownloadResponse, RateLimits};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Download failed")]
    DownloadFailed,

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Largest body fetched for an in-app preview
pub const MAX_PREVIEW_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Ask the backend to resolve `url` into a downloadable media URL.
    ///
    /// Any non-2xx status is reported as a bare [`ApiError::DownloadFailed`];
    /// transport errors are logged here and handed back unchanged.
    pub async fn download_content(&self, url: &str) -> Result<DownloadResponse> {
        let endpoint = self.config.endpoint("download");
        let body = DownloadRequest {
            url: url.to_string(),
        };

        tracing::debug!(%endpoint, %url, "requesting download");

        let response = match self.http.post(&endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, %endpoint, "download request failed");
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "backend rejected download");
            return Err(ApiError::DownloadFailed);
        }

        let content: DownloadResponse = match response.json().await {
            Ok(content) => content,
            Err(e) if e.is_decode() => {
                tracing::error!(error = %e, "download response is not valid JSON");
                return Err(ApiError::InvalidResponse(format!("JSON decode error: {}", e)));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read download response");
                return Err(e.into());
            }
        };

        if let Err(e) = validate_media_url(&content.url) {
            tracing::error!(error = %e, "download response rejected");
            return Err(e);
        }

        tracing::info!(media_url = %content.url, "download resolved");
        Ok(content)
    }

    /// Remaining request budget for this client, per window
    pub async fn get_limits(&self) -> Result<RateLimits> {
        let response = self
            .http
            .get(self.config.endpoint("limits"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::ApiError(format!("Limits request failed: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// Fetch a media resource for previewing.
    ///
    /// Returns `Ok(None)` without reading the body when the server says it is
    /// not an image, and gives up once more than [`MAX_PREVIEW_BYTES`] arrive.
    pub async fn fetch_preview(&self, media_url: &str) -> Result<Option<bytes::Bytes>> {
        self.fetch_preview_within(media_url, MAX_PREVIEW_BYTES).await
    }

    async fn fetch_preview_within(
        &self,
        media_url: &str,
        limit: u64,
    ) -> Result<Option<bytes::Bytes>> {
        let mut response = self
            .http
            .get(media_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::ApiError(format!("Media request failed: {}", e)))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase());
        if let Some(content_type) = content_type.filter(|ct| !ct.starts_with("image/")) {
            tracing::debug!(%media_url, %content_type, "skipping preview of non-image media");
            return Ok(None);
        }

        if response.content_length().is_some_and(|len| len > limit) {
            tracing::debug!(%media_url, "media too large to preview");
            return Ok(None);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() as u64 + chunk.len() as u64 > limit {
                tracing::debug!(%media_url, "media too large to preview");
                return Ok(None);
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Some(bytes::Bytes::from(body)))
    }

    /// Download file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        media_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self
            .http
            .get(media_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::ApiError(format!("Download request failed: {}", e)))?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}

fn validate_media_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw)
        .map_err(|e| ApiError::InvalidResponse(format!("media url {:?}: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ApiError::InvalidResponse(format!(
            "unsupported media url scheme: {}",
            other
        ))),
    }
}
