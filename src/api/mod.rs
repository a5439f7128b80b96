pub mod client;
pub mod models;

pub use client::{ApiClient, Result};
pub use models::{ApiConfig, DownloadResponse, RateLimits};
