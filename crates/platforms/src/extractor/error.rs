use hls::ManifestError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unknown channel `{0}`")]
    ChannelNotFound(String),
    #[error("content not found: {0}")]
    ContentNotFound(String),
    #[error("content is not available in this region")]
    RegionLocked,
    #[error("invalid quality `{0}`, expected min, max, an index or a resolution such as 720p")]
    InvalidQuality(String),
    #[error("quality `{requested}` unavailable, {available} variants offered")]
    QualityUnavailable { requested: String, available: usize },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request to {url} failed with HTTP {status}")]
    HttpStatus { status: StatusCode, url: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

impl ExtractorError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Errors caused by what the user asked for rather than by the service.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::ChannelNotFound(_)
                | Self::ContentNotFound(_)
                | Self::InvalidQuality(_)
                | Self::QualityUnavailable { .. }
        )
    }
}
