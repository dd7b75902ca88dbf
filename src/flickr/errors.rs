//! Error types for the Flickr API client.

#[derive(Debug, thiserror::Error)]
pub enum FlickrError {
    #[error("request to Flickr failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Flickr answered with HTTP {status}")]
    Status { status: u16 },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Flickr API error {code}: {message}")]
    Service { code: u32, message: String },
    #[error("failed to parse {method} response")]
    ParseFailed {
        method: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl FlickrError {
    /// Map a `stat: "fail"` payload. Code 1 is what every read method uses
    /// for a missing user, set or photo.
    pub(crate) fn from_service(code: u32, message: String) -> Self {
        match code {
            1 => FlickrError::NotFound(message),
            _ => FlickrError::Service { code, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FlickrError::NotFound(_))
    }
}
