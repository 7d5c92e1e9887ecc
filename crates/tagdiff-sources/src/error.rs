//! Error types for tagdiff-sources

use thiserror::Error;

/// Errors that can occur while retrieving a source document
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS or TLS failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status other than 404
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// URL, file, repository or ref does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// git command failed
    #[error("git error: {0}")]
    Git(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source location string could not be understood
    #[error("invalid source location: {0}")]
    InvalidLocation(String),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            FetchError::Timeout(url)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl FetchError {
    /// Classify an HTTP status; `Ok(())` for 2xx.
    pub fn check_status(status: reqwest::StatusCode, url: &str) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(FetchError::NotFound(url.to_string()))
        } else {
            Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(FetchError::check_status(StatusCode::OK, "u").is_ok());
        assert!(matches!(
            FetchError::check_status(StatusCode::NOT_FOUND, "https://x/version.json"),
            Err(FetchError::NotFound(url)) if url == "https://x/version.json"
        ));
        assert!(matches!(
            FetchError::check_status(StatusCode::BAD_GATEWAY, "u"),
            Err(FetchError::Http { status: 502, .. })
        ));
    }

    #[test]
    fn test_http_error_display_names_url() {
        let err = FetchError::Http {
            status: 500,
            url: "https://cloud.stackgen.com/version.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 500 from https://cloud.stackgen.com/version.json"
        );
    }
}
