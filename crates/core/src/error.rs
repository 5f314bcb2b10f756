use thiserror::Error;

/// Errors raised while loading or validating local configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while pulling content from the backend.
///
/// Pagination surfaces these to the caller instead of dropping them; the
/// caller keeps its previous feed state and decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(String),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the JSON shape we expect
    #[error("Parse error: {0}")]
    Parse(String),
    /// No document exists for the requested uid
    #[error("Document not found: {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::HttpStatus(503).to_string(), "HTTP error: status 503");
        assert_eq!(
            FetchError::NotFound("hello".into()).to_string(),
            "Document not found: hello"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(FetchError::NotFound("x".into()).is_not_found());
        assert!(!FetchError::Timeout.is_not_found());
    }

    #[test]
    fn test_toml_error_maps_to_config_parse() {
        let err: Error = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
