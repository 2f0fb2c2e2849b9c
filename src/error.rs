use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenImageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Upstream error: {0}")]
    UpstreamError(String),
    #[error("No image was generated. Please try a different prompt")]
    NoImageProduced,
    #[error("Encode error: {0}")]
    EncodeError(String),
    #[error("Filesystem write error: {0}")]
    FilesystemWriteError(String),
    #[error("Object store init error: {0}")]
    ObjectStoreInitError(String),
    #[error("Object store write error: {0}")]
    ObjectStoreWriteError(String),
}

impl GenImageError {
    /// Only a missing or unusable configuration halts the process; everything
    /// else is reported to the user and the session carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenImageError::ConfigError(_))
    }
}

pub type Result<T> = std::result::Result<T, GenImageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(GenImageError::ConfigError("GEMINI_API_KEY".into()).is_fatal());
        assert!(!GenImageError::NoImageProduced.is_fatal());
        assert!(!GenImageError::FilesystemWriteError("disk full".into()).is_fatal());
        assert!(!GenImageError::UpstreamError("quota".into()).is_fatal());
    }

    #[test]
    fn test_upstream_message_is_reported_verbatim() {
        let err = GenImageError::UpstreamError("API key not valid".into());
        assert_eq!(err.to_string(), "Upstream error: API key not valid");
    }
}
