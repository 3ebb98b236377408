//! Error types for the gazprep core library
//!
//! Per-record processing never fails: missing fields resolve to documented
//! defaults. Errors only surface while building a [`StageConfig`](crate::StageConfig)
//! or when a host hands over something that is not a record at all.

use thiserror::Error;

/// Main error type for gazprep operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors raised while building the stage
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Input that cannot be treated as a record
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("short_name_threshold must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: short_name_threshold must be positive"
        );
    }

    #[test]
    fn test_io_conversion_keeps_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "stopterms.txt");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("stopterms.txt"));
    }

    #[test]
    fn test_json_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
