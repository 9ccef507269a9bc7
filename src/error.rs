//! Error taxonomy shared by the key provisioner, the token issuer and the
//! binaries built on top of them.
//!
//! Every variant is terminal: callers print the message and abort the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for all key and token operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed config file, or a `sources` section of the wrong shape
    #[error("{0}")]
    Configuration(String),

    /// A file could not be read or written
    #[error("{action} {} failed", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes do not decode as an unencrypted private key
    #[error("deserializing key data failed. Does the file given contain a private key? ({0})")]
    Deserialization(String),

    /// Key type or curve outside of RS512 / ES256 / ES512
    #[error("{0}")]
    UnsupportedKey(String),

    /// Command line arity or argument validation
    #[error("{0}")]
    Argument(String),

    /// PEM, JSON or YAML encoding and signature production
    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl Error {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn unknown_key_type() -> Self {
        Self::UnsupportedKey("unknown key type".to_string())
    }

    pub fn encoding(err: impl std::fmt::Display) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::encoding(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::encoding(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "Writing to file",
            "/nonexistent/keys/a.pem",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(err.to_string(), "Writing to file /nonexistent/keys/a.pem failed");
    }

    #[test]
    fn test_io_error_reports_cause_once() {
        let err = Error::io(
            "Reading",
            "/srv/keys",
            io::Error::new(io::ErrorKind::Other, "Is a directory"),
        );
        assert!(!err.to_string().contains("Is a directory"));
        assert_eq!(
            std::error::Error::source(&err).map(|e| e.to_string()),
            Some("Is a directory".to_string())
        );

        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("Is a directory").count(), 1);
    }

    #[test]
    fn test_deserialization_message() {
        let err = Error::Deserialization("not PEM".to_string());
        assert!(err
            .to_string()
            .starts_with("deserializing key data failed. Does the file given contain a private key?"));
    }
}
