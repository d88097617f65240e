//! Error handling types and result definitions for envelope operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for envelope operations
pub type SmimeResult<T> = Result<T, SmimeError>;

/// Error taxonomy for certificate, encryption and scratch-file operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum SmimeError {
    #[error("Not an X.509 certificate: {0}")]
    NotACertificate(String),

    #[error("Certificate export failed: {0}")]
    ExportError(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Non-fatal: reported through a diagnostic sink, never returned from `encrypt`.
    #[error("Scratch file cleanup failed for {}: {reason}", path.display())]
    CleanupFailed { path: PathBuf, reason: String },

    #[error("Cipher unavailable: {0}")]
    #[diagnostic(help(
        "enable `cipher.allow_legacy_fallback` only if recipients cannot handle AES"
    ))]
    CipherUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl SmimeError {
    pub(crate) fn cleanup(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        SmimeError::CleanupFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for SmimeError {
    fn from(error: std::io::Error) -> Self {
        SmimeError::IoError(error.to_string())
    }
}

impl From<openssl::error::ErrorStack> for SmimeError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        SmimeError::EncryptionFailed(error.to_string())
    }
}

impl From<der::Error> for SmimeError {
    fn from(error: der::Error) -> Self {
        SmimeError::NotACertificate(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SmimeError::EncryptionFailed("engine produced no output".to_string());
        assert_eq!(
            error.to_string(),
            "Encryption failed: engine produced no output"
        );

        let error = SmimeError::cleanup("/tmp/smime-abc", "permission denied");
        assert_eq!(
            error.to_string(),
            "Scratch file cleanup failed for /tmp/smime-abc: permission denied"
        );
    }

    #[test]
    fn test_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        match SmimeError::from(io) {
            SmimeError::IoError(msg) => assert_eq!(msg, "gone"),
            other => panic!("Wrong error type: {other:?}"),
        }
    }
}
