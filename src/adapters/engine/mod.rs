//! Unified PKCS#7 encryption engine trait for multiple implementations.
//!
//! Engines follow a file-based contract:
//! - the plaintext MIME entity is read from `input`
//! - `output` receives every header line (each followed by `\n`), then the
//!   engine's own S/MIME entity: `MIME-Version`, `Content-Disposition`,
//!   `Content-Type: application/x-pkcs7-mime; ...`,
//!   `Content-Transfer-Encoding`, a blank line and the base64 body
//!
//! Implementations:
//! - [`OpenSslEngine`]: in-process calls into libcrypto
//! - [`CommandEngine`]: the `openssl smime` tool, bounded by a timeout

mod command;
mod library;

pub use self::command::CommandEngine;
pub use self::library::OpenSslEngine;

use crate::domain::cert::RecipientSet;
use crate::domain::cipher::CipherChoice;
use crate::domain::headers::HeaderSet;
use crate::infra::config::{EngineKind, EnvelopeConfiguration};
use crate::infra::error::{SmimeError, SmimeResult};
use openssl::pkcs7::Pkcs7Flags;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Everything an engine needs for one encryption.
#[derive(Debug)]
pub struct EngineRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub recipients: &'a RecipientSet,
    pub headers: &'a HeaderSet,
    pub cipher: CipherChoice,
    /// Empty flags keep the engine from adding its own default headers
    /// (`TEXT` would prepend `Content-Type: text/plain`).
    pub flags: Pkcs7Flags,
}

/// A PKCS#7 enveloped-data encryption engine.
pub trait EnvelopeEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Encrypt `request.input` for the recipients into `request.output`.
    ///
    /// # Errors
    ///
    /// Returns [`SmimeError::EncryptionFailed`] when no envelope could be
    /// produced.
    fn encrypt(&self, request: &EngineRequest<'_>) -> SmimeResult<()>;
}

impl<E: EnvelopeEngine + ?Sized> EnvelopeEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn encrypt(&self, request: &EngineRequest<'_>) -> SmimeResult<()> {
        (**self).encrypt(request)
    }
}

/// Build the engine selected by configuration.
#[must_use]
pub fn create_engine(config: &EnvelopeConfiguration) -> Box<dyn EnvelopeEngine> {
    match config.engine.kind {
        EngineKind::Library => Box::new(OpenSslEngine),
        EngineKind::Command => Box::new(CommandEngine::new(
            &config.engine.openssl_binary,
            config.engine_timeout(),
            config.scratch_dir(),
        )),
    }
}

fn require_recipients(recipients: &RecipientSet) -> SmimeResult<()> {
    if recipients.is_empty() {
        return Err(SmimeError::EncryptionFailed(
            "no recipient certificates".to_string(),
        ));
    }
    Ok(())
}

/// Replace the contents of `output` with the header block followed by the
/// engine's S/MIME entity.
fn write_output(output: &Path, headers: &HeaderSet, smime: &[u8]) -> SmimeResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(output)
        .map_err(|e| {
            SmimeError::EncryptionFailed(format!(
                "cannot open output {}: {e}",
                output.display()
            ))
        })?;
    file.write_all(headers.to_block().as_bytes())?;
    file.write_all(smime)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_output_prepends_headers() {
        let out = NamedTempFile::new().unwrap();
        std::fs::write(out.path(), "stale content that is longer than the new one").unwrap();

        let headers = HeaderSet::normalize("X-Test: 1\nSubject: hi");
        write_output(out.path(), &headers, b"MIME-Version: 1.0\n\nAAAA\n").unwrap();

        let written = std::fs::read_to_string(out.path()).unwrap();
        assert_eq!(written, "X-Test: 1\nSubject: hi\nMIME-Version: 1.0\n\nAAAA\n");
    }

    #[test]
    fn test_empty_recipients_rejected() {
        assert!(matches!(
            require_recipients(&RecipientSet::Many(Vec::new())),
            Err(SmimeError::EncryptionFailed(_))
        ));
    }

    #[test]
    fn test_create_engine_follows_config() {
        let mut config = EnvelopeConfiguration::default();
        assert_eq!(create_engine(&config).name(), "openssl-library");
        config.engine.kind = EngineKind::Command;
        assert_eq!(create_engine(&config).name(), "openssl-command");
    }
}
