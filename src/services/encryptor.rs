//! Envelope encryption orchestration.
//!
//! One call runs start to finish on the caller's thread:
//! 1. normalize headers and frame the plaintext MIME entity
//! 2. select the content-encryption cipher
//! 3. provision input/output scratch files
//! 4. run the PKCS#7 engine against them
//! 5. read the engine output
//! 6. destroy both scratch files, whatever happened before
//! 7. split the output into headers and body and capture the PKCS#7
//!    media-type parameters
//!
//! Nothing is shared between calls: scratch files are per call and the
//! captured parameters travel inside the returned [`EncryptedEnvelope`].

use crate::adapters::engine::{EngineRequest, EnvelopeEngine};
use crate::domain::cert::RecipientSet;
use crate::domain::cipher::CipherChoice;
use crate::domain::envelope::EncryptedEnvelope;
use crate::domain::headers::{HeaderInput, HeaderSet};
use crate::infra::config::EnvelopeConfiguration;
use crate::infra::diagnostics::{DiagnosticSink, LogSink};
use crate::infra::error::{SmimeError, SmimeResult};
use crate::infra::scratch::ScratchFile;
use crate::services::cipher::select_cipher;
use openssl::pkcs7::Pkcs7Flags;
use std::sync::Arc;

/// Encrypts messages for recipient certificates through an [`EnvelopeEngine`].
pub struct EnvelopeEncryptor<E> {
    engine: E,
    config: EnvelopeConfiguration,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<E: EnvelopeEngine> EnvelopeEncryptor<E> {
    pub fn new(engine: E, config: EnvelopeConfiguration) -> Self {
        Self {
            engine,
            config,
            diagnostics: Arc::new(LogSink),
        }
    }

    /// Route scratch-file cleanup failures to `sink`.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &EnvelopeConfiguration {
        &self.config
    }

    /// Encrypt `message` with `headers` for `recipients`.
    ///
    /// # Errors
    ///
    /// - [`SmimeError::CipherUnavailable`] if no acceptable cipher exists
    /// - [`SmimeError::EncryptionFailed`] if the engine produced no output
    /// - [`SmimeError::MalformedEnvelope`] if the output lacks a header/body
    ///   boundary or a body
    ///
    /// Scratch-file cleanup failures never surface here; they go to the
    /// diagnostic sink.
    pub fn encrypt(
        &self,
        message: &str,
        headers: impl Into<HeaderInput>,
        recipients: &RecipientSet,
    ) -> SmimeResult<EncryptedEnvelope> {
        let headers = HeaderSet::normalize(headers);
        let plaintext = headers.frame(message);

        let cipher = select_cipher(
            self.config.preferred_cipher()?,
            self.config.cipher.allow_legacy_fallback,
        )?;

        log::info!(
            "Encrypting {} byte message for {} recipient(s) with {cipher} via {}",
            message.len(),
            recipients.len(),
            self.engine.name()
        );

        let scratch_dir = self.config.scratch_dir();
        let input = ScratchFile::provision(&scratch_dir, plaintext.as_bytes())?;
        let output = match ScratchFile::reserve(&scratch_dir) {
            Ok(output) => output,
            Err(e) => {
                self.discard(input);
                return Err(e);
            }
        };

        let raw = self.run_engine(&input, &output, recipients, &headers, cipher);

        self.discard(input);
        self.discard(output);

        let raw = raw?;
        if raw.is_empty() {
            return Err(SmimeError::EncryptionFailed(
                "engine produced no output".to_string(),
            ));
        }
        let text = String::from_utf8(raw).map_err(|_| {
            SmimeError::MalformedEnvelope("engine output is not valid UTF-8".to_string())
        })?;

        let envelope = EncryptedEnvelope::from_engine_output(&text)?;
        log::info!(
            "Built S/MIME envelope: {} header bytes, {} body bytes",
            envelope.headers.len(),
            envelope.message.len()
        );
        Ok(envelope)
    }

    fn run_engine(
        &self,
        input: &ScratchFile,
        output: &ScratchFile,
        recipients: &RecipientSet,
        headers: &HeaderSet,
        cipher: CipherChoice,
    ) -> SmimeResult<Vec<u8>> {
        let request = EngineRequest {
            input: input.path(),
            output: output.path(),
            recipients,
            headers,
            cipher,
            flags: Pkcs7Flags::empty(),
        };

        self.engine.encrypt(&request).map_err(|e| match e {
            SmimeError::EncryptionFailed(_) | SmimeError::CipherUnavailable(_) => e,
            other => SmimeError::EncryptionFailed(other.to_string()),
        })?;

        output
            .read()
            .map_err(|e| SmimeError::EncryptionFailed(e.to_string()))
    }

    fn discard(&self, scratch: ScratchFile) {
        if let Err(e) = scratch.destroy() {
            self.diagnostics.cleanup_failed(&e);
        }
    }
}
