//! In-process engine backed by libcrypto's PKCS#7 routines.

use super::{require_recipients, write_output, EngineRequest, EnvelopeEngine};
use crate::infra::error::{SmimeError, SmimeResult};
use openssl::pkcs7::Pkcs7;
use std::fs;

/// Encrypts with `PKCS7_encrypt` and serializes with `SMIME_write_PKCS7`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSslEngine;

impl EnvelopeEngine for OpenSslEngine {
    fn name(&self) -> &'static str {
        "openssl-library"
    }

    fn encrypt(&self, request: &EngineRequest<'_>) -> SmimeResult<()> {
        require_recipients(request.recipients)?;

        let plaintext = fs::read(request.input).map_err(|e| {
            SmimeError::EncryptionFailed(format!(
                "cannot read input {}: {e}",
                request.input.display()
            ))
        })?;

        let cipher = request.cipher.resolve().ok_or_else(|| {
            SmimeError::CipherUnavailable(request.cipher.as_str().to_string())
        })?;
        let certs = request.recipients.to_stack()?;

        let pkcs7 = Pkcs7::encrypt(&certs, &plaintext, cipher, request.flags)?;
        let smime = pkcs7.to_smime(&[], request.flags)?;
        log::debug!(
            "PKCS#7 envelope for {} recipient(s): {} bytes",
            request.recipients.len(),
            smime.len()
        );

        write_output(request.output, request.headers, &smime)
    }
}
