//! Content-encryption cipher selection.
//!
//! The preferred cipher is used when the OpenSSL provider exposes it. The
//! only fallback is 3DES-CBC, and only when explicitly allowed; otherwise an
//! unavailable cipher is an error rather than a silent downgrade.

use crate::domain::cipher::CipherChoice;
use crate::infra::error::{SmimeError, SmimeResult};

/// Pick the cipher for one encryption call.
pub fn select_cipher(preferred: CipherChoice, allow_legacy_fallback: bool) -> SmimeResult<CipherChoice> {
    select_cipher_with(preferred, allow_legacy_fallback, |choice| {
        choice.resolve().is_some()
    })
}

/// [`select_cipher`] with an injectable availability probe.
pub fn select_cipher_with<F>(
    preferred: CipherChoice,
    allow_legacy_fallback: bool,
    available: F,
) -> SmimeResult<CipherChoice>
where
    F: Fn(CipherChoice) -> bool,
{
    if available(preferred) {
        if preferred.is_legacy() {
            log::warn!("Configured cipher {preferred} is a legacy cipher");
        }
        return Ok(preferred);
    }

    let fallback = CipherChoice::TripleDesCbc;
    if allow_legacy_fallback && available(fallback) {
        log::warn!("Cipher {preferred} unavailable, falling back to legacy {fallback}");
        return Ok(fallback);
    }

    Err(SmimeError::CipherUnavailable(format!(
        "{preferred} is not provided by the linked OpenSSL"
    )))
}
