//! S/MIME Envelope Library
//!
//! Builds S/MIME (PKCS#7 enveloped-data) mail bodies from a plaintext
//! message, its MIME headers and one or more X.509 recipient certificates.
//! Plaintext and ciphertext only ever touch disk inside scratch files that
//! are overwritten with random data and removed before each call returns.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use adapters::engine::{CommandEngine, EngineRequest, EnvelopeEngine, OpenSslEngine};
pub use domain::cert::{Certificate, CertificateInput, RecipientSet};
pub use domain::cipher::CipherChoice;
pub use domain::envelope::{EncryptedEnvelope, MediaTypeParameters};
pub use domain::headers::{filter_header, split_headers, HeaderInput, HeaderSet};
pub use infra::config::{ConfigManager, EnvelopeConfiguration};
pub use infra::diagnostics::{DiagnosticSink, LogSink, RecordingSink};
pub use infra::error::{SmimeError, SmimeResult};
pub use services::encryptor::EnvelopeEncryptor;
pub use services::mail::{ContentTypeFilter, MailDispatcher, MailHeaderPipeline, Mailer};
pub use services::rehydrator::ContentTypeRehydrator;

/// Acquire a certificate handle from PEM text, DER bytes or a file reference.
pub fn get_certificate(input: impl Into<CertificateInput>) -> SmimeResult<Certificate> {
    services::codec::get_certificate(input.into())
}

/// Serialize a certificate to PEM text.
pub fn pem_encode(certificate: &Certificate) -> SmimeResult<String> {
    services::codec::pem_encode(certificate)
}

/// Strip PEM armour and base64-decode the remaining body.
pub fn pem_to_der(pem: &str) -> SmimeResult<Vec<u8>> {
    services::codec::pem_to_der(pem)
}

/// Encrypt `message` for `recipients` with the in-process OpenSSL engine and
/// default configuration.
pub fn smime_encrypt(
    message: &str,
    headers: impl Into<HeaderInput>,
    recipients: &RecipientSet,
) -> SmimeResult<EncryptedEnvelope> {
    let encryptor = EnvelopeEncryptor::new(OpenSslEngine, EnvelopeConfiguration::default());
    encryptor.encrypt(message, headers, recipients)
}

#[cfg(test)]
mod test_support;
