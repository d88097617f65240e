//! PEM/DER conversions and certificate acquisition.
//!
//! Acquisition accepts PEM text, DER bytes or a file reference and only
//! yields a [`Certificate`] when the material decodes as an X.509
//! certificate. Parser diagnostics are folded into
//! [`SmimeError::NotACertificate`]; nothing is printed.

use crate::domain::cert::{Certificate, CertificateInput};
use crate::domain::constants::PEM_BOUNDARY_MARKER;
use crate::infra::error::{SmimeError, SmimeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use der::Decode;
use openssl::error::ErrorStack;
use openssl::x509::X509;
use std::fs;

/// Interpret `input` as an X.509 certificate.
pub fn get_certificate(input: CertificateInput) -> SmimeResult<Certificate> {
    let parsed = match &input {
        CertificateInput::Pem(text) => X509::from_pem(text.as_bytes()),
        CertificateInput::Der(bytes) => parse_material(bytes),
        CertificateInput::Path(path) => {
            let bytes = fs::read(path).map_err(|e| {
                SmimeError::NotACertificate(format!("cannot read {}: {e}", path.display()))
            })?;
            parse_material(&bytes)
        }
    };
    let x509 = parsed.map_err(|e| {
        log::debug!("Certificate parse failed for {input:?}: {e}");
        SmimeError::NotACertificate(format!("{input:?} is not an X.509 certificate"))
    })?;

    let der = x509
        .to_der()
        .map_err(|e| SmimeError::NotACertificate(e.to_string()))?;
    let decoded = x509_cert::Certificate::from_der(&der)?;
    let subject = decoded.tbs_certificate.subject.to_string();

    log::debug!("Acquired certificate: {subject}");
    Ok(Certificate::new(x509, der, subject))
}

/// PEM if the material starts with an encapsulation boundary, DER otherwise.
fn parse_material(bytes: &[u8]) -> Result<X509, ErrorStack> {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if bytes[start..].starts_with(PEM_BOUNDARY_MARKER.as_bytes()) {
        X509::from_pem(bytes)
    } else {
        X509::from_der(bytes)
    }
}

/// Serialize a certificate as RFC 7468 PEM text.
pub fn pem_encode(certificate: &Certificate) -> SmimeResult<String> {
    let pem = certificate
        .as_x509()
        .to_pem()
        .map_err(|e| SmimeError::ExportError(e.to_string()))?;
    String::from_utf8(pem).map_err(|e| SmimeError::ExportError(e.to_string()))
}

/// Convert PEM text to DER bytes.
///
/// Trims every line, drops lines starting with `-----`, concatenates the rest
/// and base64-decodes it. The decoded bytes are not checked for DER
/// well-formedness. Callers must pass exactly one PEM object; several objects
/// are silently concatenated.
pub fn pem_to_der(pem: &str) -> SmimeResult<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(PEM_BOUNDARY_MARKER))
        .collect();
    STANDARD
        .decode(body)
        .map_err(|e| SmimeError::InvalidInput(format!("PEM body is not valid base64: {e}")))
}
