//! Certificate handles and recipient sets.

use crate::domain::constants::FILE_URI_PREFIX;
use openssl::stack::Stack;
use openssl::x509::X509;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Raw certificate material accepted by certificate acquisition.
#[derive(Clone, PartialEq, Eq)]
pub enum CertificateInput {
    /// PEM text (`-----BEGIN CERTIFICATE-----` ...)
    Pem(String),
    /// DER bytes
    Der(Vec<u8>),
    /// File holding PEM or DER
    Path(PathBuf),
}

impl From<&str> for CertificateInput {
    fn from(value: &str) -> Self {
        match value.strip_prefix(FILE_URI_PREFIX) {
            Some(path) => CertificateInput::Path(PathBuf::from(path)),
            None => CertificateInput::Pem(value.to_string()),
        }
    }
}

impl From<String> for CertificateInput {
    fn from(value: String) -> Self {
        if value.starts_with(FILE_URI_PREFIX) {
            CertificateInput::from(value.as_str())
        } else {
            CertificateInput::Pem(value)
        }
    }
}

impl From<Vec<u8>> for CertificateInput {
    fn from(value: Vec<u8>) -> Self {
        CertificateInput::Der(value)
    }
}

impl From<&[u8]> for CertificateInput {
    fn from(value: &[u8]) -> Self {
        CertificateInput::Der(value.to_vec())
    }
}

impl From<PathBuf> for CertificateInput {
    fn from(value: PathBuf) -> Self {
        CertificateInput::Path(value)
    }
}

impl From<&Path> for CertificateInput {
    fn from(value: &Path) -> Self {
        CertificateInput::Path(value.to_path_buf())
    }
}

impl fmt::Debug for CertificateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateInput::Pem(text) => write!(f, "Pem(len={})", text.len()),
            CertificateInput::Der(bytes) => write!(f, "Der(len={})", bytes.len()),
            CertificateInput::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

/// A parsed, validated X.509 certificate.
///
/// Only produced by certificate acquisition, which guarantees the wrapped
/// object decodes as an X.509 `Certificate` structure.
#[derive(Clone)]
pub struct Certificate {
    x509: X509,
    der: Box<[u8]>,
    subject: String,
}

impl Certificate {
    pub(crate) fn new(x509: X509, der: Vec<u8>, subject: String) -> Self {
        Self {
            x509,
            der: der.into_boxed_slice(),
            subject,
        }
    }

    #[must_use]
    pub fn as_x509(&self) -> &X509 {
        &self.x509
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name in RFC 4514 form.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Lowercase hex SHA-256 of the DER encoding.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.der))
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Certificate(subject={}, der_len={})",
            self.subject,
            self.der.len()
        )
    }
}

/// One recipient certificate or an ordered list of them.
///
/// Passed unchanged to the PKCS#7 engine; duplicates and validity are the
/// engine's concern.
#[derive(Debug, Clone)]
pub enum RecipientSet {
    Single(Certificate),
    Many(Vec<Certificate>),
}

impl RecipientSet {
    #[must_use]
    pub fn certificates(&self) -> &[Certificate] {
        match self {
            RecipientSet::Single(cert) => std::slice::from_ref(cert),
            RecipientSet::Many(certs) => certs,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates().is_empty()
    }

    /// OpenSSL certificate stack in recipient order.
    pub fn to_stack(&self) -> Result<Stack<X509>, openssl::error::ErrorStack> {
        let mut stack = Stack::new()?;
        for cert in self.certificates() {
            stack.push(cert.as_x509().clone())?;
        }
        Ok(stack)
    }
}

impl From<Certificate> for RecipientSet {
    fn from(cert: Certificate) -> Self {
        RecipientSet::Single(cert)
    }
}

impl From<Vec<Certificate>> for RecipientSet {
    fn from(certs: Vec<Certificate>) -> Self {
        RecipientSet::Many(certs)
    }
}
