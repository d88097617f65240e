//! Content-encryption ciphers offered for enveloped data.
//!
//! 40-bit RC2 is deliberately absent.

use crate::infra::error::SmimeError;
use openssl::nid::Nid;
use openssl::symm::Cipher;
use std::fmt;
use std::str::FromStr;

/// Supported content-encryption ciphers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherChoice {
    Aes256Cbc,
    Aes128Cbc,
    /// Legacy fallback only
    TripleDesCbc,
}

impl CipherChoice {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherChoice::Aes256Cbc => "aes-256-cbc",
            CipherChoice::Aes128Cbc => "aes-128-cbc",
            CipherChoice::TripleDesCbc => "des-ede3-cbc",
        }
    }

    #[must_use]
    pub fn nid(&self) -> Nid {
        match self {
            CipherChoice::Aes256Cbc => Nid::AES_256_CBC,
            CipherChoice::Aes128Cbc => Nid::AES_128_CBC,
            CipherChoice::TripleDesCbc => Nid::DES_EDE3_CBC,
        }
    }

    /// The provider's cipher, if this OpenSSL build exposes it.
    #[must_use]
    pub fn resolve(&self) -> Option<Cipher> {
        Cipher::from_nid(self.nid())
    }

    /// Cipher switch understood by `openssl smime`.
    #[must_use]
    pub fn command_flag(&self) -> &'static str {
        match self {
            CipherChoice::Aes256Cbc => "-aes256",
            CipherChoice::Aes128Cbc => "-aes128",
            CipherChoice::TripleDesCbc => "-des3",
        }
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, CipherChoice::TripleDesCbc)
    }
}

impl FromStr for CipherChoice {
    type Err = SmimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-256-cbc" | "aes256" => Ok(CipherChoice::Aes256Cbc),
            "aes-128-cbc" | "aes128" => Ok(CipherChoice::Aes128Cbc),
            "des-ede3-cbc" | "des3" | "3des" => Ok(CipherChoice::TripleDesCbc),
            other => Err(SmimeError::InvalidInput(format!(
                "Unsupported cipher: {other}"
            ))),
        }
    }
}

impl fmt::Display for CipherChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_names_round_trip() {
        for choice in [
            CipherChoice::Aes256Cbc,
            CipherChoice::Aes128Cbc,
            CipherChoice::TripleDesCbc,
        ] {
            assert_eq!(choice.as_str().parse::<CipherChoice>().unwrap(), choice);
        }
        assert_eq!("3DES".parse::<CipherChoice>().unwrap(), CipherChoice::TripleDesCbc);
    }

    #[test]
    fn test_weak_ciphers_rejected() {
        assert!("rc2-40-cbc".parse::<CipherChoice>().is_err());
        assert!("des-cbc".parse::<CipherChoice>().is_err());
    }

    #[test]
    fn test_aes_256_available() {
        assert!(CipherChoice::Aes256Cbc.resolve().is_some());
        assert!(!CipherChoice::Aes256Cbc.is_legacy());
        assert!(CipherChoice::TripleDesCbc.is_legacy());
    }
}
