//! Fixtures shared by unit tests.

use crate::domain::cert::Certificate;
use crate::services::codec::get_certificate;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};
use std::process::{Command, Stdio};

/// Create a self-signed RSA certificate and its private key.
pub(crate) fn self_signed(common_name: &str) -> (Certificate, PKey<Private>) {
    let rsa = Rsa::generate(2048).expect("Should generate RSA key");
    let pkey = PKey::from_rsa(rsa).expect("Should create PKey");

    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("CN", common_name)
        .expect("Should add CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_u32(1)
        .expect("Should create serial")
        .to_asn1_integer()
        .expect("Should convert serial");
    builder
        .set_serial_number(&serial)
        .expect("Should set serial");
    builder.set_subject_name(&name).expect("Should set subject");
    builder.set_issuer_name(&name).expect("Should set issuer");
    let not_before = Asn1Time::days_from_now(0).expect("Should create not_before");
    let not_after = Asn1Time::days_from_now(1).expect("Should create not_after");
    builder
        .set_not_before(&not_before)
        .expect("Should set not_before");
    builder
        .set_not_after(&not_after)
        .expect("Should set not_after");
    builder.set_pubkey(&pkey).expect("Should set pubkey");
    builder
        .sign(&pkey, MessageDigest::sha256())
        .expect("Should sign");

    let der = builder.build().to_der().expect("Should convert to DER");
    let cert = get_certificate(der.into()).expect("Should acquire certificate");
    (cert, pkey)
}

/// Whether an `openssl` executable is on `PATH`.
pub(crate) fn openssl_cli_available() -> bool {
    Command::new("openssl")
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
