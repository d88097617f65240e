//! Fixtures shared by integration tests.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use smime_envelope::{get_certificate, Certificate};

pub struct TestRecipient {
    pub certificate: Certificate,
    pub key: PKey<Private>,
}

/// Self-signed RSA recipient with the given common name.
pub fn recipient(common_name: &str) -> TestRecipient {
    let rsa = Rsa::generate(2048).expect("Should generate RSA key");
    let key = PKey::from_rsa(rsa).expect("Should create PKey");

    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("CN", common_name)
        .expect("Should add CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_u32(7)
        .expect("Should create serial")
        .to_asn1_integer()
        .expect("Should convert serial");
    builder
        .set_serial_number(&serial)
        .expect("Should set serial");
    builder.set_subject_name(&name).expect("Should set subject");
    builder.set_issuer_name(&name).expect("Should set issuer");
    builder
        .set_not_before(&Asn1Time::days_from_now(0).expect("Should create not_before"))
        .expect("Should set not_before");
    builder
        .set_not_after(&Asn1Time::days_from_now(30).expect("Should create not_after"))
        .expect("Should set not_after");
    builder.set_pubkey(&key).expect("Should set pubkey");
    builder
        .sign(&key, MessageDigest::sha256())
        .expect("Should sign");
    let x509: X509 = builder.build();

    let pem = String::from_utf8(x509.to_pem().expect("Should export PEM")).expect("PEM is UTF-8");
    let certificate = get_certificate(pem).expect("Should acquire certificate");
    TestRecipient { certificate, key }
}

/// Decrypt a rendered S/MIME entity for `recipient`.
pub fn decrypt(headers: &str, body: &str, recipient: &TestRecipient) -> String {
    use openssl::pkcs7::{Pkcs7, Pkcs7Flags};

    let smime = format!("{headers}\n\n{body}");
    let (pkcs7, _) = Pkcs7::from_smime(smime.as_bytes()).expect("Should parse S/MIME");
    let plain = pkcs7
        .decrypt(
            &recipient.key,
            recipient.certificate.as_x509(),
            Pkcs7Flags::empty(),
        )
        .expect("Should decrypt");
    String::from_utf8(plain).expect("Plaintext is UTF-8")
}

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}
