//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - PKCS#7 enveloped-data encryption engines (OpenSSL library, `openssl` CLI)

pub mod engine;
