//! Domain types for S/MIME envelope construction.
//!
//! Pure data and parsing rules: certificates and recipient sets, MIME
//! header normalization, the encrypted envelope and its media-type
//! parameters, and the content-encryption cipher choices.

pub mod cert;
pub mod cipher;
pub mod constants;
pub mod envelope;
pub mod headers;
