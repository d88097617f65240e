//! Service layer module root.
//! Contains certificate conversions, cipher selection, envelope encryption
//! and the outgoing-mail header pipeline.

pub mod cipher;
pub mod codec;
pub mod encryptor;
pub mod mail;
pub mod rehydrator;

pub use cipher::select_cipher;
pub use codec::{get_certificate, pem_encode, pem_to_der};
pub use encryptor::EnvelopeEncryptor;
pub use mail::{ContentTypeFilter, MailDispatcher, MailHeaderPipeline, Mailer, OutgoingMail};
pub use rehydrator::ContentTypeRehydrator;
