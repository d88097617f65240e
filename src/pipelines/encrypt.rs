//! `EncryptWorkflow`: file-oriented facade over [`EnvelopeEncryptor`].
//!
//! Loads recipient certificates from disk, builds the engine selected by
//! configuration and renders the result as a complete mail entity.

use crate::{
    adapters::engine::{create_engine, EnvelopeEngine},
    domain::{
        cert::{CertificateInput, RecipientSet},
        envelope::EncryptedEnvelope,
        headers::HeaderInput,
    },
    infra::{config::EnvelopeConfiguration, diagnostics::DiagnosticSink},
    services::{codec::get_certificate, encryptor::EnvelopeEncryptor},
    SmimeError, SmimeResult,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for one encryption run.
#[derive(Debug, Clone, Default)]
pub struct EncryptJob {
    pub recipients: Vec<PathBuf>,
    pub message: String,
    pub headers: String,
}

pub struct EncryptWorkflow {
    encryptor: EnvelopeEncryptor<Box<dyn EnvelopeEngine>>,
}

impl EncryptWorkflow {
    #[must_use]
    pub fn new(config: EnvelopeConfiguration) -> Self {
        let engine = create_engine(&config);
        Self {
            encryptor: EnvelopeEncryptor::new(engine, config),
        }
    }

    #[must_use]
    pub fn with_diagnostics(self, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            encryptor: self.encryptor.with_diagnostics(sink),
        }
    }

    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        self.encryptor.engine().name()
    }

    /// Load every recipient certificate; one bad file fails the whole set.
    pub fn load_recipients<P: AsRef<Path>>(paths: &[P]) -> SmimeResult<RecipientSet> {
        if paths.is_empty() {
            return Err(SmimeError::InvalidInput(
                "at least one recipient certificate is required".to_string(),
            ));
        }
        let certificates = paths
            .iter()
            .map(|path| get_certificate(CertificateInput::Path(path.as_ref().to_path_buf())))
            .collect::<SmimeResult<Vec<_>>>()?;
        Ok(RecipientSet::from(certificates))
    }

    /// Encrypt one job.
    pub fn run(&self, job: &EncryptJob) -> SmimeResult<EncryptedEnvelope> {
        let recipients = Self::load_recipients(&job.recipients)?;
        for certificate in recipients.certificates() {
            log::info!(
                "Recipient {} ({})",
                certificate.subject(),
                certificate.fingerprint()
            );
        }
        self.encryptor.encrypt(
            &job.message,
            HeaderInput::Joined(job.headers.clone()),
            &recipients,
        )
    }

    /// Encrypt one job and write the rendered mail entity to `output`.
    pub fn run_to_file(&self, job: &EncryptJob, output: &Path) -> SmimeResult<()> {
        let envelope = self.run(job)?;
        std::fs::write(output, render(&envelope)).map_err(|e| {
            SmimeError::IoError(format!("Failed to write {}: {e}", output.display()))
        })?;
        log::info!("Wrote S/MIME message to {}", output.display());
        Ok(())
    }
}

/// Join envelope headers and body with a blank line.
#[must_use]
pub fn render(envelope: &EncryptedEnvelope) -> String {
    format!("{}\n\n{}", envelope.headers, envelope.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::codec::pem_encode;
    use crate::test_support::self_signed;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> EnvelopeConfiguration {
        EnvelopeConfiguration {
            scratch_dir: Some(dir.to_path_buf()),
            ..EnvelopeConfiguration::default()
        }
    }

    #[test]
    fn test_load_recipients_requires_one() {
        let none: &[PathBuf] = &[];
        assert!(matches!(
            EncryptWorkflow::load_recipients(none),
            Err(SmimeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_run_to_file() {
        let scratch = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let (cert, _) = self_signed("Workflow Test");
        let cert_path = work.path().join("recipient.pem");
        std::fs::write(&cert_path, pem_encode(&cert).unwrap()).unwrap();

        let workflow = EncryptWorkflow::new(config_in(scratch.path()));
        assert_eq!(workflow.engine_name(), "openssl-library");

        let job = EncryptJob {
            recipients: vec![cert_path],
            message: "hello".to_string(),
            headers: "Subject: hi\nContent-Type: text/plain".to_string(),
        };
        let output = work.path().join("out.eml");
        workflow.run_to_file(&job, &output).unwrap();

        let rendered = std::fs::read_to_string(&output).unwrap();
        assert!(rendered.starts_with("Subject: hi\n"));
        assert!(rendered.contains("pkcs7-mime"));
        assert!(rendered.contains("\n\n"));
        assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_bad_recipient_file_fails() {
        let work = TempDir::new().unwrap();
        let bogus = work.path().join("bogus.pem");
        std::fs::write(&bogus, "not a certificate").unwrap();

        let workflow = EncryptWorkflow::new(config_in(work.path()));
        let job = EncryptJob {
            recipients: vec![bogus],
            message: "hello".to_string(),
            headers: String::new(),
        };
        assert!(matches!(
            workflow.run(&job),
            Err(SmimeError::NotACertificate(_))
        ));
    }
}
