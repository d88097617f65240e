//! Engine that runs the `openssl smime -encrypt` command.
//!
//! Recipient certificates are handed over as short-lived PEM files. The
//! child process is killed once the configured timeout elapses.

use super::{require_recipients, write_output, EngineRequest, EnvelopeEngine};
use crate::domain::constants::{ENGINE_POLL_INTERVAL_MS, SCRATCH_FILE_PREFIX};
use crate::infra::error::{SmimeError, SmimeResult};
use openssl::pkcs7::Pkcs7Flags;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Runs an external `openssl` binary.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    binary: PathBuf,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl CommandEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration, scratch_dir: PathBuf) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            scratch_dir,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn write_certificates(&self, request: &EngineRequest<'_>) -> SmimeResult<Vec<NamedTempFile>> {
        request
            .recipients
            .certificates()
            .iter()
            .map(|cert| -> SmimeResult<NamedTempFile> {
                let mut file = tempfile::Builder::new()
                    .prefix(&format!("{SCRATCH_FILE_PREFIX}cert-"))
                    .suffix(".pem")
                    .tempfile_in(&self.scratch_dir)?;
                file.write_all(&cert.as_x509().to_pem()?)?;
                file.flush()?;
                Ok(file)
            })
            .collect()
    }

    fn wait(&self, mut child: Child) -> SmimeResult<(ExitStatus, String)> {
        // Drained while polling so a chatty child never blocks on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let _ = pipe.read_to_end(&mut buffer);
                String::from_utf8_lossy(&buffer).into_owned()
            })
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                // Kill may race with a natural exit; the wait below reaps either way.
                let _ = child.kill();
                let _ = child.wait();
                // The reader is detached: grandchildren may still hold the pipe.
                return Err(SmimeError::EncryptionFailed(format!(
                    "{} timed out after {:?}",
                    self.binary.display(),
                    self.timeout
                )));
            }
            thread::sleep(Duration::from_millis(ENGINE_POLL_INTERVAL_MS));
        };

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Ok((status, stderr))
    }
}

impl EnvelopeEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "openssl-command"
    }

    fn encrypt(&self, request: &EngineRequest<'_>) -> SmimeResult<()> {
        require_recipients(request.recipients)?;
        let cert_files = self.write_certificates(request)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("smime")
            .arg("-encrypt")
            .arg(request.cipher.command_flag())
            .arg("-in")
            .arg(request.input)
            .arg("-out")
            .arg(request.output);
        if request.flags.contains(Pkcs7Flags::TEXT) {
            command.arg("-text");
        }
        if request.flags.contains(Pkcs7Flags::BINARY) {
            command.arg("-binary");
        }
        command.args(cert_files.iter().map(NamedTempFile::path));

        log::debug!(
            "Running {} smime -encrypt for {} recipient(s)",
            self.binary.display(),
            cert_files.len()
        );
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SmimeError::EncryptionFailed(format!(
                    "cannot start {}: {e}",
                    self.binary.display()
                ))
            })?;

        let (status, stderr) = self.wait(child)?;
        if !status.success() {
            return Err(SmimeError::EncryptionFailed(format!(
                "{} exited with {status}: {}",
                self.binary.display(),
                stderr.trim()
            )));
        }

        let smime = read_output(request.output)?;
        write_output(request.output, request.headers, &smime)
    }
}

fn read_output(output: &Path) -> SmimeResult<Vec<u8>> {
    let smime = fs::read(output)?;
    if smime.is_empty() {
        return Err(SmimeError::EncryptionFailed(
            "openssl wrote no output".to_string(),
        ));
    }
    Ok(smime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cert::RecipientSet;
    use crate::domain::cipher::CipherChoice;
    use crate::domain::headers::HeaderSet;
    use crate::test_support::{openssl_cli_available, self_signed};
    use openssl::pkcs7::Pkcs7;
    use tempfile::TempDir;

    fn request_paths(dir: &TempDir) -> (PathBuf, PathBuf) {
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::write(&input, "X-Test: 1\n\nhello").unwrap();
        fs::write(&output, "").unwrap();
        (input, output)
    }

    #[test]
    fn test_missing_binary_fails() {
        let dir = TempDir::new().unwrap();
        let (input, output) = request_paths(&dir);
        let (cert, _) = self_signed("Command Recipient");
        let recipients = RecipientSet::from(cert);
        let headers = HeaderSet::default();

        let engine = CommandEngine::new(
            dir.path().join("no-such-openssl"),
            Duration::from_secs(5),
            dir.path().to_path_buf(),
        );
        let result = engine.encrypt(&EngineRequest {
            input: &input,
            output: &output,
            recipients: &recipients,
            headers: &headers,
            cipher: CipherChoice::Aes256Cbc,
            flags: Pkcs7Flags::empty(),
        });
        assert!(matches!(result, Err(SmimeError::EncryptionFailed(_))));
    }

    #[test]
    fn test_command_engine_round_trip() {
        if !openssl_cli_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let (input, output) = request_paths(&dir);
        let (cert, key) = self_signed("Command Recipient");
        let recipients = RecipientSet::from(cert.clone());
        let headers = HeaderSet::normalize("X-Test: 1");

        let engine = CommandEngine::new("openssl", Duration::from_secs(30), dir.path().to_path_buf());
        engine
            .encrypt(&EngineRequest {
                input: &input,
                output: &output,
                recipients: &recipients,
                headers: &headers,
                cipher: CipherChoice::Aes256Cbc,
                flags: Pkcs7Flags::empty(),
            })
            .unwrap();

        let raw = fs::read(&output).unwrap();
        assert!(raw.starts_with(b"X-Test: 1\n"));
        let (pkcs7, _) = Pkcs7::from_smime(&raw["X-Test: 1\n".len()..]).unwrap();
        let plain = pkcs7
            .decrypt(&key, cert.as_x509(), Pkcs7Flags::empty())
            .unwrap();
        assert!(String::from_utf8_lossy(&plain).contains("hello"));

        // Certificate hand-over files are gone once the call returns.
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".pem"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_is_not_a_timeout() {
        let dir = TempDir::new().unwrap();
        let (input, output) = request_paths(&dir);
        let script = dir.path().join("noisy.sh");
        fs::write(
            &script,
            "#!/bin/sh\nhead -c 262144 /dev/zero | tr '\\000' 'x' >&2\nexit 3\n",
        )
        .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&script, fs::Permissions::from_mode(0o700)).unwrap();
        }
        let (cert, _) = self_signed("Command Recipient");
        let recipients = RecipientSet::from(cert);
        let headers = HeaderSet::default();

        let engine = CommandEngine::new(&script, Duration::from_secs(20), dir.path().to_path_buf());
        let started = Instant::now();
        let result = engine.encrypt(&EngineRequest {
            input: &input,
            output: &output,
            recipients: &recipients,
            headers: &headers,
            cipher: CipherChoice::Aes256Cbc,
            flags: Pkcs7Flags::empty(),
        });

        assert!(started.elapsed() < Duration::from_secs(10));
        match result {
            Err(SmimeError::EncryptionFailed(msg)) => {
                assert!(!msg.contains("timed out"), "unexpected timeout");
                assert!(msg.contains("exited with"));
                assert!(msg.len() > 262_144);
            }
            other => panic!("Expected exit failure, got: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_engine() {
        let dir = TempDir::new().unwrap();
        let (input, output) = request_paths(&dir);
        let script = dir.path().join("hang.sh");
        fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&script, fs::Permissions::from_mode(0o700)).unwrap();
        }
        let (cert, _) = self_signed("Command Recipient");
        let recipients = RecipientSet::from(cert);
        let headers = HeaderSet::default();

        let engine = CommandEngine::new(&script, Duration::from_millis(200), dir.path().to_path_buf());
        let started = Instant::now();
        let result = engine.encrypt(&EngineRequest {
            input: &input,
            output: &output,
            recipients: &recipients,
            headers: &headers,
            cipher: CipherChoice::Aes256Cbc,
            flags: Pkcs7Flags::empty(),
        });

        assert!(started.elapsed() < Duration::from_secs(10));
        match result {
            Err(SmimeError::EncryptionFailed(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected timeout failure, got: {other:?}"),
        }
    }
}
