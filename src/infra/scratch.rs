//! Scratch files for handing plaintext and ciphertext to an external engine.
//!
//! Each [`ScratchFile`] is created with a unique random name (`tempfile`),
//! owner-only permissions, and is owned by exactly one encryption call.
//! Destruction overwrites the file with `n + rand(0..=2n)` random bytes,
//! where `n` is its current size, then unlinks it.
//!
//! The overwrite is a best-effort obfuscation pass. On copy-on-write or
//! journaling filesystems and on wear-levelled flash the original blocks
//! may survive; this is not a guaranteed secure erase.

use crate::domain::constants::{OVERWRITE_CHUNK_SIZE, SCRATCH_FILE_PREFIX};
use crate::infra::error::{SmimeError, SmimeResult};
use rand::{Rng, RngCore};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A uniquely named temporary file, destroyed before its owner returns.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    destroyed: bool,
}

impl ScratchFile {
    /// Create a scratch file in `dir` holding `content`.
    pub fn provision(dir: &Path, content: &[u8]) -> SmimeResult<Self> {
        let (mut file, scratch) = Self::create(dir)?;
        // From here on `scratch` shreds the file if writing fails.
        file.write_all(content)?;
        file.sync_all()?;
        log::debug!(
            "Provisioned scratch file {} ({} bytes)",
            scratch.path.display(),
            content.len()
        );
        Ok(scratch)
    }

    /// Create an empty scratch file in `dir` for an engine to write into.
    pub fn reserve(dir: &Path) -> SmimeResult<Self> {
        let (_, scratch) = Self::create(dir)?;
        log::debug!("Reserved scratch file {}", scratch.path.display());
        Ok(scratch)
    }

    fn create(dir: &Path) -> SmimeResult<(fs::File, Self)> {
        let named = tempfile::Builder::new()
            .prefix(SCRATCH_FILE_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| {
                SmimeError::IoError(format!(
                    "Failed to create scratch file in {}: {e}",
                    dir.display()
                ))
            })?;
        let (file, path) = named
            .keep()
            .map_err(|e| SmimeError::IoError(format!("Failed to keep scratch file: {e}")))?;
        Ok((
            file,
            Self {
                path,
                destroyed: false,
            },
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file.
    pub fn read(&self) -> SmimeResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            SmimeError::IoError(format!(
                "Failed to read scratch file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Overwrite with random bytes and delete.
    pub fn destroy(mut self) -> SmimeResult<()> {
        self.destroyed = true;
        shred(&self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = shred(&self.path) {
            log::error!("Sensitive residue may remain on disk: {e}");
        }
    }
}

/// Number of bytes written over a file of `len` bytes: `len + rand(0..=2*len)`.
pub fn overwrite_length<R: Rng>(len: u64, rng: &mut R) -> u64 {
    let extra = rng.gen_range(0..=len.saturating_mul(2));
    len.saturating_add(extra)
}

/// Overwrite `path` with random data of randomized length, then remove it.
///
/// Removal is attempted even when the overwrite fails; the first failure is
/// returned as [`SmimeError::CleanupFailed`].
pub fn shred(path: &Path) -> SmimeResult<()> {
    let overwritten = overwrite(path);
    let removed = fs::remove_file(path).map_err(|e| SmimeError::cleanup(path, e));

    match (overwritten, removed) {
        (Ok(written), Ok(())) => {
            log::debug!(
                "Shredded scratch file {} ({written} random bytes)",
                path.display()
            );
            Ok(())
        }
        (Err(e), Ok(())) => {
            log::warn!("Removed {} without a complete overwrite", path.display());
            Err(e)
        }
        (_, Err(e)) => Err(e),
    }
}

fn overwrite(path: &Path) -> SmimeResult<u64> {
    let len = fs::metadata(path)
        .map_err(|e| SmimeError::cleanup(path, e))?
        .len();

    let mut rng = rand::thread_rng();
    let total = overwrite_length(len, &mut rng);

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| SmimeError::cleanup(path, e))?;

    let mut chunk = vec![0u8; OVERWRITE_CHUNK_SIZE];
    let mut remaining = total;
    while remaining > 0 {
        let take = usize::try_from(remaining)
            .unwrap_or(OVERWRITE_CHUNK_SIZE)
            .min(OVERWRITE_CHUNK_SIZE);
        rng.fill_bytes(&mut chunk[..take]);
        file.write_all(&chunk[..take])
            .map_err(|e| SmimeError::cleanup(path, e))?;
        remaining -= take as u64;
    }
    file.sync_all().map_err(|e| SmimeError::cleanup(path, e))?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_overwrite_length_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [0u64, 1, 17, 4096] {
            for _ in 0..64 {
                let n = overwrite_length(len, &mut rng);
                assert!(n >= len, "{n} < {len}");
                assert!(n <= len * 3, "{n} > 3 * {len}");
            }
        }
        assert_eq!(overwrite_length(0, &mut rng), 0);
    }

    #[test]
    fn test_provision_writes_content_with_unique_names() {
        let dir = TempDir::new().unwrap();
        let a = ScratchFile::provision(dir.path(), b"secret plaintext").unwrap();
        let b = ScratchFile::provision(dir.path(), b"secret plaintext").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_FILE_PREFIX));
        assert_eq!(a.read().unwrap(), b"secret plaintext");

        a.destroy().unwrap();
        b.destroy().unwrap();
    }

    #[test]
    fn test_destroy_removes_file() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFile::provision(dir.path(), &[0x41; 1000]).unwrap();
        let path = scratch.path().to_path_buf();

        scratch.destroy().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_reserved_file_is_empty_and_destroyable() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFile::reserve(dir.path()).unwrap();
        let path = scratch.path().to_path_buf();
        assert!(scratch.read().unwrap().is_empty());

        scratch.destroy().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_shreds_undestroyed_file() {
        let dir = TempDir::new().unwrap();
        let path = {
            let scratch = ScratchFile::provision(dir.path(), b"left behind").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_destroy_missing_file_reports_cleanup_failure() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFile::reserve(dir.path()).unwrap();
        fs::remove_file(scratch.path()).unwrap();

        match scratch.destroy() {
            Err(SmimeError::CleanupFailed { .. }) => {}
            other => panic!("Expected CleanupFailed, got: {other:?}"),
        }
    }
}
