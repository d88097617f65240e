//! Centralized constants for PEM armour, MIME framing and scratch files.
//! Keep this intentionally small; only broadly reused literals should live here.

// === PEM (RFC 7468) ===

/// Every PEM encapsulation boundary starts with five dashes
pub const PEM_BOUNDARY_MARKER: &str = "-----";

/// Prefix that marks a certificate reference as a file path
pub const FILE_URI_PREFIX: &str = "file://";

// === MIME framing ===

/// Header/body separator as written by OpenSSL's S/MIME writer
pub const BLANK_LINE_LF: &str = "\n\n";

/// Header/body separator in canonical CRLF form
pub const BLANK_LINE_CRLF: &str = "\r\n\r\n";

/// Header name stripped from caller-supplied headers (matched case-insensitively)
pub const CONTENT_TYPE_HEADER: &str = "content-type:";

/// Matches the engine's PKCS#7 `Content-Type` line; group 1 is the parameter tail
pub const PKCS7_CONTENT_TYPE_PATTERN: &str =
    r"(?im)^Content-Type:[ \t]*application/(?:x-)?pkcs7-mime([^\r\n]*)";

// === Scratch files ===

/// File-name prefix of every scratch file
pub const SCRATCH_FILE_PREFIX: &str = "smime-";

/// Random data is generated and written in chunks of this size
pub const OVERWRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Poll interval while waiting for the command engine
pub const ENGINE_POLL_INTERVAL_MS: u64 = 20;
