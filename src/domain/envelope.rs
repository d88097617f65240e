//! Encrypted envelope produced from the PKCS#7 engine's raw MIME output.

use crate::domain::constants::{BLANK_LINE_CRLF, BLANK_LINE_LF, PKCS7_CONTENT_TYPE_PATTERN};
use crate::infra::error::{SmimeError, SmimeResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Parameter tail of a PKCS#7 `Content-Type` header, e.g.
/// `; smime-type=enveloped-data; name="smime.p7m"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeParameters(String);

impl MediaTypeParameters {
    /// Extract the tail following `application/(x-)pkcs7-mime` from a header
    /// block. `None` when there is no such header or it carries no parameters.
    #[must_use]
    pub fn capture(headers: &str) -> Option<Self> {
        let pattern = pkcs7_content_type()?;
        let tail = pattern.captures(headers)?.get(1)?.as_str().trim_end();
        if tail.is_empty() {
            None
        } else {
            Some(MediaTypeParameters(tail.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaTypeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn pkcs7_content_type() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(PKCS7_CONTENT_TYPE_PATTERN).ok())
        .as_ref()
}

/// Split raw MIME text on its first blank line into `(headers, body)`.
///
/// Both `\n\n` and `\r\n\r\n` are accepted; whichever occurs first wins.
/// Output without a boundary, with an empty header section or with an empty
/// body is rejected as [`SmimeError::MalformedEnvelope`].
pub fn split_envelope(raw: &str) -> SmimeResult<(String, String)> {
    let boundary = [BLANK_LINE_LF, BLANK_LINE_CRLF]
        .iter()
        .filter_map(|sep| raw.find(sep).map(|pos| (pos, sep.len())))
        .min_by_key(|(pos, _)| *pos);

    let Some((pos, sep_len)) = boundary else {
        return Err(SmimeError::MalformedEnvelope(
            "engine output has no header/body boundary".to_string(),
        ));
    };

    let headers = &raw[..pos];
    let body = &raw[pos + sep_len..];

    if headers.trim().is_empty() {
        return Err(SmimeError::MalformedEnvelope(
            "engine output has an empty header section".to_string(),
        ));
    }
    if body.trim().is_empty() {
        return Err(SmimeError::MalformedEnvelope(
            "engine output has an empty body".to_string(),
        ));
    }

    Ok((headers.to_string(), body.to_string()))
}

/// Encrypted MIME message split into header block and body.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Header block, no trailing blank line
    pub headers: String,
    /// Base64 PKCS#7 body
    pub message: String,
    parameters: Option<MediaTypeParameters>,
}

impl EncryptedEnvelope {
    /// Parse raw engine output.
    pub fn from_engine_output(raw: &str) -> SmimeResult<Self> {
        let (headers, message) = split_envelope(raw)?;
        let parameters = MediaTypeParameters::capture(&headers);
        Ok(Self {
            headers,
            message,
            parameters,
        })
    }

    /// Captured PKCS#7 media-type parameters, if still present.
    #[must_use]
    pub fn media_type_parameters(&self) -> Option<&MediaTypeParameters> {
        self.parameters.as_ref()
    }

    /// Move the captured parameters out; later calls return `None`.
    pub fn take_media_type_parameters(&mut self) -> Option<MediaTypeParameters> {
        self.parameters.take()
    }
}

impl fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("headers_len", &self.headers.len())
            .field("message_len", &self.message.len())
            .field("parameters", &self.parameters)
            .finish()
    }
}
