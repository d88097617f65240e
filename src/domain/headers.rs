//! MIME header normalization ahead of envelope construction.
//!
//! Caller-supplied `Content-Type` declarations are removed so the header
//! generated by the PKCS#7 engine is the only one in the final message.

use crate::domain::constants::CONTENT_TYPE_HEADER;

/// Headers as handed in by a caller: one newline-joined block or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderInput {
    Joined(String),
    Lines(Vec<String>),
}

impl Default for HeaderInput {
    fn default() -> Self {
        HeaderInput::Lines(Vec::new())
    }
}

impl From<&str> for HeaderInput {
    fn from(value: &str) -> Self {
        HeaderInput::Joined(value.to_string())
    }
}

impl From<String> for HeaderInput {
    fn from(value: String) -> Self {
        HeaderInput::Joined(value)
    }
}

impl From<Vec<String>> for HeaderInput {
    fn from(value: Vec<String>) -> Self {
        HeaderInput::Lines(value)
    }
}

impl From<Vec<&str>> for HeaderInput {
    fn from(value: Vec<&str>) -> Self {
        HeaderInput::Lines(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HeaderInput {
    fn from(value: &[&str]) -> Self {
        HeaderInput::Lines(value.iter().map(|s| (*s).to_string()).collect())
    }
}

impl From<&HeaderSet> for HeaderInput {
    fn from(value: &HeaderSet) -> Self {
        HeaderInput::Lines(value.lines().to_vec())
    }
}

/// Split header input into single lines.
///
/// A joined block is split on newlines. List elements are split the same
/// way, so an element such as `"Subject: hi\n"` cannot smuggle a blank line
/// into the header block. A trailing `\r` is dropped from each line so CRLF
/// input behaves like LF input.
#[must_use]
pub fn split_headers(input: HeaderInput) -> Vec<String> {
    match input {
        HeaderInput::Joined(block) => split_lines(&block).collect(),
        HeaderInput::Lines(lines) => lines.iter().flat_map(|l| split_lines(l)).collect(),
    }
}

fn split_lines(block: &str) -> impl Iterator<Item = String> + '_ {
    block
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !line.trim().is_empty()
}

/// Keep a header line only if it is non-blank and does not contain
/// `Content-Type:` in any letter case.
#[must_use]
pub fn filter_header(line: &str) -> bool {
    !line.trim().is_empty() && !line.to_ascii_lowercase().contains(CONTENT_TYPE_HEADER)
}

/// Normalized header lines: no blank lines, no `Content-Type` lines,
/// original order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    /// Split `input` into lines and keep those accepted by [`filter_header`].
    ///
    /// Folded continuation lines of a removed `Content-Type` header are
    /// removed with it.
    #[must_use]
    pub fn normalize(input: impl Into<HeaderInput>) -> Self {
        let mut in_content_type = false;
        let lines = split_headers(input.into())
            .into_iter()
            .filter(|line| {
                if is_continuation(line) {
                    return !in_content_type;
                }
                if line.trim().is_empty() {
                    return false;
                }
                let keep = filter_header(line);
                in_content_type = !keep;
                keep
            })
            .collect();
        HeaderSet(lines)
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Header block as written ahead of a MIME body: every line followed by `\n`.
    #[must_use]
    pub fn to_block(&self) -> String {
        self.0.iter().fold(String::new(), |mut block, line| {
            block.push_str(line);
            block.push('\n');
            block
        })
    }

    /// Plaintext MIME entity: the header block, a blank line, then `body`.
    #[must_use]
    pub fn frame(&self, body: &str) -> String {
        let mut entity = self.to_block();
        entity.push('\n');
        entity.push_str(body);
        entity
    }
}
