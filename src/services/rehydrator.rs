//! Restores PKCS#7 media-type parameters on the outgoing `Content-Type`.
//!
//! Mail layers commonly keep only the base media type of a `Content-Type`
//! header. The rehydrator carries the parameters captured from one
//! encryption result and appends them exactly once.

use crate::domain::envelope::{EncryptedEnvelope, MediaTypeParameters};
use crate::services::mail::ContentTypeFilter;

/// Single-use carrier of captured media-type parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeRehydrator {
    parameters: Option<MediaTypeParameters>,
}

impl ContentTypeRehydrator {
    #[must_use]
    pub fn unarmed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn armed(parameters: MediaTypeParameters) -> Self {
        Self {
            parameters: Some(parameters),
        }
    }

    /// Arm from an encryption result, taking its captured parameters.
    pub fn from_envelope(envelope: &mut EncryptedEnvelope) -> Self {
        Self {
            parameters: envelope.take_media_type_parameters(),
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.parameters.is_some()
    }

    /// Append the captured parameters to `base_content_type` and disarm.
    /// Unarmed, the input is returned unchanged.
    pub fn rehydrate(&mut self, base_content_type: &str) -> String {
        match self.parameters.take() {
            Some(parameters) => {
                log::debug!("Restoring PKCS#7 media-type parameters on {base_content_type}");
                format!("{base_content_type}{parameters}")
            }
            None => base_content_type.to_string(),
        }
    }
}

impl ContentTypeFilter for ContentTypeRehydrator {
    fn apply(&mut self, content_type: &str) -> String {
        self.rehydrate(content_type)
    }

    fn is_spent(&self) -> bool {
        !self.is_armed()
    }
}
