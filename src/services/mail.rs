//! Outgoing-mail header construction and dispatch.
//!
//! [`MailHeaderPipeline`] runs registered [`ContentTypeFilter`]s over the
//! base content type of each message and drops filters once they report
//! themselves spent. [`Mailer`] turns an [`EncryptedEnvelope`] into a
//! dispatchable header/body pair, arming a [`ContentTypeRehydrator`] for
//! that one message.

use crate::domain::envelope::EncryptedEnvelope;
use crate::infra::error::SmimeResult;
use crate::services::rehydrator::ContentTypeRehydrator;
use std::fmt;

const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Rewrites the outgoing `Content-Type` value.
pub trait ContentTypeFilter: Send {
    fn apply(&mut self, content_type: &str) -> String;

    /// Spent filters are removed from the pipeline after the current message.
    fn is_spent(&self) -> bool {
        false
    }
}

/// Ordered content-type filters applied once per outgoing message.
#[derive(Default)]
pub struct MailHeaderPipeline {
    filters: Vec<Box<dyn ContentTypeFilter>>,
}

impl MailHeaderPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filter: impl ContentTypeFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Final content type for one message.
    pub fn content_type(&mut self, base: &str) -> String {
        let content_type = self
            .filters
            .iter_mut()
            .fold(base.to_string(), |current, filter| filter.apply(&current));
        self.filters.retain(|filter| !filter.is_spent());
        content_type
    }
}

impl fmt::Debug for MailHeaderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MailHeaderPipeline(filters={})", self.filters.len())
    }
}

/// A message ready for header construction: headers without
/// `Content-Type`, the base content type, and the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub headers: Vec<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl OutgoingMail {
    /// Split an envelope's header block, keeping only the base media type of
    /// its `Content-Type` the way a mail layer would.
    #[must_use]
    pub fn from_envelope(envelope: &EncryptedEnvelope) -> Self {
        let mut headers: Vec<String> = Vec::new();
        let mut content_type = None;
        let mut in_content_type = false;

        for line in envelope.headers.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with([' ', '\t']) {
                // Folded continuation of the previous header.
                if !in_content_type {
                    if let Some(last) = headers.last_mut() {
                        last.push('\n');
                        last.push_str(line);
                    }
                }
                continue;
            }
            in_content_type = false;

            match line.split_once(':') {
                Some((name, value)) if name.trim().eq_ignore_ascii_case("content-type") => {
                    let base = value.split(';').next().unwrap_or_default().trim();
                    content_type = Some(base.to_string());
                    in_content_type = true;
                }
                _ if line.is_empty() => {}
                _ => headers.push(line.to_string()),
            }
        }

        Self {
            headers,
            content_type,
            body: envelope.message.clone(),
        }
    }
}

/// Hands a finished header/body pair to the transport.
pub trait MailDispatcher {
    fn dispatch(&mut self, headers: &[String], body: &str) -> SmimeResult<()>;
}

/// Sends messages through a [`MailHeaderPipeline`] and a [`MailDispatcher`].
pub struct Mailer<D> {
    pipeline: MailHeaderPipeline,
    dispatcher: D,
}

impl<D: MailDispatcher> Mailer<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            pipeline: MailHeaderPipeline::new(),
            dispatcher,
        }
    }

    pub fn pipeline_mut(&mut self) -> &mut MailHeaderPipeline {
        &mut self.pipeline
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Send an encryption result, restoring its PKCS#7 media-type parameters.
    pub fn send_envelope(&mut self, mut envelope: EncryptedEnvelope) -> SmimeResult<()> {
        let rehydrator = ContentTypeRehydrator::from_envelope(&mut envelope);
        if rehydrator.is_armed() {
            self.pipeline.register(rehydrator);
        }
        self.send(OutgoingMail::from_envelope(&envelope))
    }

    pub fn send(&mut self, mail: OutgoingMail) -> SmimeResult<()> {
        let base = mail
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let content_type = self.pipeline.content_type(base);

        let mut headers = mail.headers;
        headers.push(format!("Content-Type: {content_type}"));
        log::debug!("Dispatching mail with {} header line(s)", headers.len());
        self.dispatcher.dispatch(&headers, &mail.body)
    }
}
