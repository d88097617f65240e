//! Diagnostic channel for security-relevant events that must not fail the
//! surrounding operation (scratch-file cleanup failures).

use crate::infra::error::SmimeError;
use std::sync::Mutex;

/// Receiver of non-fatal diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    /// A scratch file could not be overwritten or removed.
    fn cleanup_failed(&self, error: &SmimeError);
}

/// Default sink: forwards events to the `log` facade at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn cleanup_failed(&self, error: &SmimeError) {
        log::error!("Sensitive residue may remain on disk: {error}");
    }
}

/// Sink that keeps every event in memory, then logs it like [`LogSink`].
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn cleanup_failed(&self, error: &SmimeError) {
        LogSink.cleanup_failed(error);
        match self.events.lock() {
            Ok(mut events) => events.push(error.to_string()),
            Err(poisoned) => poisoned.into_inner().push(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.cleanup_failed(&SmimeError::cleanup("/tmp/a", "first"));
        sink.cleanup_failed(&SmimeError::cleanup("/tmp/b", "second"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("/tmp/a"));
        assert!(events[1].ends_with("second"));
    }
}
