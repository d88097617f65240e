//! Infrastructure layer for cross-cutting concerns.
//!
//! Provides foundational infrastructure including:
//! - Configuration management and validation
//! - Error handling and result types
//! - Diagnostic reporting for non-fatal security events
//! - Secure scratch-file handling

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod scratch;
