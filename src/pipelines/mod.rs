//! Workflow pipelines orchestrating stateless services.

pub mod encrypt;
