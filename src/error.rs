//! Structured error types for the harness.
//!
//! The taxonomy mirrors how failures are treated at run time: everything in
//! this enum aborts the run. Content mismatches and count drift are not
//! errors; they are accumulated in the [`crate::report`] types and checking
//! continues.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A broken annotation in a fixture: wrong arity, unquoted argument,
    /// unknown completion kind, duplicate alias, unresolvable alias
    /// reference, or a standalone marker with nothing to anchor to.
    #[error("malformed fixture {}:{line}: {reason}", file.display())]
    Fixture {
        file: PathBuf,
        line: u32,
        reason: String,
    },

    /// The fixture template tree could not be materialized.
    #[error("fixture export failed for {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `conformance.toml` was present but unreadable or invalid.
    #[error("invalid harness config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A capability request itself failed, which indicates a wiring problem
    /// rather than a content mismatch.
    #[error("{capability} request failed: {source:#}")]
    Server {
        capability: &'static str,
        source: anyhow::Error,
    },
}

impl HarnessError {
    pub fn fixture(file: impl Into<PathBuf>, line: u32, reason: impl Into<String>) -> Self {
        Self::Fixture {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn server(capability: &'static str, source: anyhow::Error) -> Self {
        Self::Server { capability, source }
    }

    /// Log the error at warn level.
    pub fn log_warn(&self) {
        tracing::warn!("harness error: {}", self);
    }
}
