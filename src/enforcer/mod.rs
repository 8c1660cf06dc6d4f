//! Set mutation backend.
//!
//! The responder changes exactly one entry of one named set per invocation.
//! Backends report the outcome synchronously as a [`MutationResult`]: the
//! success flag plus whatever the backend had to say about it.

mod ipset;

use std::fmt;

pub use ipset::IpsetBackend;

#[cfg(test)]
use mockall::automock;

use crate::cmd_abstraction::RealCommandExecutor;
use crate::config::Config;
use crate::error::ResponderError;

/// Mutation applied to a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add,
    Delete,
}

impl SetOp {
    /// ipset subcommand
    pub fn as_arg(self) -> &'static str {
        match self {
            SetOp::Add => "add",
            SetOp::Delete => "del",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            SetOp::Add => "add",
            SetOp::Delete => "delete",
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Severity of a backend report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Notice,
    Error,
}

impl Severity {
    /// Log prefix and placeholder used when the backend gave no text.
    fn labels(self) -> (&'static str, &'static str) {
        match self {
            Severity::Warning => ("Warning", "Unknown warning"),
            Severity::Notice => ("Notice", "Unknown notice"),
            Severity::Error => ("Error", "Unknown error"),
        }
    }
}

/// Diagnostic attached to a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReport {
    pub severity: Severity,
    pub message: String,
}

impl BackendReport {
    /// Trailing newlines are dropped from `message`.
    pub fn new(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.trim_end_matches(['\n', '\r']).to_string(),
        }
    }
}

impl fmt::Display for BackendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, placeholder) = self.severity.labels();
        let text = if self.message.is_empty() {
            placeholder
        } else {
            &self.message
        };
        write!(f, "{}: {}", prefix, text)
    }
}

/// Outcome of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub success: bool,
    pub report: Option<BackendReport>,
}

impl MutationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            report: None,
        }
    }

    pub fn ok_with(severity: Severity, message: &str) -> Self {
        Self {
            success: true,
            report: Some(BackendReport::new(severity, message)),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            report: Some(BackendReport::new(Severity::Error, message)),
        }
    }
}

/// Something that can add an address to, or remove it from, a named set.
///
/// Implementations must be idempotent: adding a present address or deleting
/// an absent one succeeds.
#[cfg_attr(test, automock)]
pub trait SetBackend {
    fn mutate(&self, op: SetOp, set_name: &str, address: &str) -> MutationResult;
}

/// Create the ipset backend described by `config` and check it can run.
pub fn create_backend(config: &Config) -> Result<IpsetBackend<RealCommandExecutor>, ResponderError> {
    let backend = IpsetBackend::new(RealCommandExecutor::new(), config.ipset_path.clone());
    backend.probe()?;
    Ok(backend)
}
