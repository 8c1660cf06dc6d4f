//! Error types for the responder pipeline.
//!
//! Every stage returns one of these instead of exiting the process; `main`
//! logs the error once and turns it into the exit status.

use thiserror::Error;

use crate::protocol::AddressFamily;

/// Failures of the line transport. Always fatal, always before parsing.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to read input from stdin")]
    Closed,

    #[error("Input exceeds maximum buffer size")]
    LineTooLong { limit: usize },

    #[error("Input is not valid UTF-8")]
    InvalidUtf8,

    #[error("I/O error on {stream}: {source}")]
    Io {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ResponderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to parse JSON input")]
    MalformedRequest(#[source] crate::protocol::SchemaError),

    #[error("Missing srcip in input JSON")]
    MissingSourceAddress,

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Missing list name for {0}")]
    MissingListName(AddressFamily),

    #[error("Malformed JSON input")]
    MissingCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown confirmation command: {0}")]
    UnknownConfirmation(String),

    #[error("Failed to build control message: {0}")]
    ControlMessage(#[source] serde_json::Error),

    #[error("Failed to {op} {address} (set {set_name})")]
    Mutation {
        op: &'static str,
        set_name: String,
        address: String,
    },

    #[error("Failed to initialize ipset: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResponderError {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        assert_eq!(
            ResponderError::InvalidAddress("not-an-ip".to_string()).to_string(),
            "Invalid IP address: not-an-ip"
        );
        assert_eq!(
            ResponderError::UnknownCommand("flush".to_string()).to_string(),
            "Unknown command: flush"
        );
        assert_eq!(
            ResponderError::MissingListName(AddressFamily::V6).to_string(),
            "Missing list name for IPv6"
        );
    }

    #[test]
    fn test_transport_errors_are_transparent() {
        let err = ResponderError::from(TransportError::LineTooLong { limit: 16 });
        assert_eq!(err.to_string(), "Input exceeds maximum buffer size");
    }

    #[test]
    fn test_every_error_is_nonzero() {
        assert_ne!(ResponderError::MissingSourceAddress.exit_code(), 0);
        assert_ne!(TransportError::Closed.to_string(), "");
        assert_ne!(
            ResponderError::from(TransportError::Closed).exit_code(),
            0
        );
    }
}
