//! Active-response message types.
//!
//! Inbound messages share one envelope:
//!
//! ```text
//! { "version": 1, "origin": {...}, "command": "<string>", "parameters": {...} }
//! ```
//!
//! The primary request additionally carries `parameters.alert.data.srcip`
//! and `parameters.extra_args` (`[ipv4_set, ipv6_set]`). The only outbound
//! message is the [`ControlMessage`] sent before an `add` is committed.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Protocol version written into control messages.
pub const PROTOCOL_VERSION: u32 = 1;

/// Module tag written into `origin.module` of control messages.
pub const MODULE_NAME: &str = "active-response";

/// Command of the control message asking the orchestrator to confirm keys.
pub const CHECK_KEYS_COMMAND: &str = "check_keys";

/// Why a line was rejected by [`Request::parse`].
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("field '{field}' is missing or not {expected}")]
    Field {
        field: &'static str,
        expected: &'static str,
    },
}

/// A structurally validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    root: Map<String, Value>,
}

impl Request {
    /// Parse one line and check the envelope shape.
    ///
    /// Only shapes are checked: `version` must be a number, `origin` and
    /// `parameters` objects, `command` a string. The value of `version` is
    /// not interpreted.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let root = match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => return Err(SchemaError::NotAnObject),
        };

        require(&root, "version", "a number", Value::is_number)?;
        require(&root, "origin", "an object", Value::is_object)?;
        require(&root, "command", "a string", Value::is_string)?;
        require(&root, "parameters", "an object", Value::is_object)?;

        Ok(Self { root })
    }

    pub fn command(&self) -> Option<&str> {
        self.root.get("command").and_then(Value::as_str)
    }

    fn parameters(&self) -> Option<&Map<String, Value>> {
        self.root.get("parameters").and_then(Value::as_object)
    }

    /// `parameters.alert.data.srcip`, if every node on the way is an object
    /// and the leaf is a string.
    pub fn source_address(&self) -> Option<&str> {
        self.parameters()?
            .get("alert")?
            .as_object()?
            .get("data")?
            .as_object()?
            .get("srcip")?
            .as_str()
    }

    /// `parameters.extra_args`, if it is an array.
    pub fn extra_args(&self) -> Option<&[Value]> {
        self.parameters()?
            .get("extra_args")?
            .as_array()
            .map(Vec::as_slice)
    }

    /// The set name for `family`: `extra_args[0]` for IPv4, `extra_args[1]`
    /// for IPv6. Absent unless `extra_args` holds exactly two entries.
    pub fn list_name(&self, family: AddressFamily) -> Option<&str> {
        let args = self.extra_args()?;
        if args.len() != 2 {
            return None;
        }
        let index = match family {
            AddressFamily::V4 => 0,
            AddressFamily::V6 => 1,
        };
        args[index].as_str()
    }
}

fn require(
    root: &Map<String, Value>,
    field: &'static str,
    expected: &'static str,
    check: fn(&Value) -> bool,
) -> Result<(), SchemaError> {
    match root.get(field) {
        Some(value) if check(value) => Ok(()),
        _ => Err(SchemaError::Field { field, expected }),
    }
}

/// Closed set of commands understood by the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    Add,
    Delete,
    Continue,
    Abort,
    #[default]
    Invalid,
}

impl Action {
    /// Exact, case-sensitive classification. No trimming.
    pub fn classify(command: &str) -> Self {
        match command {
            "add" => Action::Add,
            "delete" => Action::Delete,
            "continue" => Action::Continue,
            "abort" => Action::Abort,
            _ => Action::Invalid,
        }
    }
}

/// Address family of a source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Handshake message asking the orchestrator whether `keys` may be added.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ControlMessage<'a> {
    version: u32,
    origin: ControlOrigin<'a>,
    command: &'static str,
    parameters: ControlParameters<'a>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct ControlOrigin<'a> {
    name: &'a str,
    module: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct ControlParameters<'a> {
    keys: [&'a str; 1],
}

impl<'a> ControlMessage<'a> {
    pub fn check_keys(program: &'a str, address: &'a str) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            origin: ControlOrigin {
                name: program,
                module: MODULE_NAME,
            },
            command: CHECK_KEYS_COMMAND,
            parameters: ControlParameters { keys: [address] },
        }
    }

    /// Single-line JSON encoding, without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
