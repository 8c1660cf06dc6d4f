//! # ipset-responder - active response for ipset blocklists
//!
//! Invoked once per event by the orchestrator. Reads a JSON request on
//! stdin and adds the event's source address to, or removes it from, an
//! ipset. Additions are confirmed with the orchestrator first.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ipset-responder                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport (stdin/stdout, one JSON document per line)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Protocol (serde_json)                                      │
//! │    ├── Request: envelope check + field extractors           │
//! │    ├── Action: add, delete, continue, abort                 │
//! │    └── ControlMessage: check_keys handshake                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Responder: validation chain, handshake, dispatch           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Mutator -> Enforcer (SetBackend trait)                     │
//! │    └── IpsetBackend: `ipset add|del <set> <ip> -exist`      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  LogSink: <install dir>/logs/active-responses.log           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use ipset_responder::config::Config;
//! use ipset_responder::enforcer::create_backend;
//! use ipset_responder::logsink::LogSink;
//! use ipset_responder::responder::Responder;
//! use ipset_responder::transport::Transport;
//!
//! let config = Config::load_or_default("/etc/ipset-responder/config.yaml")?;
//! let log = LogSink::from_config("ipset-responder", &config);
//! let backend = create_backend(&config)?;
//!
//! let stdin = std::io::stdin();
//! let mut transport = Transport::new(stdin.lock(), std::io::stdout(), config.max_line_bytes, &log);
//! Responder::new(&backend, &log).handle(&mut transport)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Process execution seam
//! - [`config`] - Configuration parsing and validation
//! - [`enforcer`] - Set mutation backend (ipset)
//! - [`error`] - Error types
//! - [`logsink`] - Active-response log file
//! - [`mutator`] - Idempotent add/delete with backend diagnostics
//! - [`protocol`] - Message envelope, commands, control message
//! - [`responder`] - Request handling pipeline
//! - [`transport`] - Bounded line reader/writer
//! - [`utils`] - Small helpers
//! - [`validation`] - Address family and set name checks

pub mod cli;
pub mod cmd_abstraction;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod logsink;
pub mod mutator;
pub mod protocol;
pub mod responder;
pub mod transport;
pub mod utils;
pub mod validation;

pub use cli::Cli;
pub use config::Config;
pub use error::ResponderError;
pub use responder::{Outcome, Responder};
