//! Request handling pipeline.
//!
//! ```text
//! read -> parse -> srcip -> family -> set name -> command
//!   delete: mutate
//!   add:    control message -> read confirmation -> continue: mutate
//!                                                  -> abort:    done
//! ```
//!
//! The first unmet precondition ends the invocation. Nothing is mutated
//! before every check has passed, and an add is never applied without a
//! `continue` from the orchestrator.

use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::enforcer::SetBackend;
use crate::error::ResponderError;
use crate::logsink::LogSink;
use crate::mutator::SetMutator;
use crate::protocol::{Action, ControlMessage, Request};
use crate::transport::Transport;
use crate::utils::truncate;
use crate::validation::address_family;

/// Longest excerpt of an unparseable confirmation quoted in the log.
const MAX_QUOTED_LINE: usize = 128;

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added,
    Deleted,
    /// The orchestrator vetoed the add; nothing was mutated.
    Aborted,
}

/// Orchestrator's answer to the control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    Continue,
    Abort,
}

/// Per-invocation context: the backend and the log sink.
pub struct Responder<'a, B: ?Sized> {
    backend: &'a B,
    log: &'a LogSink,
}

impl<'a, B: SetBackend + ?Sized> Responder<'a, B> {
    pub fn new(backend: &'a B, log: &'a LogSink) -> Self {
        Self { backend, log }
    }

    /// Run the pipeline and log the failure, if any.
    pub fn handle<R: BufRead, W: Write>(
        &self,
        transport: &mut Transport<'_, R, W>,
    ) -> Result<Outcome, ResponderError> {
        let result = self.run(transport);
        match &result {
            Ok(outcome) => info!("Request handled: {:?}", outcome),
            Err(e) => {
                debug!("Request failed: {:?}", e);
                self.log.log(e);
            }
        }
        result
    }

    /// Handle one request read from `transport`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        transport: &mut Transport<'_, R, W>,
    ) -> Result<Outcome, ResponderError> {
        let line = transport.read_line()?;
        let request = Request::parse(&line).map_err(ResponderError::MalformedRequest)?;

        let address = request
            .source_address()
            .ok_or(ResponderError::MissingSourceAddress)?;
        let family = address_family(address)
            .ok_or_else(|| ResponderError::InvalidAddress(address.to_string()))?;
        let set_name = request
            .list_name(family)
            .ok_or(ResponderError::MissingListName(family))?;
        let command = request.command().ok_or(ResponderError::MissingCommand)?;

        let mutator = SetMutator::new(self.backend, self.log);

        match Action::classify(command) {
            Action::Add => match self.confirm(transport, address)? {
                Confirmation::Continue => {
                    mutator.add(set_name, address)?;
                    Ok(Outcome::Added)
                }
                Confirmation::Abort => {
                    self.log.log("Aborted");
                    Ok(Outcome::Aborted)
                }
            },
            Action::Delete => {
                mutator.delete(set_name, address)?;
                Ok(Outcome::Deleted)
            }
            // continue/abort only mean something as a confirmation
            Action::Continue | Action::Abort | Action::Invalid => {
                Err(ResponderError::UnknownCommand(command.to_string()))
            }
        }
    }

    /// Ask the orchestrator whether `address` may be added.
    fn confirm<R: BufRead, W: Write>(
        &self,
        transport: &mut Transport<'_, R, W>,
        address: &str,
    ) -> Result<Confirmation, ResponderError> {
        let message = ControlMessage::check_keys(self.log.program(), address)
            .to_line()
            .map_err(ResponderError::ControlMessage)?;
        transport.write_line(&message)?;

        let line = transport.read_line()?;
        let reply = match Request::parse(&line) {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Confirmation rejected: {}", e);
                return Err(ResponderError::UnknownConfirmation(truncate(
                    &line,
                    MAX_QUOTED_LINE,
                )));
            }
        };

        let command = reply.command().unwrap_or_default();
        match Action::classify(command) {
            Action::Continue => Ok(Confirmation::Continue),
            Action::Abort => Ok(Confirmation::Abort),
            _ => Err(ResponderError::UnknownConfirmation(command.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enforcer::{MockSetBackend, MutationResult, SetOp};
    use crate::error::TransportError;
    use std::io::Cursor;
    use tempfile::TempDir;

    const PROGRAM: &str = "/var/ossec/active-response/bin/ipset-responder";

    const ADD: &str = r#"{"version":1,"origin":{},"command":"add","parameters":{"alert":{"data":{"srcip":"203.0.113.5"}},"extra_args":["blocklist4","blocklist6"]}}"#;
    const DELETE: &str = r#"{"version":1,"origin":{},"command":"delete","parameters":{"alert":{"data":{"srcip":"203.0.113.5"}},"extra_args":["blocklist4","blocklist6"]}}"#;
    const CONTINUE: &str = r#"{"version":1,"origin":{},"command":"continue","parameters":{}}"#;
    const ABORT: &str = r#"{"version":1,"origin":{},"command":"abort","parameters":{}}"#;

    struct Run {
        result: Result<Outcome, ResponderError>,
        stdout: String,
        log: String,
    }

    fn request(command: &str, srcip: &str, extra_args: &str) -> String {
        format!(
            r#"{{"version":1,"origin":{{"name":"worker","module":"wazuh-execd"}},"command":"{}","parameters":{{"alert":{{"data":{{"srcip":"{}"}}}},"extra_args":{}}}}}"#,
            command, srcip, extra_args
        )
    }

    fn run_with(backend: &MockSetBackend, lines: &[&str]) -> Run {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("active-responses.log");
        let log = LogSink::new(PROGRAM, Some(log_path.clone()));

        let mut input = lines.join("\n");
        input.push('\n');
        let mut transport = Transport::new(Cursor::new(input.into_bytes()), Vec::new(), 65536, &log);

        let result = Responder::new(backend, &log).handle(&mut transport);
        Run {
            result,
            stdout: String::from_utf8(transport.into_writer()).unwrap(),
            log: std::fs::read_to_string(&log_path).unwrap_or_default(),
        }
    }

    fn expect_mutation(backend: &mut MockSetBackend, op: SetOp, set: &'static str, addr: &'static str) {
        backend
            .expect_mutate()
            .withf(move |o, s, a| *o == op && s == set && a == addr)
            .times(1)
            .returning(|_, _, _| MutationResult::ok());
    }

    fn no_mutation() -> MockSetBackend {
        let mut backend = MockSetBackend::new();
        backend.expect_mutate().times(0);
        backend
    }

    #[test]
    fn test_add_then_continue_mutates() {
        let mut backend = MockSetBackend::new();
        expect_mutation(&mut backend, SetOp::Add, "blocklist4", "203.0.113.5");

        let run = run_with(&backend, &[ADD, CONTINUE]);

        assert_eq!(run.result.unwrap(), Outcome::Added);
        let expected = format!(
            "{{\"version\":1,\"origin\":{{\"name\":\"{}\",\"module\":\"active-response\"}},\"command\":\"check_keys\",\"parameters\":{{\"keys\":[\"203.0.113.5\"]}}}}\n",
            PROGRAM
        );
        assert_eq!(run.stdout, expected);
    }

    #[test]
    fn test_add_then_abort_does_not_mutate() {
        let backend = no_mutation();
        let run = run_with(&backend, &[ADD, ABORT]);

        assert_eq!(run.result.unwrap(), Outcome::Aborted);
        assert!(run.stdout.contains("\"check_keys\""));
        assert!(run.log.contains(": Aborted\n"));
    }

    #[test]
    fn test_delete_skips_handshake() {
        let mut backend = MockSetBackend::new();
        expect_mutation(&mut backend, SetOp::Delete, "blocklist4", "203.0.113.5");

        let run = run_with(&backend, &[DELETE]);

        assert_eq!(run.result.unwrap(), Outcome::Deleted);
        assert!(run.stdout.is_empty());
    }

    #[test]
    fn test_ipv6_uses_second_set() {
        let mut backend = MockSetBackend::new();
        expect_mutation(&mut backend, SetOp::Delete, "blocklist6", "2001:db8::5");

        let line = request("delete", "2001:db8::5", r#"["blocklist4","blocklist6"]"#);
        let run = run_with(&backend, &[line.as_str()]);
        assert_eq!(run.result.unwrap(), Outcome::Deleted);
    }

    #[test]
    fn test_invalid_address() {
        let backend = no_mutation();
        let line = request("add", "not-an-ip", r#"["blocklist4","blocklist6"]"#);
        let run = run_with(&backend, &[line.as_str(), CONTINUE]);

        assert!(matches!(run.result, Err(ResponderError::InvalidAddress(ref a)) if a == "not-an-ip"));
        assert!(run.stdout.is_empty());
        assert!(run.log.contains("Invalid IP address: not-an-ip"));
    }

    #[test]
    fn test_every_read_line_is_logged() {
        let mut backend = MockSetBackend::new();
        expect_mutation(&mut backend, SetOp::Add, "blocklist4", "203.0.113.5");

        let run = run_with(&backend, &[ADD, CONTINUE]);
        assert!(run.log.contains(ADD));
        assert!(run.log.contains(CONTINUE));
    }

    #[test]
    fn test_malformed_primary_request() {
        let backend = no_mutation();
        for line in [
            "not json",
            r#"{"origin":{},"command":"delete","parameters":{}}"#,
            r#"{"version":1,"origin":{},"command":"delete"}"#,
            r#"{"version":1,"origin":{},"command":["delete"],"parameters":{}}"#,
        ] {
            let run = run_with(&backend, &[line]);
            assert!(
                matches!(run.result, Err(ResponderError::MalformedRequest(_))),
                "{}",
                line
            );
            assert!(run.log.contains("Failed to parse JSON input"));
        }
    }

    #[test]
    fn test_missing_srcip() {
        let backend = no_mutation();
        let line = r#"{"version":1,"origin":{},"command":"delete","parameters":{"alert":{"data":{}},"extra_args":["a","b"]}}"#;
        let run = run_with(&backend, &[line]);
        assert!(matches!(run.result, Err(ResponderError::MissingSourceAddress)));
        assert!(run.log.contains("Missing srcip in input JSON"));
    }

    #[test]
    fn test_bad_extra_args() {
        let backend = no_mutation();
        for args in [r#"[]"#, r#"["only"]"#, r#"["a","b","c"]"#, r#"[1,"b"]"#, r#""a,b""#] {
            let line = request("delete", "10.0.0.1", args);
            let run = run_with(&backend, &[line.as_str()]);
            assert!(
                matches!(run.result, Err(ResponderError::MissingListName(_))),
                "{}",
                args
            );
            assert!(run.log.contains("Missing list name for IPv4"), "{}", args);
        }
    }

    #[test]
    fn test_unknown_command() {
        let backend = no_mutation();
        let line = request("flush", "10.0.0.1", r#"["a","b"]"#);
        let run = run_with(&backend, &[line.as_str()]);
        assert!(matches!(run.result, Err(ResponderError::UnknownCommand(ref c)) if c == "flush"));
        assert!(run.log.contains("Unknown command: flush"));
    }

    #[test]
    fn test_confirmation_commands_are_not_initiating_commands() {
        let backend = no_mutation();
        for command in ["continue", "abort", "ADD"] {
            let line = request(command, "10.0.0.1", r#"["a","b"]"#);
            let run = run_with(&backend, &[line.as_str(), CONTINUE]);
            assert!(matches!(run.result, Err(ResponderError::UnknownCommand(_))));
            assert!(run.stdout.is_empty());
        }
    }

    #[test]
    fn test_unknown_confirmation() {
        let backend = no_mutation();
        let resent_add = r#"{"version":1,"origin":{},"command":"add","parameters":{}}"#;
        let run = run_with(&backend, &[ADD, resent_add]);

        assert!(matches!(run.result, Err(ResponderError::UnknownConfirmation(ref c)) if c == "add"));
        assert!(run.log.contains("Unknown confirmation command: add"));
    }

    #[test]
    fn test_malformed_confirmation_is_unknown_confirmation() {
        let backend = no_mutation();
        let run = run_with(&backend, &[ADD, "{\"command\":\"continue\"}"]);
        assert!(matches!(run.result, Err(ResponderError::UnknownConfirmation(_))));
    }

    #[test]
    fn test_missing_confirmation_is_transport_error() {
        let backend = no_mutation();
        let run = run_with(&backend, &[ADD]);
        assert!(matches!(
            run.result,
            Err(ResponderError::Transport(TransportError::Closed))
        ));
        assert!(run.stdout.contains("check_keys"));
        assert!(run.log.contains("Failed to read input from stdin"));
    }

    #[test]
    fn test_backend_failure_fails_request() {
        let mut backend = MockSetBackend::new();
        backend
            .expect_mutate()
            .times(1)
            .returning(|_, _, _| MutationResult::error("The set with the given name does not exist"));

        let run = run_with(&backend, &[DELETE]);
        assert!(matches!(run.result, Err(ResponderError::Mutation { .. })));
        assert!(run.log.contains("Error: The set with the given name does not exist"));
    }
}
