//! ipset command-line backend.

use tracing::{debug, warn};

use super::{MutationResult, SetBackend, SetOp, Severity};
use crate::cmd_abstraction::{args_to_strings, CommandExecutor, CommandOutput};
use crate::error::ResponderError;
use crate::validation::is_safe_set_name;

/// Modifier making add/del succeed when the entry is already in the
/// requested state.
const EXIST_FLAG: &str = "-exist";

/// Drives the `ipset` program.
pub struct IpsetBackend<E> {
    executor: E,
    program: String,
}

impl<E: CommandExecutor> IpsetBackend<E> {
    pub fn new(executor: E, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// Check that the program runs at all.
    pub fn probe(&self) -> Result<(), ResponderError> {
        let output = self
            .executor
            .execute(&self.program, &args_to_strings(&["--version"]))
            .map_err(|e| ResponderError::BackendUnavailable(format!("{:#}", e)))?;

        if !output.success {
            return Err(ResponderError::BackendUnavailable(format!(
                "{} --version failed: {}",
                self.program,
                strip_program_prefix(output.stderr.trim())
            )));
        }

        debug!("ipset available: {}", output.stdout.trim());
        Ok(())
    }
}

impl<E: CommandExecutor> SetBackend for IpsetBackend<E> {
    fn mutate(&self, op: SetOp, set_name: &str, address: &str) -> MutationResult {
        if !is_safe_set_name(set_name) {
            warn!("Refusing unsafe set name: {:?}", set_name);
            return MutationResult::error(&format!("Invalid set name: {}", set_name));
        }

        let args = args_to_strings(&[op.as_arg(), set_name, address, EXIST_FLAG]);
        debug!("Running {} {}", self.program, args.join(" "));

        match self.executor.execute(&self.program, &args) {
            Ok(output) => classify_output(&output),
            Err(e) => MutationResult::error(&format!("{:#}", e)),
        }
    }
}

/// Map an ipset run to a mutation result.
///
/// A non-zero exit is an error. A zero exit with text on stderr carries a
/// warning (when ipset says so) or a notice.
fn classify_output(output: &CommandOutput) -> MutationResult {
    let stderr = output.stderr.trim();

    if !output.success {
        let message = if stderr.is_empty() {
            match output.code {
                Some(code) => format!("ipset exited with status {}", code),
                None => "ipset terminated by signal".to_string(),
            }
        } else {
            strip_program_prefix(stderr).to_string()
        };
        return MutationResult::error(&message);
    }

    if stderr.is_empty() {
        return MutationResult::ok();
    }

    let message = strip_program_prefix(stderr);
    match message.strip_prefix("Warning:") {
        Some(rest) => MutationResult::ok_with(Severity::Warning, rest.trim_start()),
        None if message.contains("Warning") => MutationResult::ok_with(Severity::Warning, message),
        None => MutationResult::ok_with(Severity::Notice, message),
    }
}

/// Drop the `ipset vX.Y: ` prefix ipset puts on its diagnostics.
fn strip_program_prefix(message: &str) -> &str {
    match message.split_once(": ") {
        Some((head, rest)) if is_version_tag(head) => rest,
        _ => message,
    }
}

fn is_version_tag(head: &str) -> bool {
    head.strip_prefix("ipset v").is_some_and(|version| {
        !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.')
    })
}
