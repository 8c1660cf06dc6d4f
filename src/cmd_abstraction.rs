//! Process execution seam for the ipset backend.
//!
//! The backend never spawns processes directly; it goes through
//! [`CommandExecutor`] so unit tests can script the program's exit status
//! and stderr without touching the kernel's sets.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

/// Captured result of one program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status was zero
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Successful run with the given stderr text.
    pub fn ok_with_stderr(stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            success: true,
            code: Some(0),
            ..Self::default()
        }
    }

    /// Failed run with the given exit code and stderr text.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            success: false,
            code: Some(code),
            ..Self::default()
        }
    }
}

/// Runs external programs.
///
/// Arguments are `&[String]` rather than `&[&str]`: mockall cannot express
/// the nested lifetimes of the latter.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, stdin closed, capturing stdout and stderr.
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Executor spawning real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Convert a slice of `&str` into owned argument strings.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
