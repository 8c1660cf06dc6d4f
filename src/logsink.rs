//! Active-response log file.
//!
//! One line per message, `"<YYYY/MM/DD HH:MM:SS> <program>: <message>"`,
//! appended to `<install dir>/logs/active-responses.log`. The file is opened
//! and closed for every message. When it cannot be opened the line goes to
//! stderr instead; logging never fails the caller.

use chrono::{DateTime, Local};
use std::ffi::{CStr, CString};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;

/// Location of the log file relative to the install directory.
pub const LOG_FILE_RELATIVE: &str = "logs/active-responses.log";

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Destination for active-response log lines.
#[derive(Debug, Clone)]
pub struct LogSink {
    program: String,
    path: Option<PathBuf>,
}

impl LogSink {
    /// Sink writing to `path`, or to stderr when `path` is `None`.
    pub fn new(program: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            path,
        }
    }

    /// Sink for the configured log file, or the one under the discovered
    /// install directory.
    pub fn from_config(program: impl Into<String>, config: &Config) -> Self {
        let path = config.log_file.clone().or_else(|| {
            install_dir(
                &config.install_user,
                &config.install_env,
                &config.default_install_dir,
            )
            .map(|dir| dir.join(LOG_FILE_RELATIVE))
        });
        Self::new(program, path)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one message.
    pub fn log(&self, message: impl fmt::Display) {
        let line = self.format_line(Local::now(), &message);
        debug!("{}", line.trim_end());

        if let Some(path) = &self.path {
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(line.as_bytes()));
            if written.is_ok() {
                return;
            }
        }

        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = handle.write_all(line.as_bytes());
        let _ = handle.flush();
    }

    fn format_line(&self, now: DateTime<Local>, message: &dyn fmt::Display) -> String {
        format!(
            "{} {}: {}\n",
            now.format(TIMESTAMP_FORMAT),
            self.program,
            message
        )
    }
}

/// Find the install directory.
///
/// Tried in order: the home directory of `user`, the directory named by the
/// `env_var` environment variable, `default`. The chosen path must be an
/// existing directory, otherwise there is no install directory.
pub fn install_dir(user: &str, env_var: &str, default: &Path) -> Option<PathBuf> {
    let candidate = home_of(user)
        .or_else(|| std::env::var_os(env_var).map(PathBuf::from))
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| default.to_path_buf());

    if candidate.is_dir() {
        Some(candidate)
    } else {
        None
    }
}

/// Home directory of a system user from the password database.
fn home_of(user: &str) -> Option<PathBuf> {
    let name = CString::new(user).ok()?;

    // SAFETY: `name` is a valid NUL-terminated string for the duration of the
    // call. getpwnam returns NULL or a pointer to static storage that stays
    // valid until the next getpw* call; the process is single-threaded and
    // pw_dir is copied out before returning.
    unsafe {
        let entry = libc::getpwnam(name.as_ptr());
        if entry.is_null() || (*entry).pw_dir.is_null() {
            return None;
        }
        let dir = CStr::from_ptr((*entry).pw_dir).to_str().ok()?;
        if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        }
    }
}
