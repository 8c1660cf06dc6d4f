//! ipset-responder - active response for ipset blocklists.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use ipset_responder::config::Config;
use ipset_responder::enforcer::create_backend;
use ipset_responder::error::ResponderError;
use ipset_responder::logsink::LogSink;
use ipset_responder::transport::Transport;
use ipset_responder::{Cli, Responder};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the protocol, diagnostics go to stderr
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }

    // Identity written into the log and into origin.name of control messages
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            let log = LogSink::from_config(program, &Config::default());
            let err = ResponderError::Config(format!("{:#}", e));
            log.log(&err);
            return ExitCode::from(err.exit_code());
        }
    };
    debug!("Configuration: {:?}", config);

    let log = LogSink::from_config(program, &config);
    debug!("Logging to {:?}", log.path());

    let backend = match create_backend(&config) {
        Ok(backend) => backend,
        Err(e) => {
            log.log(&e);
            return ExitCode::from(e.exit_code());
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut transport = Transport::new(stdin.lock(), stdout.lock(), config.max_line_bytes, &log);

    match Responder::new(&backend, &log).handle(&mut transport) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_code()),
    }
}
