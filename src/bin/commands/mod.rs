use std::io as stdio;
use std::time::Duration;

use anyhow::Result;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

pub mod convert;

/// Installs the `env_logger` backend; `RUST_LOG` takes precedence over `-v` flags.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Wraps long-running operations with a spinner rendered to stderr.
///
/// The spinner is only drawn when stderr is a terminal.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    if !stdio::stderr().is_terminal() {
        return work();
    }

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}
