//! Terminal logging for the CLI: env_logger with a colored `[roster]` prefix.

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::fmt::Arguments;
use std::io::Write;

const CRATE: &str = env!("CARGO_PKG_NAME");

/// Level for our own modules. Dependencies stay at Warn either way.
fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// `roster::pipeline::worker` -> `pipeline::worker`; foreign targets are kept whole.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(CRATE)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

/// One log line. Problems carry level and module; debug lines name their module so
/// worker and consumer output can be told apart; info is the bare message.
fn format_line(level: Level, target: &str, args: &Arguments<'_>) -> String {
    let prefix = CRATE.cyan();
    let module = short_target(target);
    match level {
        Level::Error => format!("[{} {} {}] {}", prefix, "ERROR".red(), module.white(), args),
        Level::Warn => format!("[{} {} {}] {}", prefix, "WARN".yellow(), module.white(), args),
        Level::Debug | Level::Trace => format!("[{} {}] {}", prefix, module.dimmed(), args),
        Level::Info => format!("[{}] {}", prefix, args),
    }
}

/// Initialize env_logger: our crate at Info (Debug when `verbose`), dependencies at Warn.
/// `RUST_LOG` still applies. Safe to call more than once; later calls are ignored.
pub fn setup_logging(verbose: bool) {
    let installed = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(CRATE, crate_level(verbose))
        .format(|buf, record| {
            let line = format_line(record.level(), record.target(), record.args());
            writeln!(buf, "{}", line)
        })
        .try_init();
    if installed.is_err() {
        log::trace!("logger already installed");
    }
}
