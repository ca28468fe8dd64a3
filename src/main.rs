//! msvcfind CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use msvcfind::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for diagnostics.
///
/// Verbosity is controlled by:
/// 1. Repeated `-d` flags (warn, info, debug, trace)
/// 2. `RUST_LOG` environment variable (when no `-d` given)
///
/// Diagnostics go to stderr; stdout carries only the wire-format output.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbosity > 0 {
        EnvFilter::new(format!("msvcfind={}", level))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("msvcfind=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("msvcfind starting with args: {:?}", cli);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    match cli::run(&cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{} {}", console::style("error:").red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
