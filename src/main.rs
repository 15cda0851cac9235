//! course-rag CLI entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use course_rag::cli::{Cli, debug_enabled, execute};

fn main() -> ExitCode {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(debug_enabled(&cli));

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                let mut stdout = io::stdout().lock();
                let _ = write!(stdout, "{output}");
                if !output.ends_with('\n') {
                    let _ = writeln!(stdout);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(io::stderr(), "Error: {:#}", anyhow::Error::from(e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays clean for answers and JSON.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "course_rag=debug" } else { "course_rag=warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
