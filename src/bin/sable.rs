use anyhow::Result;
use clap::Parser;
use std::io::Write;

use sable::cli::args::CliArgs;
use sable::cli::driver;

fn main() -> Result<()> {
    // Initialize tracing if SABLE_LOG or RUST_LOG is set (zero cost otherwise).
    // Supports SABLE_LOG_FORMAT=tree|json|text (see src/tracing_config.rs).
    sable::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let start_time = std::time::Instant::now();
    let mut stdout = std::io::stdout().lock();
    let code = driver::run(&args, &mut stdout)?;
    tracing::debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, code, "sable finished");

    stdout.flush()?;
    std::process::exit(code);
}
