use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trpc_boundary_inspector::cli::{Cli, Command, run_inject, run_scan};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Some(Command::Inject(args)) => run_inject(args),
        None => run_scan(&cli.scan),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
