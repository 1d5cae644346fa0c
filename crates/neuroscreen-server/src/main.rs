//! NeuroScreen CLI - screening web service and batch analysis.

use clap::Parser;
use neuroscreen_server::config::AppConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, ExitCode};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error.into()
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => commands::serve::run(&args, config)?,
        Commands::Analyze(args) => {
            let args = commands::analyze::AnalyzeArgs::with_config(args, config);
            let summary = commands::analyze::run(&args)?;
            info!(
                "Analyzed {} images, skipped {}",
                summary.processed, summary.skipped
            );
        }
        Commands::Models(args) => commands::models::run(&args, config)?,
    }
    Ok(())
}
