//! CLI command definitions and handlers.

pub mod analyze;
pub mod models;
pub mod serve;

use clap::{Parser, Subcommand};

/// NeuroScreen - autism, emotion and ADHD screening service
#[derive(Parser)]
#[command(name = "neuroscreen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the web service
    Serve(serve::ServeArgs),
    /// Screen local image files and print one record per image
    Analyze(analyze::AnalyzeArgs),
    /// Inspect model files
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
