//! Analyze command - screen local images without the web service.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use neuroscreen_adapters::models::{resolve, verify};
use neuroscreen_adapters::{models_dir, FsImageSource};
use neuroscreen_core::inference::get_device;
use neuroscreen_core::{Analyzer, BatchSummary};
use neuroscreen_server::config::AppConfig;
use neuroscreen_server::output::{JsonOutput, ProgressBar};
use tracing::{debug, info};

/// Output format for analysis records.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// A single JSON array.
    Json,
}

/// Arguments for the analyze command.
#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    /// Image files or directories to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Show a progress bar even when stderr is not a terminal
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress and per-image status
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON (only with --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Write `<stem>_face.<ext>` crops next to the inputs
    #[arg(long)]
    pub save_crops: bool,

    /// Directory holding the model files
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    #[arg(skip)]
    config: AppConfig,
}

impl AnalyzeArgs {
    /// Merges config file values into CLI args. CLI values win.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args.config = config.clone();
        args
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Run the analyze command.
///
/// Images that fail are skipped and counted; only setup and output errors
/// fail the run.
pub fn run(args: &AnalyzeArgs) -> Result<BatchSummary> {
    info!("Running analyze command on {} paths", args.paths.len());

    let dir = args.models_dir.clone().unwrap_or_else(models_dir);
    let files = resolve(&dir, &args.config.model_overrides());
    verify(&files)?;

    let analyzer = Analyzer::from_files(&files, args.config.detector(), &get_device())?
        .with_save_crops(args.save_crops);

    let inputs = FsImageSource::new(args.paths.clone(), args.recursive).collect_files();
    debug!("Found {} images", inputs.len());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(inputs.len(), args.quiet, show_progress);
    let output = match args.format() {
        OutputFormat::Jsonl => JsonOutput::stdout(),
        OutputFormat::Json => JsonOutput::stdout().array(args.pretty),
    };

    analyzer.analyze_batch(&inputs, &output, &progress)
}
