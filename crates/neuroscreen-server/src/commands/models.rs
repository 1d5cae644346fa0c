//! Models command - inspect model files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use neuroscreen_adapters::models::{list_models as adapter_list_models, resolve, MODELS};
use neuroscreen_adapters::models_dir;
use neuroscreen_server::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Directory holding the model files
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List model files with their checksums
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let dir = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .unwrap_or_else(models_dir);

    match args.command {
        ModelsCommand::List => list_models(&dir, config),
        ModelsCommand::Path => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn list_models(dir: &Path, config: &AppConfig) -> Result<()> {
    let files = resolve(dir, &config.model_overrides());
    let models = adapter_list_models(&files)?;

    println!("Models directory: {}", dir.display());
    println!();

    for status in &models {
        let mark = if status.sha256.is_some() { "✓" } else { "✗" };
        let description = MODELS
            .iter()
            .find(|m| m.name == status.name)
            .map_or("", |m| m.description);
        println!("  {mark} {} ({description})", status.name);
        println!("      {}", status.path.display());
        if let Some(ref sha) = status.sha256 {
            println!("      sha256 {sha}");
        }
    }

    println!();
    let installed = models.iter().filter(|m| m.sha256.is_some()).count();
    println!("{installed}/{} models installed", models.len());

    Ok(())
}
