//! Serve command - run the web service.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use clap::Args;
use neuroscreen_adapters::models::{resolve, verify};
use neuroscreen_adapters::{models_dir, GeminiChat, UploadDir};
use neuroscreen_core::inference::get_device;
use neuroscreen_core::Analyzer;
use neuroscreen_server::config::{defaults, AppConfig};
use neuroscreen_server::http::router;
use neuroscreen_server::state::AppState;
use tracing::{info, warn};

/// Arguments for the serve command.
#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Directory uploads and face crops are written to
    #[arg(long, value_name = "DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Directory holding the model files
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

/// Run the serve command. Blocks until Ctrl-C.
pub fn run(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let addr = bind_addr(args, config)?;
    let state = build_state(args, config)?;
    let app = router(state, config.max_upload_bytes());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(serve(addr, app))
}

async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

fn bind_addr(args: &ServeArgs, config: &AppConfig) -> Result<SocketAddr> {
    if let Some(addr) = args.bind {
        return Ok(addr);
    }
    let raw = config.server.bind.as_deref().unwrap_or(defaults::BIND);
    raw.parse()
        .with_context(|| format!("Invalid bind address: {raw}"))
}

/// Loads every model and opens the upload directory.
fn build_state(args: &ServeArgs, config: &AppConfig) -> Result<AppState> {
    let dir = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .unwrap_or_else(models_dir);
    let files = resolve(&dir, &config.model_overrides());
    verify(&files)?;

    let analyzer = Analyzer::from_files(&files, config.detector(), &get_device())?;

    let uploads_dir = args
        .uploads_dir
        .clone()
        .or_else(|| config.server.uploads_dir.clone())
        .unwrap_or_else(|| PathBuf::from(defaults::UPLOADS_DIR));
    let uploads = UploadDir::new(uploads_dir)?;
    info!("Storing uploads in {}", uploads.root().display());

    let chat = match config.chat_api_key() {
        Some(key) => {
            let chat = GeminiChat::new(
                config.chat_api_base(),
                config.chat_model(),
                key,
                config.chat_timeout(),
            )?;
            info!("Chat relay enabled ({})", config.chat_model());
            Some(chat)
        }
        None => {
            let env = config
                .chat
                .api_key_env
                .as_deref()
                .unwrap_or(defaults::API_KEY_ENV);
            warn!("Chat relay disabled: no API key in config or ${env}");
            None
        }
    };

    Ok(AppState::new(analyzer, uploads, chat))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
