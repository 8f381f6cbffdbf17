//! CLI bootstrap - wire storage, settings and the app controller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::app::AppController;
use crate::capture::{CaptureBus, CaptureService};
use crate::settings::SettingsManager;
use crate::storage::{default_store_path, LocalStore, SparkStore};

use super::args::Args;

/// Context for CLI execution containing all initialized services.
pub struct CliContext {
    pub app: AppController,

    pub settings_manager: Arc<SettingsManager>,

    /// Storage file in use
    pub store_path: PathBuf,

    /// Command-line arguments
    pub args: Args,
}

/// Initialize the CLI context.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    init_logging(args.verbose);

    let store_path = args.store.clone().unwrap_or_else(default_store_path);
    if args.verbose {
        eprintln!("[cli] Store: {}", store_path.display());
    }

    let local = LocalStore::file(&store_path);
    let settings_manager = Arc::new(
        SettingsManager::load(local.clone())
            .await
            .context("Failed to load settings")?,
    );

    let sparks = SparkStore::new(local);
    let capture = CaptureService::new(sparks.clone(), CaptureBus::new());
    let mut app = AppController::new(sparks, settings_manager.clone(), capture);
    app.load().await.context("Failed to load sparks")?;

    if args.verbose {
        let settings = &app.state().settings;
        eprintln!(
            "[cli] {} sparks, language {}, endpoint {}",
            app.state().sparks.len(),
            settings.language,
            settings.ai.mode
        );
    }

    Ok(CliContext {
        app,
        settings_manager,
        store_path,
        args: args.clone(),
    })
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = format!("lumina={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
