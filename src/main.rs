//! Terminal chat client for a knowledge-base search service.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod shell;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use kb_chat::config::{AppConfig, Cli};
use kb_chat::transport::HttpKnowledgeBase;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use shell::Shell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();

    // Initialize tracing (M-LOG-STRUCTURED); stderr keeps stdout for answers
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| fmt::layer().with_target(true).with_writer(std::io::stderr)),
        )
        .init();

    let config = Arc::new(AppConfig::from_cli(&cli)?);

    info!(
        name: "config.loaded",
        base_url = %config.api.base_url,
        mode = ?config.ask.mode,
        language = %config.ask.language,
        "Configuration loaded"
    );

    let kb = HttpKnowledgeBase::from_config(&config)?;
    let mut shell = Shell::new(kb, Arc::clone(&config));

    match cli.query.as_deref() {
        Some(question) => shell.ask(question).await,
        None => shell.run().await,
    }
}
