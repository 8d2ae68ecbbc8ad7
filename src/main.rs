use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use verbum_live::{Config, SessionOrchestrator};

/// Stream microphone audio to the Verbum speech-to-text service and print
/// live transcription results.
#[derive(Debug, Parser)]
#[command(name = "verbum-live", version)]
struct Cli {
    /// Config file path (TOML); VERBUM_* env vars and defaults apply without it
    #[arg(short, long)]
    config: Option<String>,

    /// Server endpoint, e.g. wss://sdk.verbum.ai
    #[arg(long)]
    server: Option<String>,

    /// API key (overrides the config file and VERBUM_SERVER__API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Recognition language, e.g. es-MX
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.url = server;
    }
    if let Some(api_key) = cli.api_key {
        config.server.api_key = api_key;
    }
    if let Some(language) = cli.language {
        config.stt.language = language;
    }

    if config.server.api_key.is_empty() {
        bail!(
            "no API key configured; pass --api-key, set VERBUM_SERVER__API_KEY, \
             or add server.api_key to the config file"
        );
    }

    // The cpal stream handle is not Send, so the orchestrator runs directly
    // on this task rather than being spawned.
    SessionOrchestrator::new(config).run().await
}
