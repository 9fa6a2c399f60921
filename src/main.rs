//! YouTube Research Agent server entry point.

use clap::Parser;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use yt_research_agent::config::{self, AppConfig, Cli, Command};
use yt_research_agent::memory::PineconeIndex;
use yt_research_agent::server::start_server;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenv().ok();

    let cli = Cli::parse();

    if let Some(Command::ResetIndex) = cli.command {
        let settings = config::load_pinecone_settings()?;
        PineconeIndex::reset(&settings).await?;
        info!(index = %settings.index_name, "Vector index recreated");
        return Ok(());
    }

    let config =
        AppConfig::load(&cli).map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    start_server(config).await
}
