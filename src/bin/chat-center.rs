//! Demo chat center server.
//!
//! Starts the engine with the default four-team roster (or a JSON config
//! file) and runs both background loops until Ctrl+C.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_engine::config::EngineConfig;
use chat_engine::server::ChatCenterServerBuilder;

#[derive(Parser, Debug)]
#[command(name = "chat-center", about = "Chat queue and agent allocation server")]
struct Args {
    /// Path to a JSON configuration file (defaults to the built-in roster)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    let mut server = ChatCenterServerBuilder::new().with_config(config).build()?;
    server.start().await?;

    info!("💬 Chat center is ready; press Ctrl+C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received");
        }
        result = server.run() => {
            result?;
        }
    }

    server.stop().await?;
    Ok(())
}
