// ============================
// huddle-backend-bin/src/main.rs
// ============================
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use huddle_backend_lib::{config::Settings, ws_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "huddle-server", about = "Realtime signaling server for huddle meetings")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        settings.bind_addr.set_port(port);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings));
    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
