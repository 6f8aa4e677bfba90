use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use firm_content_api::config;

#[derive(Debug, Parser)]
#[command(author, version, about = "Serve the firm's published resources and testimonials")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Listen address, overriding `app.bind`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    if let Some(bind) = args.bind {
        cfg.app.bind = bind;
        config::validate(&cfg)?;
    }
    let addr = cfg.bind_addr()?;

    let app = firm_content_api::app(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, resources = %cfg.documents.resources, testimonials = %cfg.documents.testimonials, "serving published content");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
