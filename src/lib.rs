pub mod blob;
pub mod config;
pub mod content;
pub mod routes;

use anyhow::Result;
use axum::Router;
use std::sync::Arc;

use crate::blob::BlobClient;
use crate::content::ContentSource;
use crate::routes::AppState;

/// Router wired to the real blob store described by `cfg`.
pub fn app(cfg: &config::Config) -> Result<Router> {
    let client = BlobClient::from_config(cfg)?;
    let content = ContentSource::new(Arc::new(client), cfg.documents.clone());
    Ok(routes::create_router(Arc::new(AppState { content })))
}
