//! Published content backed by the blob store.
//!
//! Upstream failures never leave this module: a missing blob, a network
//! error or a body that is not JSON all yield the document's `Default`.
//! Shape problems inside a readable document are left to the filters.
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::blob::BlobStore;
use crate::config::Documents;

pub mod model;

pub use model::{FilterError, Publishable, ResourceDocument, TestimonialDocument};

#[derive(Clone)]
pub struct ContentSource {
    store: Arc<dyn BlobStore>,
    documents: Documents,
}

impl ContentSource {
    pub fn new(store: Arc<dyn BlobStore>, documents: Documents) -> Self {
        Self { store, documents }
    }

    pub async fn resources(&self) -> ResourceDocument {
        self.load(&self.documents.resources).await
    }

    pub async fn testimonials(&self) -> TestimonialDocument {
        self.load(&self.documents.testimonials).await
    }

    /// Fresh copy of the document stored at `pathname`, or the empty default.
    #[instrument(skip(self))]
    pub async fn load<D: Publishable>(&self, pathname: &str) -> D {
        match self.try_load(pathname).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!("blob not found; serving empty document");
                D::default()
            }
            Err(err) => {
                warn!(?err, "failed to load blob; serving empty document");
                D::default()
            }
        }
    }

    async fn try_load<D: Publishable>(&self, pathname: &str) -> Result<Option<D>> {
        let Some(blob) = self.store.find(pathname).await? else {
            return Ok(None);
        };
        let body = self.store.fetch_json(&blob.url).await?;
        Ok(Some(D::from(body)))
    }
}
