use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::config::Config;

pub mod model;

pub use model::{BlobEntry, ListBlobsResp};

const BLOB_API_BASE: &str = "https://blob.vercel-storage.com/";

/// Query parameter appended to content URLs so every fetch bypasses CDN caches.
pub const CACHE_BUST_PARAM: &str = "t";

#[derive(Clone)]
pub struct BlobClient {
    http: Client,
    base_url: Url,
    token: String,
    api_version: String,
}

impl fmt::Debug for BlobClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// Read side of the blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Every blob whose pathname starts with `prefix`, across all pages.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;

    /// Download `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value>;

    /// The blob stored under exactly `pathname`, if any.
    async fn find(&self, pathname: &str) -> Result<Option<BlobEntry>> {
        let blobs = self.list(pathname).await?;
        Ok(blobs.into_iter().find(|b| b.pathname == pathname))
    }
}

impl BlobClient {
    pub fn new(token: String, api_version: String) -> Result<Self> {
        let base_url = Url::parse(BLOB_API_BASE).context("invalid default blob URL")?;
        Self::with_base_url(token, api_version, base_url)
    }

    pub fn with_base_url(token: String, api_version: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("firm-content-api/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
            api_version,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.blob.base_url).context("invalid blob.base_url")?;
        Self::with_base_url(cfg.blob.token.clone(), cfg.blob.api_version.clone(), base_url)
    }

    pub fn build_list_request(&self, prefix: &str, cursor: Option<&str>) -> Result<reqwest::Request> {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prefix", prefix);
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        self.http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("x-api-version", &self.api_version)
            .build()
            .context("failed to build blob list request")
    }

    /// Content URLs are public; the store token is never sent to them.
    pub fn build_fetch_request(&self, url: &str) -> Result<reqwest::Request> {
        let mut url = Url::parse(url).with_context(|| format!("invalid blob URL: {url}"))?;
        url.query_pairs_mut().append_pair(
            CACHE_BUST_PARAM,
            &chrono::Utc::now().timestamp_millis().to_string(),
        );
        self.http
            .get(url)
            .build()
            .context("failed to build blob fetch request")
    }

    async fn list_page(&self, prefix: &str, cursor: Option<&str>) -> Result<ListBlobsResp> {
        let request = self.build_list_request(prefix, cursor)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach blob store")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("blob list error {}: {}", status, body));
        }
        res.json::<ListBlobsResp>()
            .await
            .context("invalid blob list response")
    }
}

#[async_trait]
impl BlobStore for BlobClient {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list_page(prefix, cursor.as_deref()).await?;
            debug!(prefix, count = page.blobs.len(), has_more = page.has_more, "listed blob page");
            blobs.extend(page.blobs);
            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blobs)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let request = self.build_fetch_request(url)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to download blob")?;
        if !res.status().is_success() {
            return Err(anyhow!("blob fetch error {}", res.status()));
        }
        res.json::<Value>().await.context("blob body is not JSON")
    }
}
