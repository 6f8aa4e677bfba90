use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One object as reported by the blob listing API.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlobEntry {
    pub url: String,
    pub pathname: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A single page of `GET /?prefix=..`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListBlobsResp {
    pub blobs: Vec<BlobEntry>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}
