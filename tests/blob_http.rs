//! Runs the real client against a local server that mimics the blob API.
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use firm_content_api::blob::{BlobClient, BlobStore, CACHE_BUST_PARAM};
use firm_content_api::config::{self, Config};

#[derive(Default)]
struct Seen {
    auth: Vec<Option<String>>,
    content_queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<(SocketAddr, Mutex<Seen>)>;

async fn list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    state.1.lock().await.auth.push(auth.clone());
    if auth.as_deref() != Some("Bearer secret") {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })));
    }
    let base = format!("http://{}", state.0);
    let prefix = q.get("prefix").cloned().unwrap_or_default();
    let page = match q.get("cursor").map(String::as_str) {
        None => json!({
            "blobs": [{
                "url": format!("{base}/content/{prefix}.v0"),
                "pathname": format!("{prefix}.v0"),
                "size": 10,
                "uploadedAt": "2024-05-01T12:00:00.000Z"
            }],
            "cursor": "page-2",
            "hasMore": true
        }),
        Some("page-2") => json!({
            "blobs": [{
                "url": format!("{base}/content/{prefix}"),
                "downloadUrl": format!("{base}/content/{prefix}?download=1"),
                "pathname": prefix,
                "size": 42,
                "uploadedAt": "2024-05-02T12:00:00.000Z"
            }],
            "hasMore": false
        }),
        Some(_) => json!({ "blobs": [], "hasMore": false }),
    };
    (StatusCode::OK, Json(page))
}

async fn content(
    State(state): State<Shared>,
    axum::extract::Path(name): axum::extract::Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.1.lock().await.content_queries.push(q);
    match name.as_str() {
        "resources.json" => (
            StatusCode::OK,
            Json(json!({ "resources": [{ "id": "a", "published": true }], "published": ["a"] })),
        ),
        _ => (StatusCode::NOT_FOUND, Json(Value::Null)),
    }
}

async fn spawn_store() -> Shared {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state: Shared = Arc::new((addr, Mutex::new(Seen::default())));
    let app = Router::new()
        .route("/", get(list))
        .route("/content/:name", get(content))
        .with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    state
}

fn client(state: &Shared, token: &str) -> BlobClient {
    let base = Url::parse(&format!("http://{}/", state.0)).unwrap();
    BlobClient::with_base_url(token.into(), "7".into(), base).unwrap()
}

#[tokio::test]
async fn list_follows_cursor_across_pages() {
    let state = spawn_store().await;
    let blobs = client(&state, "secret").list("resources.json").await.unwrap();
    let names: Vec<&str> = blobs.iter().map(|b| b.pathname.as_str()).collect();
    assert_eq!(names, vec!["resources.json.v0", "resources.json"]);
    assert_eq!(blobs[1].size, Some(42));
    assert!(blobs[1].download_url.is_some());
    assert!(blobs[0].uploaded_at.is_some());

    let seen = state.1.lock().await;
    assert_eq!(seen.auth.len(), 2);
}

#[tokio::test]
async fn find_then_fetch_busts_cache() {
    let state = spawn_store().await;
    let client = client(&state, "secret");
    let blob = client.find("resources.json").await.unwrap().unwrap();
    assert_eq!(blob.pathname, "resources.json");

    let body = client.fetch_json(&blob.url).await.unwrap();
    assert_eq!(body["published"], json!(["a"]));

    let seen = state.1.lock().await;
    let stamp = seen.content_queries[0].get(CACHE_BUST_PARAM).unwrap();
    assert!(stamp.parse::<i64>().unwrap() > 0);
}

#[tokio::test]
async fn rejected_token_is_an_error() {
    let state = spawn_store().await;
    let err = client(&state, "wrong").list("resources.json").await.unwrap_err();
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn missing_content_is_an_error() {
    let state = spawn_store().await;
    let url = format!("http://{}/content/testimonials.json", state.0);
    assert!(client(&state, "secret").fetch_json(&url).await.is_err());
}

#[tokio::test]
async fn app_serves_documents_through_real_client() {
    let state = spawn_store().await;
    let mut cfg: Config = serde_yaml::from_str(config::example()).unwrap();
    cfg.blob.base_url = format!("http://{}/", state.0);
    cfg.blob.token = "secret".into();
    config::validate(&cfg).unwrap();

    let app = firm_content_api::app(&cfg).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = http
        .get(format!("http://{addr}/api/resources"))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    assert_eq!(
        res.headers().get("pragma").and_then(|h| h.to_str().ok()),
        Some("no-cache")
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([{ "id": "a", "published": true }]));

    // the stub store returns 404 for testimonials content
    let body: Value = http
        .get(format!("http://{addr}/api/testimonials"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!([]));
}
