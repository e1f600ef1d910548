//! Listing crawl and fetch seeding endpoints.
//!
//! - `GET /?start=N&end=M` crawls listing pages `N..M` and records links
//! - `POST /` enqueues a fetch for every recorded link

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::server::app::AppState;

/// Crawl a range of listing pages.
///
/// Returns `{"{page}-{n}": "article/path"}` for every link found.
pub async fn crawl_listing_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<BTreeMap<String, String>>, StatusCode> {
    let start = page_param(&params, "start")?;
    let end = page_param(&params, "end")?;

    // Detached from the request so a dropped client still terminates the
    // listing browser.
    let seeder = state.deps.seeder.clone();
    let crawl = tokio::spawn(async move { seeder.crawl_listing(start, end).await });

    let found = crawl
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result)
        .map_err(|e| {
            error!(start, end, error = %format!("{:#}", e), "listing crawl failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(found))
}

/// Enqueue a fetch for every recorded link.
///
/// Returns `{"<url>": ""}` for every link enqueued.
pub async fn seed_fetches_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BTreeMap<String, String>>, StatusCode> {
    let keys = state.deps.seeder.seed_fetches().await.map_err(|e| {
        error!(error = %format!("{:#}", e), "fetch seeding failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(keys.into_iter().map(|k| (k, String::new())).collect()))
}

/// Required integer query parameter; absent or unparsable is a 400.
fn page_param(params: &HashMap<String, String>, name: &str) -> Result<i64, StatusCode> {
    let raw = params
        .get(name)
        .filter(|v| !v.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    raw.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)
}
