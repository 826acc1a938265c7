//! News feeds. These never fail: a missing directory or feed yields an
//! empty success envelope.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{camel_case_keys, AppState};

const GENERAL_FEED: &str = "general";

#[derive(Debug, Serialize)]
pub(super) struct NewsEnvelope {
    status: &'static str,
    data: NewsData,
}

#[derive(Debug, Serialize)]
pub(super) struct NewsData {
    news: Vec<Value>,
}

fn feed(state: &AppState, key: &str) -> Json<NewsEnvelope> {
    let news = state
        .directory
        .as_deref()
        .and_then(|d| d.news.get(key))
        .map(|items| items.iter().cloned().map(camel_case_keys).collect())
        .unwrap_or_else(|| {
            tracing::debug!(feed = key, "news feed unavailable, returning empty list");
            Vec::new()
        });
    Json(NewsEnvelope {
        status: "success",
        data: NewsData { news },
    })
}

pub(super) async fn location_news(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<NewsEnvelope> {
    feed(&state, &slug)
}

pub(super) async fn general_news(State(state): State<AppState>) -> Json<NewsEnvelope> {
    feed(&state, GENERAL_FEED)
}
