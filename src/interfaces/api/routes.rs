use super::error::ApiError;
use super::state::AppState;
use crate::domain::repositories::{PageRequest, SnapshotPage};
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

/// Raw pagination parameters. Kept as strings so that garbage falls back to
/// the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct CoinsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl CoinsQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(parse_number(&self.page), parse_number(&self.limit))
    }
}

fn parse_number(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

pub async fn list_coins(
    State(state): State<AppState>,
    Query(query): Query<CoinsQuery>,
) -> Result<Json<SnapshotPage>, ApiError> {
    let page = state
        .store
        .query(query.to_page_request())
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(page))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
