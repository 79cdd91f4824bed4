use super::error::ApiError;
use super::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// Axum middleware: require the shared API key, taken from the `x-api-key`
/// header or, failing that, the `api_key` query parameter.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = presented_key(&request).unwrap_or_default();

    // Constant-time comparison to avoid timing side-channels
    let ok: bool = provided.as_bytes().ct_eq(state.api_key.as_bytes()).into();
    if ok {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::InvalidApiKey)
    }
}

fn presented_key(request: &Request) -> Option<String> {
    if let Some(header) = request.headers().get(API_KEY_HEADER) {
        return header.to_str().ok().map(str::to_string);
    }

    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == API_KEY_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}
