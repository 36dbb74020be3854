use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::ApiState;

/// GET /api/buildings: the whole cached collection as a JSON array.
pub async fn list_buildings(State(state): State<Arc<ApiState>>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], state.body()).into_response()
}
