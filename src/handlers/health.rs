// handlers/health.rs - GET /health handler

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiResult;

pub const HEALTH_DOCUMENT: &str = "health";

/// Serves the `health` document from the data source, or a built-in status
/// when the document does not define one. The middleware adds the envelope.
pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let payload = state
        .store
        .document(HEALTH_DOCUMENT)?
        .unwrap_or_else(|| json!({ "status": "ok" }));
    Ok(Json(payload))
}
