// Explicit dashboard endpoints under <alias-prefix>/<resource>.
//
// These read the data source directly and leave envelope shaping and
// pagination to the response middleware; only the not-found case answers
// with its own envelope.

use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::record::field_contains;
use crate::error::{ApiError, ApiResult};

use super::resource::{self, first, QueryPairs};

/// Text fields the `search` filter looks at
pub const SEARCH_FIELDS: &[&str] = &["full_name", "email"];

pub const MITRA_LIST_DOCUMENT: &str = "mitra_list";
pub const ROLES_DOCUMENT: &str = "roles";

/// GET <prefix>/users?type=&search=
pub async fn list(State(state): State<AppState>, Query(params): Query<QueryPairs>) -> ApiResult<Json<Value>> {
    let user_type = first(&params, "type").filter(|t| !t.is_empty());
    let search = first(&params, "search")
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let users = state.store.filter_by(&state.resource, &|user: &Value| {
        let type_matches = user_type.map_or(true, |t| user.get("type").and_then(Value::as_str) == Some(t));
        let search_matches = search.as_deref().map_or(true, |needle| {
            SEARCH_FIELDS.iter().any(|field| field_contains(user, field, needle))
        });
        type_matches && search_matches
    })?;

    tracing::debug!(
        "Override list for '{}': {} matches (type={:?}, search={:?})",
        state.resource,
        users.len(),
        user_type,
        search
    );
    Ok(Json(Value::Array(users)))
}

/// GET <prefix>/users/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    state
        .store
        .get_by_id(&state.resource, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET <prefix>/users/mitra-list
pub async fn mitra_list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    document(&state, MITRA_LIST_DOCUMENT, "Mitra list not found")
}

/// GET <prefix>/users/roles
pub async fn roles(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    document(&state, ROLES_DOCUMENT, "Roles not found")
}

fn document(state: &AppState, name: &str, missing: &str) -> ApiResult<Json<Value>> {
    state
        .store
        .document(name)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(missing))
}

// Writes on the override paths fall through to the generic resource handlers

/// POST <prefix>/users
pub async fn create(State(state): State<AppState>, Json(payload): Json<Value>) -> ApiResult<Response> {
    resource::create_record(&state, &state.resource, payload)
}

/// PUT <prefix>/users/:id
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Response> {
    resource::replace_record(&state, &state.resource, &id, payload)
}

/// PATCH <prefix>/users/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Response> {
    resource::update_record(&state, &state.resource, &id, payload)
}

/// DELETE <prefix>/users/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    resource::delete_record(&state, &state.resource, &id)
}
