// Generic REST surface over every top-level entry of the data source.
//
// Bodies are raw JSON (arrays, records, documents); shaping into envelopes
// happens later in the response middleware. Misses answer `404 {}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::cmp::Ordering;

use crate::app::AppState;
use crate::database::record::{any_field_contains, field_equals};
use crate::database::DataSourceError;
use crate::error::ApiResult;

/// Query keys that never act as field-equality filters
const RESERVED_KEYS: &[&str] = &["page", "size", "_page", "_limit", "_sort", "_order", "q", "search"];

pub type QueryPairs = Vec<(String, String)>;

/// GET /:resource
pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Response> {
    list_resource(&state, &resource, &params)
}

/// GET /:resource/:id
pub async fn show(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    show_record(&state, &resource, &id)
}

/// POST /:resource
pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Response> {
    create_record(&state, &resource, payload)
}

/// PUT /:resource/:id
pub async fn replace(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Response> {
    replace_record(&state, &resource, &id, payload)
}

/// PATCH /:resource/:id
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Response> {
    update_record(&state, &resource, &id, payload)
}

/// DELETE /:resource/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    delete_record(&state, &resource, &id)
}

/// Fallback for anything the router does not know
pub async fn not_found() -> Response {
    empty_not_found()
}

pub fn list_resource(state: &AppState, resource: &str, params: &[(String, String)]) -> ApiResult<Response> {
    let document = match state.store.document(resource)? {
        Some(document) => document,
        None => return Ok(empty_not_found()),
    };

    // Singular documents are served as-is
    if !document.is_array() {
        return Ok(Json(document).into_response());
    }

    let filters: Vec<&(String, String)> = params
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .collect();
    let needle = first(params, "q")
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut records = state.store.filter_by(resource, &|record: &Value| {
        filters.iter().all(|(key, value)| field_equals(record, key, value))
            && needle.as_deref().map_or(true, |q| any_field_contains(record, q))
    })?;

    if let Some(field) = first(params, "_sort").filter(|f| !f.is_empty()) {
        let descending = first(params, "_order").is_some_and(|o| o.eq_ignore_ascii_case("desc"));
        records.sort_by(|a, b| {
            let ordering = compare_values(a.get(field), b.get(field));
            if descending { ordering.reverse() } else { ordering }
        });
    }

    tracing::debug!("Listing {} records from '{}'", records.len(), resource);
    Ok(Json(Value::Array(records)).into_response())
}

pub fn show_record(state: &AppState, resource: &str, id: &str) -> ApiResult<Response> {
    match state.store.get_by_id(resource, id) {
        Ok(Some(record)) => Ok(Json(record).into_response()),
        Ok(None) => Ok(empty_not_found()),
        Err(DataSourceError::UnknownResource(_)) | Err(DataSourceError::NotACollection(_)) => {
            Ok(empty_not_found())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn create_record(state: &AppState, resource: &str, payload: Value) -> ApiResult<Response> {
    let created = state.store.insert(resource, payload)?;
    tracing::info!("Created record {} in '{}'", created["id"], resource);
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub fn replace_record(state: &AppState, resource: &str, id: &str, payload: Value) -> ApiResult<Response> {
    match state.store.replace(resource, id, payload)? {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok(empty_not_found()),
    }
}

pub fn update_record(state: &AppState, resource: &str, id: &str, payload: Value) -> ApiResult<Response> {
    match state.store.merge(resource, id, payload)? {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok(empty_not_found()),
    }
}

pub fn delete_record(state: &AppState, resource: &str, id: &str) -> ApiResult<Response> {
    match state.store.remove(resource, id)? {
        Some(_) => {
            tracing::info!("Deleted record {} from '{}'", id, resource);
            Ok(Json(json!({})).into_response())
        }
        None => Ok(empty_not_found()),
    }
}

fn empty_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

pub fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Numbers numerically, strings lexically, missing values last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
