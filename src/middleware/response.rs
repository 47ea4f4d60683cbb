use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;

use crate::api::{paginate, Envelope, PageParams};
use crate::config::AppConfig;
use crate::database::record::has_present_id;
use crate::error::ApiError;

/// Response extension that tells the envelope stage to leave a response alone
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeBypass;

/// What the envelope stage needs to know about the originating request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub query: String,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: query.into(),
        }
    }

    pub fn from_request(request: &Request) -> Self {
        let uri = request.uri();
        Self::new(
            request.method().clone(),
            uri.path(),
            uri.query().unwrap_or_default(),
        )
    }
}

/// How a request path relates to the enveloped resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `/<resource>` or `<prefix>/<resource>`
    Collection,
    /// `<resource>/<sub>` for a declared sub-resource such as `roles`
    SubResource,
    /// `<resource>/<id>`
    Record,
    Other,
}

/// Classification rules for the envelope stage, built once from config
#[derive(Debug, Clone)]
pub struct EnvelopeRules {
    /// Bare and alias-prefixed collection paths, e.g. `/users`
    bases: Vec<String>,
    sub_resources: Vec<String>,
    health_path: String,
    default_page_size: i64,
    max_body_bytes: usize,
}

pub const SUB_RESOURCES: &[&str] = &["mitra-list", "roles"];

impl EnvelopeRules {
    pub fn new(resource: &str, alias_prefix: &str, health_path: &str) -> Self {
        let resource = resource.trim_matches('/');
        let mut bases = vec![format!("/{}", resource)];
        if !alias_prefix.is_empty() {
            bases.push(format!("{}/{}", alias_prefix.trim_end_matches('/'), resource));
        }

        Self {
            bases,
            sub_resources: SUB_RESOURCES.iter().map(|s| s.to_string()).collect(),
            health_path: normalize(health_path).to_string(),
            default_page_size: 10,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut rules = Self::new(
            &config.routes.resource,
            &config.routes.alias_prefix,
            &config.routes.health_path,
        );
        rules.default_page_size = config.pagination.default_page_size.max(1);
        rules.max_body_bytes = config.api.max_body_bytes;
        rules
    }

    pub fn with_default_page_size(mut self, size: i64) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Whether any rule could apply to this request, judged before the body
    /// is read. Health matches any method; the resource rules need GET.
    pub fn may_shape(&self, request: &RequestDescriptor) -> bool {
        self.is_health(&request.path)
            || (request.method == Method::GET && self.classify(&request.path) != PathKind::Other)
    }

    pub fn classify(&self, path: &str) -> PathKind {
        let path = normalize(path);
        for base in &self.bases {
            if path == base {
                return PathKind::Collection;
            }
            let Some(rest) = path.strip_prefix(base.as_str()).and_then(|r| r.strip_prefix('/')) else {
                continue;
            };
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            if self.sub_resources.iter().any(|sub| sub == rest) {
                return PathKind::SubResource;
            }
            return PathKind::Record;
        }
        PathKind::Other
    }

    fn is_health(&self, path: &str) -> bool {
        normalize(path) == self.health_path
    }

    /// Decide the replacement body for a parsed response, or `None` to send
    /// the original bytes untouched.
    ///
    /// Rules, first match wins: paginated collection (GET, array body),
    /// sub-resource (GET, any body), single record (GET, object with a
    /// present `id`), health path (any method, any body).
    pub fn shape(&self, request: &RequestDescriptor, body: Value) -> Option<Envelope> {
        let is_get = request.method == Method::GET;

        match (self.classify(&request.path), body) {
            (PathKind::Collection, Value::Array(items)) if is_get => {
                let params = PageParams::from_query(&request.query, self.default_page_size);
                tracing::debug!(
                    "Paginating {} items for {} ({:?} page={} size={})",
                    items.len(),
                    request.path,
                    params.dialect,
                    params.page,
                    params.per_page
                );
                Some(Envelope::collection(paginate(items, params)))
            }
            (PathKind::SubResource, body) if is_get => Some(Envelope::record(body)),
            (PathKind::Record, body) if is_get && body.is_object() && has_present_id(&body) => {
                Some(Envelope::record(body))
            }
            (_, body) if self.is_health(&request.path) => Some(Envelope::health(body)),
            _ => None,
        }
    }
}

/// A missing content type still gets a parse attempt
fn is_json_or_untyped(headers: &HeaderMap) -> bool {
    match headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(content_type) => content_type.to_ascii_lowercase().contains("json"),
        None => !headers.contains_key(header::CONTENT_TYPE),
    }
}

/// Known body size (header or size hint) above the cap
fn exceeds(response: &Response, max: usize) -> bool {
    let max = u64::try_from(max).unwrap_or(u64::MAX);
    let declared = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    declared.is_some_and(|len| len > max) || response.body().size_hint().lower() > max
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Middleware that rewrites outgoing JSON bodies into the response envelope.
///
/// Only bodies that can actually be enveloped are buffered. Unmatched
/// requests, non-JSON content types and bodies known to exceed the buffer cap
/// are streamed back untouched. Responses marked with [`EnvelopeBypass`] skip
/// the stage entirely.
pub async fn response_envelope_middleware(
    State(rules): State<Arc<EnvelopeRules>>,
    request: Request,
    next: Next,
) -> Response {
    let descriptor = RequestDescriptor::from_request(&request);
    let response = next.run(request).await;

    if response.extensions().get::<EnvelopeBypass>().is_some() || !rules.may_shape(&descriptor) {
        return response;
    }
    if !is_json_or_untyped(response.headers()) {
        tracing::trace!("Non-JSON content type for {}, passing through", descriptor.path);
        return response;
    }
    if exceeds(&response, rules.max_body_bytes) {
        tracing::warn!(
            "Response for {} exceeds {} bytes, skipping envelope",
            descriptor.path,
            rules.max_body_bytes
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, rules.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to buffer response body for {}: {}", descriptor.path, e);
            return ApiError::internal_server_error("Internal Server Error").into_response();
        }
    };

    let parsed: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => {
            tracing::trace!("Non-JSON body for {}, passing through", descriptor.path);
            return Response::from_parts(parts, Body::from(bytes));
        }
    };

    let Some(envelope) = rules.shape(&descriptor, parsed) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    match serde_json::to_vec(&envelope) {
        Ok(encoded) => {
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(encoded))
        }
        Err(e) => {
            tracing::error!("Failed to serialize envelope for {}: {}", descriptor.path, e);
            ApiError::internal_server_error("Internal Server Error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_users;
    use serde_json::json;

    fn rules() -> EnvelopeRules {
        EnvelopeRules::new("users", "/backoffice/api/v1", "/health")
    }

    fn get(path: &str, query: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, path, query)
    }

    #[test]
    fn classifies_bare_and_prefixed_paths() {
        let rules = rules();
        assert_eq!(rules.classify("/users"), PathKind::Collection);
        assert_eq!(rules.classify("/users/"), PathKind::Collection);
        assert_eq!(rules.classify("/backoffice/api/v1/users"), PathKind::Collection);
        assert_eq!(rules.classify("/users/7"), PathKind::Record);
        assert_eq!(rules.classify("/backoffice/api/v1/users/abc"), PathKind::Record);
        assert_eq!(rules.classify("/backoffice/api/v1/users/roles"), PathKind::SubResource);
        assert_eq!(rules.classify("/users/mitra-list"), PathKind::SubResource);
    }

    #[test]
    fn ignores_lookalike_paths() {
        let rules = rules();
        assert_eq!(rules.classify("/usersx"), PathKind::Other);
        assert_eq!(rules.classify("/users/7/posts"), PathKind::Other);
        assert_eq!(rules.classify("/posts/users"), PathKind::Other);
        assert_eq!(rules.classify("/api/v1/users"), PathKind::Other);
        assert_eq!(rules.classify("/"), PathKind::Other);
    }

    #[test]
    fn collection_is_paginated_with_offset_dialect() {
        let env = rules()
            .shape(&get("/users", "page=0&size=10"), Value::Array(sample_users(25)))
            .unwrap();
        assert_eq!(env.data.unwrap().as_array().unwrap().len(), 10);
        let meta = env.meta.unwrap();
        assert_eq!((meta.page, meta.size, meta.total_items, meta.total_pages), (0, 10, 25, 3));
    }

    #[test]
    fn collection_is_paginated_with_legacy_dialect() {
        let env = rules()
            .shape(&get("/backoffice/api/v1/users", "_page=3&_limit=10"), Value::Array(sample_users(25)))
            .unwrap();
        let data = env.data.unwrap();
        let ids: Vec<&str> = data.as_array().unwrap().iter().map(|u| u["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["21", "22", "23", "24", "25"]);
        let meta = env.meta.unwrap();
        assert_eq!((meta.page, meta.size, meta.total_pages), (2, 10, 3));
    }

    #[test]
    fn configured_default_size_applies() {
        let rules = rules().with_default_page_size(5);
        let env = rules.shape(&get("/users", ""), Value::Array(sample_users(12))).unwrap();
        assert_eq!(env.meta.unwrap().total_pages, 3);
    }

    #[test]
    fn non_get_collection_passes_through() {
        let req = RequestDescriptor::new(Method::POST, "/users", "");
        assert!(rules().shape(&req, json!([{"id": "1"}])).is_none());
    }

    #[test]
    fn collection_path_with_object_body_passes_through() {
        assert!(rules().shape(&get("/users", ""), json!({"id": "1"})).is_none());
    }

    #[test]
    fn single_record_is_wrapped_without_meta() {
        let env = rules().shape(&get("/users/1", ""), json!({"id": "1", "full_name": "Ayu"})).unwrap();
        assert_eq!(env.code, "200");
        assert_eq!(env.message, "Success");
        assert!(env.meta.is_none());
        assert_eq!(env.data.unwrap()["full_name"], "Ayu");
    }

    #[test]
    fn record_without_present_id_passes_through() {
        let rules = rules();
        assert!(rules.shape(&get("/users/1", ""), json!({})).is_none());
        assert!(rules.shape(&get("/users/1", ""), json!({"id": ""})).is_none());
        assert!(rules.shape(&get("/users/1", ""), json!([{"id": "1"}])).is_none());
    }

    #[test]
    fn sub_resources_are_wrapped_whatever_their_shape() {
        let rules = rules();
        let roles = rules
            .shape(&get("/backoffice/api/v1/users/roles", "page=3"), json!([{"id": "r1"}]))
            .unwrap();
        assert!(roles.meta.is_none());
        assert_eq!(roles.data.unwrap(), json!([{"id": "r1"}]));

        let mitra = rules
            .shape(&get("/backoffice/api/v1/users/mitra-list", ""), json!({"content": []}))
            .unwrap();
        assert_eq!(mitra.message, "Success");
    }

    #[test]
    fn health_wraps_any_body_for_any_method() {
        let rules = rules();
        let env = rules.shape(&get("/health", ""), json!("up")).unwrap();
        assert_eq!(env.message, "OK");
        assert_eq!(env.data.unwrap(), json!("up"));

        let post = RequestDescriptor::new(Method::POST, "/health", "");
        assert!(rules.shape(&post, json!({"status": "ok"})).is_some());
    }

    #[test]
    fn may_shape_is_decided_from_the_request_alone() {
        let rules = rules();
        assert!(rules.may_shape(&get("/users", "")));
        assert!(rules.may_shape(&get("/backoffice/api/v1/users/roles", "")));
        assert!(rules.may_shape(&RequestDescriptor::new(Method::DELETE, "/health", "")));
        assert!(!rules.may_shape(&RequestDescriptor::new(Method::POST, "/users", "")));
        assert!(!rules.may_shape(&get("/posts", "")));
        assert!(!rules.may_shape(&get("/file", "")));
    }

    #[test]
    fn content_type_gate() {
        let mut headers = HeaderMap::new();
        assert!(is_json_or_untyped(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json_or_untyped(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_or_untyped(&headers));
    }

    #[test]
    fn exceeds_uses_the_known_body_size() {
        let response = Response::new(Body::from(vec![b'x'; 64]));
        assert!(exceeds(&response, 63));
        assert!(!exceeds(&response, 64));
    }

    #[test]
    fn unrelated_paths_pass_through() {
        assert!(rules().shape(&get("/posts", ""), json!([1, 2, 3])).is_none());
    }

    #[test]
    fn empty_alias_prefix_only_matches_bare_paths() {
        let rules = EnvelopeRules::new("users", "", "/health");
        assert_eq!(rules.classify("/users"), PathKind::Collection);
        assert_eq!(rules.classify("/backoffice/api/v1/users"), PathKind::Other);
    }
}
