use axum::{
    http::HeaderValue,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::DataSource;
use crate::error::ApiError;
use crate::handlers::{health, resource, users};
use crate::middleware::{response_envelope_middleware, EnvelopeRules};

/// Shared handler state; the data source is injected once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataSource>,
    /// Resource served by the override layer (e.g. "users")
    pub resource: String,
}

impl AppState {
    pub fn new(store: Arc<dyn DataSource>, resource: impl Into<String>) -> Self {
        Self {
            store,
            resource: resource.into(),
        }
    }
}

/// Build the full application: routes, envelope stage, panic guard, CORS and tracing
pub fn app(store: Arc<dyn DataSource>, config: &AppConfig) -> Router {
    let state = AppState::new(store, config.routes.resource.clone());
    let rules = Arc::new(EnvelopeRules::from_config(config));

    let mut router = Router::new()
        .route(&config.routes.health_path, get(health::get))
        .merge(override_routes("", &config.routes.resource))
        .merge(resource_routes(""));

    let prefix = &config.routes.alias_prefix;
    if !prefix.is_empty() {
        router = router
            .merge(override_routes(prefix, &config.routes.resource))
            .merge(resource_routes(prefix));
    }

    let mut router = router
        .fallback(resource::not_found)
        .with_state(state)
        // Global middleware
        .layer(middleware::from_fn_with_state(rules, response_envelope_middleware))
        .layer(CatchPanicLayer::custom(handle_panic));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Dashboard endpoints: <prefix>/<resource>[/mitra-list|/roles|/:id]
fn override_routes(prefix: &str, resource: &str) -> Router<AppState> {
    let base = format!("{}/{}", prefix, resource);

    Router::new()
        .route(&base, get(users::list).post(users::create))
        .route(&format!("{}/mitra-list", base), get(users::mitra_list))
        .route(&format!("{}/roles", base), get(users::roles))
        .route(
            &format!("{}/:id", base),
            get(users::show)
                .put(users::replace)
                .patch(users::update)
                .delete(users::delete),
        )
}

/// Generic surface over every resource, mounted at `prefix`
fn resource_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/:resource", prefix),
            get(resource::list).post(resource::create),
        )
        .route(
            &format!("{}/:resource/:id", prefix),
            get(resource::show)
                .put(resource::replace)
                .patch(resource::update)
                .delete(resource::delete),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

/// Panics anywhere downstream become a generic 500 envelope
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!("Request handler panicked: {}", detail);
    ApiError::internal_server_error("Internal Server Error").into_response()
}
