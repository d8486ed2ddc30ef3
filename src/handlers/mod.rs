//! HTTP request handlers for the itemetrics API

use crate::config::Config;
use crate::error::AppResult;
use crate::metrics::{HttpMetrics, MetricRegistry};
use crate::middleware::{metrics::track_metrics, request_id::request_id_middleware};
use crate::store::ItemStore;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod extractor;
pub mod items;
pub mod metrics;
pub mod root;

/// Application state shared across all handlers
///
/// Contains configuration, the item store and request metrics.
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<ItemStore>,
    metrics: HttpMetrics,
}

impl AppState {
    /// Create a new AppState with a fresh metric registry
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        Self::with_registry(config, Arc::new(MetricRegistry::new()))
    }

    /// Create a new AppState recording into an existing registry
    pub fn with_registry(config: Arc<Config>, registry: Arc<MetricRegistry>) -> AppResult<Self> {
        let metrics = HttpMetrics::new(registry)?;
        Ok(Self {
            config,
            store: Arc::new(ItemStore::new()),
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the item store
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Get reference to the request metrics
    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(root::handler))
        .route("/items", post(items::create))
        .route(
            "/items/{id}",
            get(items::read).put(items::update).delete(items::delete),
        )
        .route("/metrics", get(metrics::handler));

    instrument(routes, state)
}

/// Wrap routes in the middleware stack and attach state
///
/// Layer order, outermost first: trace, request id, request metrics, panic
/// catcher. The panic catcher sits inside the metrics layer so a panicking
/// handler is recorded as a 500.
pub fn instrument(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state.clone(), track_metrics))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
