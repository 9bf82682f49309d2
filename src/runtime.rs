//! HTTP routing layer for the gateway.

use crate::error::{Error, Result};
use crate::health::{health_handler, readiness_handler, HealthState};
use crate::metrics::{GatewayMetrics, RequestTimer};
use crate::schema::QueryExecutor;
use crate::types::GraphQLRequest;
use crate::wish_client::SharedWishBackend;
use async_graphql::http::GraphiQLSource;
use async_graphql::Value;
use async_graphql_axum::GraphQLResponse;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// GraphQL endpoint path
pub const GRAPHQL_PATH: &str = "/graphql";

/// GraphiQL explorer path
pub const GRAPHIQL_PATH: &str = "/graphiql/";

/// Content type of `/graphql` responses
pub const GRAPHQL_CONTENT_TYPE: &str = "application/json";

/// Content type of the GraphiQL page
pub const GRAPHIQL_CONTENT_TYPE: &str = "text/html;charset=utf8";

/// ServeMux - main gateway handler
///
/// Decodes the HTTP envelope, hands the request to the [`QueryExecutor`] and
/// encodes the result. It can be converted into an Axum router.
#[derive(Clone)]
pub struct ServeMux {
    executor: Arc<dyn QueryExecutor>,
    /// Mount the GraphiQL explorer
    graphiql_enabled: bool,
    /// Backend reported by the readiness check
    backend: Option<SharedWishBackend>,
    /// Enable health check endpoints
    health_checks_enabled: bool,
    /// Enable metrics endpoint
    metrics_enabled: bool,
}

impl ServeMux {
    /// Create a new ServeMux around an executor
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            graphiql_enabled: false,
            backend: None,
            health_checks_enabled: false,
            metrics_enabled: false,
        }
    }

    /// Enable `/health` and `/ready`, reporting on the given backend
    pub fn enable_health_checks(&mut self, backend: SharedWishBackend) {
        self.backend = Some(backend);
        self.health_checks_enabled = true;
    }

    /// Enable metrics endpoint
    pub fn enable_metrics(&mut self) {
        self.metrics_enabled = true;
    }

    /// Mount the GraphiQL explorer at `/graphiql/`
    pub fn enable_graphiql(&mut self) {
        self.graphiql_enabled = true;
    }

    /// Whether `/graphiql/` is mounted
    pub fn graphiql_enabled(&self) -> bool {
        self.graphiql_enabled
    }

    /// Handle a GraphQL HTTP request body.
    ///
    /// `Err` means the request never reached field execution: a malformed
    /// envelope or an engine fault.
    pub async fn handle_http(&self, body: &[u8]) -> Result<async_graphql::Response> {
        let request = GraphQLRequest::from_slice(body).map_err(|e| {
            warn!(error = %e, "rejected GraphQL request envelope");
            e
        })?;
        debug!(operation = ?request.operation_name, "executing GraphQL request");

        let timer = RequestTimer::new("query");
        let response = self.executor.execute(request).await.map_err(|e| {
            timer.record_error(e.code());
            e
        })?;

        for err in &response.errors {
            let code = err
                .extensions
                .as_ref()
                .and_then(|extensions| match extensions.get("code") {
                    Some(Value::String(code)) => Some(code.as_str()),
                    _ => None,
                })
                .unwrap_or("GRAPHQL_ERROR");
            timer.record_error(code);
        }

        Ok(response)
    }

    /// Convert to Axum router
    pub fn into_router(self) -> Router {
        let graphiql_enabled = self.graphiql_enabled();
        let metrics_enabled = self.metrics_enabled;
        let health_backend = self.backend.clone().filter(|_| self.health_checks_enabled);

        let mut router = Router::new()
            .route(GRAPHQL_PATH, post(handle_graphql_post))
            .with_state(Arc::new(self));

        if graphiql_enabled {
            router = router.route(GRAPHIQL_PATH, get(graphiql).post(graphiql));
        }

        if let Some(backend) = health_backend {
            let health_state = Arc::new(HealthState::new(backend));
            router = router
                .route("/health", get(health_handler))
                .route("/ready", get(readiness_handler).with_state(health_state));
        }

        if metrics_enabled {
            router = router.route("/metrics", get(metrics_handler));
        }

        router
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
    }
}

/// Handler for POST requests to /graphql
async fn handle_graphql_post(State(mux): State<Arc<ServeMux>>, body: Bytes) -> Response {
    match mux.handle_http(&body).await {
        Ok(response) => {
            let mut response = GraphQLResponse::from(response).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(GRAPHQL_CONTENT_TYPE),
            );
            response
        }
        Err(err) => err.into_response(),
    }
}

/// Serve the GraphiQL explorer.
async fn graphiql() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, GRAPHIQL_CONTENT_TYPE)],
        GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish(),
    )
}

/// Handler for Prometheus metrics endpoint
async fn metrics_handler() -> impl IntoResponse {
    let body = GatewayMetrics::global().render();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = detail, "request handler panicked");
    Error::Internal(detail.to_string()).into_response()
}
