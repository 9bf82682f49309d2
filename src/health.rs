//! Liveness and readiness checks.
//!
//! - `/health` returns 200 while the process is running
//! - `/ready` returns 200 once the Wish Service backend is configured
//!
//! Neither check calls the backend, so orchestrator polling never adds load to
//! the Wish Service.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::wish_client::SharedWishBackend;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Individual component checks
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub checks: Vec<ComponentHealth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of checking one dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            checks: Vec::new(),
        }
    }

    pub fn healthy_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::healthy()
        }
    }

    /// Add a component check; any unhealthy component makes the response unhealthy
    pub fn with_check(mut self, check: ComponentHealth) -> Self {
        if check.status == HealthStatus::Unhealthy {
            self.status = HealthStatus::Unhealthy;
        }
        self.checks.push(check);
        self
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status_code, Json(self)).into_response()
    }
}

/// Shared state for the readiness check
#[derive(Clone)]
pub struct HealthState {
    pub backend: SharedWishBackend,
}

impl HealthState {
    pub fn new(backend: SharedWishBackend) -> Self {
        Self { backend }
    }
}

/// `GET /health`
pub async fn health_handler() -> HealthResponse {
    HealthResponse::healthy_with_message("Gateway is running")
}

/// `GET /ready`
pub async fn readiness_handler(State(state): State<Arc<HealthState>>) -> HealthResponse {
    let endpoint = state.backend.endpoint();
    let check = if endpoint.is_empty() {
        ComponentHealth {
            name: "wish_service".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("No Wish Service endpoint configured".to_string()),
        }
    } else {
        ComponentHealth {
            name: "wish_service".to_string(),
            status: HealthStatus::Healthy,
            message: Some(endpoint.to_string()),
        }
    };

    HealthResponse::healthy().with_check(check)
}
