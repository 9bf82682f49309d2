//! Error types for the Wish GraphQL gateway

use crate::config::Environment;
use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gateway
///
/// Backend failures surface as GraphQL field errors; envelope and engine
/// failures surface as HTTP status codes through [`IntoResponse`].
#[derive(Error, Debug)]
pub enum Error {
    /// The Wish Service could not be reached or the remote call failed
    #[error("Wish service unavailable: {0}")]
    BackendUnavailable(String),

    /// The Wish Service did not answer before the call deadline
    #[error("Wish service timed out: {0}")]
    BackendTimeout(String),

    /// The HTTP body is not a valid GraphQL request envelope
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// GraphQL schema errors
    #[error("GraphQL schema error: {0}")]
    Schema(String),

    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// gRPC transport errors (endpoint construction, eager connect)
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::DeadlineExceeded => Error::BackendTimeout(status.message().to_string()),
            code => Error::BackendUnavailable(format!("{code:?}: {}", status.message())),
        }
    }
}

impl Error {
    /// Stable machine-readable code, exposed as `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            Error::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Error::BackendTimeout(_) => "BACKEND_TIMEOUT",
            Error::MalformedRequest(_) => "MALFORMED_REQUEST",
            Error::Schema(_) => "SCHEMA_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// Message safe to show to clients in the given environment.
    ///
    /// # Security
    ///
    /// In production, backend and internal details are replaced by generic
    /// messages so that hostnames and stack details never leak.
    pub fn public_message(&self, environment: Environment) -> String {
        if !environment.is_production() {
            return self.to_string();
        }

        match self {
            Error::BackendUnavailable(_) => "Wish service unavailable".to_string(),
            Error::BackendTimeout(_) => "Wish service timed out".to_string(),
            Error::Transport(_) => "Service connection error".to_string(),
            Error::MalformedRequest(msg) => format!("Malformed request: {}", msg),
            Error::Schema(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Io(_)
            | Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Convert into a GraphQL field error carrying `extensions.code`
    pub fn to_graphql_error(&self, environment: Environment) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.public_message(environment))
            .extend_with(|_, extensions| extensions.set("code", code))
    }
}

/// JSON body returned for requests rejected before or outside GraphQL execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::MalformedRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => {
                tracing::error!(error = %self, "request failed outside field execution");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
