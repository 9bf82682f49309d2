//! # wish-graphql-gateway
//!
//! A GraphQL-over-HTTP gateway in front of the gRPC Wish Service.
//!
//! ```graphql
//! type Wish { id: ID!, description: String }
//! type Query { allWish: [Wish!]!, wish(id: ID!): Wish }
//! ```
//!
//! ## Main Components
//!
//! - [`Gateway`]: Builds the schema and router, and runs the HTTP server.
//! - [`GatewayBuilder`]: Configuration builder for the gateway.
//! - [`SchemaBuilder`]: Wires the resolver table into an `async-graphql` schema.
//! - [`WishClient`]: tonic client for the Wish Service, behind [`WishBackend`].
//!
//! ## Error mapping
//!
//! A wish the backend does not know resolves to `null` without an error. An
//! unreachable or slow backend becomes a GraphQL error with
//! `extensions.code` set to `BACKEND_UNAVAILABLE` or `BACKEND_TIMEOUT`, and
//! the HTTP status stays 200. A malformed request body is rejected with 400.

/// Generated bindings for `appwish.wish`.
#[allow(clippy::all)]
pub mod proto {
    tonic::include_proto!("appwish.wish");
}

pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod metrics;
pub mod resolvers;
pub mod runtime;
pub mod schema;
pub mod shutdown;
pub mod types;
pub mod wish_client;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Environment, GatewayConfig};
pub use error::{Error, ErrorBody, Result};
pub use gateway::{Gateway, GatewayBuilder};
pub use health::{ComponentHealth, HealthResponse, HealthState, HealthStatus};
pub use metrics::{BackendTimer, GatewayMetrics, RequestTimer};
pub use runtime::ServeMux;
pub use schema::{DynamicSchema, QueryExecutor, ResolverMap, SchemaBuilder};
pub use shutdown::{os_signal_shutdown, run_with_graceful_shutdown, ShutdownConfig};
pub use types::{GraphQLRequest, Wish};
pub use wish_client::{SharedWishBackend, WishBackend, WishClient, WishClientBuilder};
