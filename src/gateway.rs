//! Gateway builder and main orchestration

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::runtime::ServeMux;
use crate::schema::{DynamicSchema, SchemaBuilder, DEFAULT_QUERY_DEPTH_LIMIT};
use crate::shutdown::{os_signal_shutdown, run_with_graceful_shutdown, ShutdownConfig};
use crate::wish_client::{SharedWishBackend, WishClient};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Main Gateway struct - entry point for the library
///
/// The `Gateway` owns the GraphQL schema, the Wish Service backend handle and
/// the HTTP router. It is created via the [`GatewayBuilder`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use wish_graphql_gateway::{Gateway, GatewayConfig, WishClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GatewayConfig::from_env()?;
/// let client = WishClient::builder(config.wish_service_addr.clone())
///     .timeout(config.backend_timeout)
///     .connect_lazy()?;
///
/// Gateway::builder()
///     .with_config(config)
///     .with_backend(Arc::new(client))
///     .build()?
///     .serve()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Gateway {
    mux: ServeMux,
    schema: DynamicSchema,
    config: GatewayConfig,
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Get the ServeMux
    pub fn mux(&self) -> &ServeMux {
        &self.mux
    }

    /// Access the built GraphQL schema
    pub fn schema(&self) -> &DynamicSchema {
        &self.schema
    }

    /// Configuration the gateway was built with
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Convert gateway into Axum router
    pub fn into_router(self) -> Router {
        self.mux.into_router()
    }

    /// Bind `listen_addr` and serve until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(os_signal_shutdown()).await
    }

    /// Bind `listen_addr` and serve until `shutdown_signal` completes
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        self.serve_with_listener(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener until `shutdown_signal` completes
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown_config = ShutdownConfig {
            timeout: self.config.shutdown_timeout,
        };

        info!(
            addr = %listener.local_addr()?,
            environment = ?self.config.environment,
            wish_service = %self.config.wish_service_addr,
            graphiql = self.mux.graphiql_enabled(),
            "Gateway server listening"
        );

        run_with_graceful_shutdown(listener, self.into_router(), shutdown_signal, shutdown_config)
            .await
    }
}

/// Builder for creating a Gateway
pub struct GatewayBuilder {
    config: GatewayConfig,
    backend: Option<SharedWishBackend>,
    /// Maximum query depth
    query_depth_limit: Option<usize>,
    /// Enable health check endpoints
    health_checks_enabled: bool,
}

impl GatewayBuilder {
    /// Create a new gateway builder
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            backend: None,
            query_depth_limit: Some(DEFAULT_QUERY_DEPTH_LIMIT),
            health_checks_enabled: true,
        }
    }

    /// Use the given configuration
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Wish Service backend the resolvers call
    pub fn with_backend(mut self, backend: SharedWishBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Connect lazily to `config.wish_service_addr` with `config.backend_timeout`
    pub fn with_wish_service(self) -> Result<Self> {
        let client = WishClient::builder(self.config.wish_service_addr.clone())
            .timeout(self.config.backend_timeout)
            .connect_lazy()?;
        Ok(self.with_backend(Arc::new(client)))
    }

    /// Set the maximum selection depth; `None` removes the limit
    pub fn with_query_depth_limit(mut self, max_depth: Option<usize>) -> Self {
        self.query_depth_limit = max_depth;
        self
    }

    /// Do not mount the `/metrics` route
    pub fn disable_metrics(mut self) -> Self {
        self.config.metrics_enabled = false;
        self
    }

    /// Do not mount `/health` and `/ready`
    pub fn disable_health_checks(mut self) -> Self {
        self.health_checks_enabled = false;
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let backend = self
            .backend
            .ok_or_else(|| Error::Config("no Wish Service backend configured".to_string()))?;

        let schema = SchemaBuilder::new()
            .with_backend(backend.clone())
            .with_environment(self.config.environment)
            .with_query_depth_limit(self.query_depth_limit)
            .build()?;

        let mut mux = ServeMux::new(Arc::new(schema.clone()));
        if self.config.graphiql_enabled() {
            mux.enable_graphiql();
        }
        if self.health_checks_enabled {
            mux.enable_health_checks(backend);
        }
        if self.config.metrics_enabled {
            mux.enable_metrics();
        }

        Ok(Gateway {
            mux,
            schema,
            config: self.config,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
