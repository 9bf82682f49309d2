//! GraphQL gateway for the Wish Service.
//!
//! Configuration is read from the environment, see [`GatewayConfig::from_env`].

use anyhow::Result;
use tracing::info;
use wish_graphql_gateway::{Gateway, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = GatewayConfig::from_env()?;
    info!(
        environment = ?config.environment,
        wish_service = %config.wish_service_addr,
        timeout_ms = config.backend_timeout.as_millis() as u64,
        "starting wish gateway"
    );

    Gateway::builder()
        .with_config(config)
        .with_wish_service()?
        .build()?
        .serve()
        .await?;

    info!("wish gateway stopped");
    Ok(())
}
