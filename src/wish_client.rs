//! Client adapter for the Wish Service.
//!
//! [`WishBackend`] is the narrow interface the field resolvers depend on;
//! [`WishClient`] implements it over a tonic channel. The channel is created
//! once at startup and shared read-only by every request. Cloning it per call
//! is a cheap handle copy over the same HTTP/2 connection.

use crate::error::{Error, Result};
use crate::metrics::BackendTimer;
use crate::proto::wish_service_client::WishServiceClient;
use crate::proto::{GetWishRequest, ListWishRequest};
use crate::types::Wish;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

/// Default time allowed to establish the connection
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only access to wishes held by the backend.
///
/// Implementations issue exactly one backend call per method invocation and
/// never retry.
#[async_trait]
pub trait WishBackend: Send + Sync {
    /// All wishes, in backend order
    async fn list_wishes(&self) -> Result<Vec<Wish>>;

    /// A single wish, or `None` when the backend has no record for `id`
    async fn get_wish(&self, id: &str) -> Result<Option<Wish>>;

    /// Backend location, reported by the readiness check
    fn endpoint(&self) -> &str;
}

/// Backend handle shared across resolvers
pub type SharedWishBackend = Arc<dyn WishBackend>;

/// gRPC client for the Wish Service
#[derive(Clone, Debug)]
pub struct WishClient {
    endpoint: String,
    channel: Channel,
    timeout: Duration,
}

impl WishClient {
    /// Start building a client for the given endpoint URI
    pub fn builder(endpoint: impl Into<String>) -> WishClientBuilder {
        WishClientBuilder {
            endpoint: endpoint.into(),
            timeout: crate::config::DEFAULT_BACKEND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Deadline applied to each call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    /// Await a unary call, bounded by the local deadline.
    ///
    /// An elapsed deadline is reported as `DEADLINE_EXCEEDED`, whether it fired
    /// locally or the server cancelled the call on the propagated
    /// `grpc-timeout`.
    async fn call<T, F>(&self, method: &'static str, call: F) -> std::result::Result<T, tonic::Status>
    where
        F: Future<Output = std::result::Result<tonic::Response<T>, tonic::Status>>,
    {
        let started = Instant::now();
        let elapsed = || {
            tonic::Status::deadline_exceeded(format!(
                "{method} got no response within {:?}",
                self.timeout
            ))
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Err(status))
                if status.code() == tonic::Code::Cancelled && started.elapsed() >= self.timeout =>
            {
                Err(elapsed())
            }
            Ok(result) => result.map(tonic::Response::into_inner),
            Err(_) => Err(elapsed()),
        }
    }
}

fn record_failure(timer: &BackendTimer, err: Error) -> Error {
    timer.record_error(err.code());
    warn!(error = %err, "wish service call failed");
    err
}

#[async_trait]
impl WishBackend for WishClient {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_wishes(&self) -> Result<Vec<Wish>> {
        let timer = BackendTimer::new("ListWish");
        let mut client = WishServiceClient::new(self.channel.clone());

        let reply = self
            .call("ListWish", client.list_wish(self.request(ListWishRequest {})))
            .await
            .map_err(|status| record_failure(&timer, status.into()))?;

        let wishes = reply
            .wishes
            .into_iter()
            .map(Wish::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| record_failure(&timer, e))?;

        debug!(count = wishes.len(), "listed wishes");
        Ok(wishes)
    }

    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_wish(&self, id: &str) -> Result<Option<Wish>> {
        let timer = BackendTimer::new("GetWish");
        let mut client = WishServiceClient::new(self.channel.clone());
        let request = self.request(GetWishRequest { id: id.to_string() });

        match self.call("GetWish", client.get_wish(request)).await {
            Ok(message) => Wish::try_from(message)
                .map(Some)
                .map_err(|e| record_failure(&timer, e)),
            Err(status) if status.code() == tonic::Code::NotFound => {
                debug!("wish not found");
                Ok(None)
            }
            Err(status) => Err(record_failure(&timer, status.into())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Builder for [`WishClient`]
#[derive(Debug, Clone)]
pub struct WishClientBuilder {
    endpoint: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl WishClientBuilder {
    /// Deadline for each backend call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Time allowed to establish the connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn build_endpoint(&self) -> Result<Endpoint> {
        Ok(Endpoint::from_shared(self.endpoint.clone())?.connect_timeout(self.connect_timeout))
    }

    /// Connect eagerly, failing if the backend is unreachable right now
    pub async fn connect(self) -> Result<WishClient> {
        let channel = self.build_endpoint()?.connect().await?;
        Ok(self.finish(channel))
    }

    /// Create the channel without connecting; the first call connects
    pub fn connect_lazy(self) -> Result<WishClient> {
        let channel = self.build_endpoint()?.connect_lazy();
        Ok(self.finish(channel))
    }

    fn finish(self, channel: Channel) -> WishClient {
        WishClient {
            endpoint: self.endpoint,
            channel,
            timeout: self.timeout,
        }
    }
}
