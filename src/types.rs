//! Type definitions for the Wish GraphQL gateway

use crate::error::{Error, Result};
use crate::proto::WishMessage;
use serde::{Deserialize, Serialize};

/// GraphQL request envelope posted by clients to `/graphql`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    /// GraphQL document
    pub query: String,

    /// Operation name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// Variables for the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GraphQLRequest {
    /// Create a request for a document without variables
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: None,
        }
    }

    /// Attach variables
    pub fn with_variables(mut self, variables: serde_json::Map<String, serde_json::Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Attach an operation name
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Decode an HTTP body into a request envelope.
    ///
    /// Invalid JSON, a missing `query`, or a non-object `variables` field are
    /// all reported as [`Error::MalformedRequest`].
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::MalformedRequest(e.to_string()))
    }

    /// Convert into the execution engine's request type
    pub fn into_engine_request(self) -> async_graphql::Request {
        let mut request = async_graphql::Request::new(self.query);
        if let Some(variables) = self.variables {
            request = request.variables(async_graphql::Variables::from_json(
                serde_json::Value::Object(variables),
            ));
        }
        if let Some(operation_name) = self.operation_name {
            request = request.operation_name(operation_name);
        }
        request
    }
}

/// A wish as returned by the Wish Service.
///
/// Lives only for one request: created from a wire message by the backend
/// client, projected by the field resolvers, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    /// Backend-assigned identifier, exposed as GraphQL `ID`
    pub id: String,

    /// Free text, possibly empty
    pub description: String,
}

impl TryFrom<WishMessage> for Wish {
    type Error = Error;

    fn try_from(message: WishMessage) -> Result<Self> {
        if message.id.is_empty() {
            return Err(Error::BackendUnavailable(
                "invalid record: wish without id".to_string(),
            ));
        }

        Ok(Self {
            id: message.id,
            description: message.description,
        })
    }
}
