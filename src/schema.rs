//! GraphQL schema wiring for the Wish API.
//!
//! The logical schema is
//!
//! ```graphql
//! type Wish { id: ID!, description: String }
//! type Query { allWish: [Wish!]!, wish(id: ID!): Wish }
//! ```
//!
//! Each declared field is bound to a resolver through an explicit
//! [`ResolverMap`] keyed by `(type name, field name)`. The map is built once at
//! startup and the schema refuses to build if any declared field is unbound.
//! Parsing, validation and execution belong to `async-graphql`; this module
//! only configures it.

use crate::config::Environment;
use crate::error::{Error, Result};
use crate::resolvers::{self, ResolverFn};
use crate::types::GraphQLRequest;
use crate::wish_client::SharedWishBackend;
use async_graphql::dynamic::{Field, InputValue, Object, Schema, TypeRef};
use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextParseQuery, NextResolve, ResolveInfo,
};
use async_graphql::parser::types::{DocumentOperations, ExecutableDocument};
use async_graphql::{PathSegment, QueryPathNode, QueryPathSegment, ServerResult, Value, Variables};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// The executable schema
pub type DynamicSchema = Schema;

/// Root query type name
pub const QUERY_TYPE: &str = "Query";

/// Wish object type name
pub const WISH_TYPE: &str = "Wish";

/// Default maximum selection depth
pub const DEFAULT_QUERY_DEPTH_LIMIT: usize = 16;

/// Immutable mapping from `(type name, field name)` to resolver
#[derive(Clone, Default)]
pub struct ResolverMap {
    bindings: HashMap<(String, String), ResolverFn>,
}

impl ResolverMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolvers for every field of the Wish API
    pub fn wish_api() -> Self {
        Self::new()
            .bind(QUERY_TYPE, "allWish", resolvers::all_wish)
            .bind(QUERY_TYPE, "wish", resolvers::wish)
            .bind(WISH_TYPE, "id", resolvers::wish_id)
            .bind(WISH_TYPE, "description", resolvers::wish_description)
    }

    /// Bind a resolver, replacing any previous binding for the same field
    pub fn bind(mut self, type_name: &str, field_name: &str, resolver: ResolverFn) -> Self {
        self.bindings
            .insert((type_name.to_string(), field_name.to_string()), resolver);
        self
    }

    /// Look up the resolver bound to a field
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<ResolverFn> {
        self.bindings
            .get(&(type_name.to_string(), field_name.to_string()))
            .copied()
    }

    /// Number of bound fields
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no field is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn field(&self, type_name: &str, field_name: &str, ty: TypeRef) -> Result<Field> {
        let resolver = self.get(type_name, field_name).ok_or_else(|| {
            Error::Schema(format!("no resolver bound for {type_name}.{field_name}"))
        })?;
        Ok(Field::new(field_name, ty, resolver))
    }
}

/// Builder for the Wish API schema
pub struct SchemaBuilder {
    resolvers: ResolverMap,
    backend: Option<SharedWishBackend>,
    environment: Environment,
    query_depth_limit: Option<usize>,
}

impl SchemaBuilder {
    /// Create a builder with the standard resolver bindings
    pub fn new() -> Self {
        Self {
            resolvers: ResolverMap::wish_api(),
            backend: None,
            environment: Environment::Development,
            query_depth_limit: Some(DEFAULT_QUERY_DEPTH_LIMIT),
        }
    }

    /// Replace the resolver bindings
    pub fn with_resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Backend the root resolvers call
    pub fn with_backend(mut self, backend: SharedWishBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Environment; production disables introspection and sanitizes errors
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Maximum selection depth; `None` removes the limit
    pub fn with_query_depth_limit(mut self, max_depth: Option<usize>) -> Self {
        self.query_depth_limit = max_depth;
        self
    }

    /// Build the executable schema
    pub fn build(self) -> Result<DynamicSchema> {
        let backend = self
            .backend
            .ok_or_else(|| Error::Schema("no Wish Service backend configured".to_string()))?;
        let resolvers = &self.resolvers;

        let wish = Object::new(WISH_TYPE)
            .field(resolvers.field(WISH_TYPE, "id", TypeRef::named_nn(TypeRef::ID))?)
            .field(resolvers.field(WISH_TYPE, "description", TypeRef::named(TypeRef::STRING))?);

        let query = Object::new(QUERY_TYPE)
            .field(resolvers.field(QUERY_TYPE, "allWish", TypeRef::named_nn_list_nn(WISH_TYPE))?)
            .field(
                resolvers
                    .field(QUERY_TYPE, "wish", TypeRef::named(WISH_TYPE))?
                    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
            );

        let mut builder = Schema::build(QUERY_TYPE, None, None)
            .register(wish)
            .register(query)
            .data(backend)
            .data(self.environment)
            .extension(SuppliedVariablePromotion)
            .extension(FieldErrorPath);

        if let Some(max_depth) = self.query_depth_limit {
            builder = builder.limit_depth(max_depth);
        }
        if self.environment.is_production() {
            builder = builder.disable_introspection();
        }

        builder.finish().map_err(|e| Error::Schema(e.to_string()))
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Narrow interface to the GraphQL execution engine.
///
/// Field-level failures are part of the returned response; `Err` is reserved
/// for faults outside field execution.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: GraphQLRequest) -> Result<async_graphql::Response>;
}

#[async_trait]
impl QueryExecutor for DynamicSchema {
    async fn execute(&self, request: GraphQLRequest) -> Result<async_graphql::Response> {
        Ok(Schema::execute(self, request.into_engine_request()).await)
    }
}

/// Treats `$var: T` as `$var: T!` when the request supplies a non-null value
/// and the definition has no default.
///
/// Lets `query Wish($id: ID) { wish(id: $id) { .. } }` pass validation against
/// `wish(id: ID!)` when `id` is given, while an omitted or `null` value is
/// still rejected before any resolver runs.
struct SuppliedVariablePromotion;

impl ExtensionFactory for SuppliedVariablePromotion {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(SuppliedVariablePromotionExtension)
    }
}

struct SuppliedVariablePromotionExtension;

#[async_trait]
impl Extension for SuppliedVariablePromotionExtension {
    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        let mut document = next.run(ctx, query, variables).await?;
        promote_supplied_variables(&mut document, variables);
        Ok(document)
    }
}

fn promote_supplied_variables(document: &mut ExecutableDocument, variables: &Variables) {
    let operations: Vec<_> = match &mut document.operations {
        DocumentOperations::Single(operation) => vec![operation],
        DocumentOperations::Multiple(operations) => operations.values_mut().collect(),
    };

    for operation in operations {
        for definition in &mut operation.node.variable_definitions {
            let definition = &mut definition.node;
            let supplied = variables
                .get(&definition.name.node)
                .is_some_and(|value| *value != Value::Null);

            if supplied && definition.var_type.node.nullable && definition.default_value.is_none() {
                definition.var_type.node.nullable = false;
            }
        }
    }
}

/// Attaches the response path to field errors that propagate without one
struct FieldErrorPath;

impl ExtensionFactory for FieldErrorPath {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(FieldErrorPathExtension)
    }
}

struct FieldErrorPathExtension;

#[async_trait]
impl Extension for FieldErrorPathExtension {
    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        let path_node = info.path_node;
        next.run(ctx, info).await.map_err(|mut err| {
            if err.path.is_empty() {
                err.path = response_path(path_node);
            }
            err
        })
    }
}

fn response_path(node: &QueryPathNode<'_>) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let mut current = Some(node);
    while let Some(node) = current {
        path.push(match &node.segment {
            QueryPathSegment::Name(name) => PathSegment::Field(name.to_string()),
            QueryPathSegment::Index(index) => PathSegment::Index(*index),
        });
        current = node.parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Failure, FakeWishBackend};
    use serde_json::json;

    fn build(backend: Arc<FakeWishBackend>) -> DynamicSchema {
        SchemaBuilder::new()
            .with_backend(backend)
            .build()
            .expect("schema builds")
    }

    async fn run(schema: &DynamicSchema, query: &str, variables: serde_json::Value) -> serde_json::Value {
        let request = async_graphql::Request::new(query).variables(Variables::from_json(variables));
        serde_json::to_value(schema.execute(request).await).expect("response serializes")
    }

    #[tokio::test]
    async fn all_wish_preserves_backend_order() {
        let backend = Arc::new(FakeWishBackend::with_wishes(&[
            ("3", "c"),
            ("1", "a"),
            ("2", "b"),
        ]));
        let schema = build(backend.clone());

        let response = run(&schema, "query { allWish { id } }", json!({})).await;

        assert_eq!(
            response,
            json!({"data": {"allWish": [{"id": "3"}, {"id": "1"}, {"id": "2"}]}})
        );
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn scalar_fields_do_not_call_backend_again() {
        let backend = Arc::new(FakeWishBackend::sample());
        let schema = build(backend.clone());

        let response = run(&schema, "{ allWish { id description } }", json!({})).await;

        assert_eq!(response["data"]["allWish"][1], json!({"id": "2", "description": "b"}));
        assert_eq!(backend.list_calls(), 1);
        assert_eq!(backend.get_calls(), 0);
    }

    #[tokio::test]
    async fn wish_returns_matching_record() {
        let backend = Arc::new(FakeWishBackend::sample());
        let schema = build(backend.clone());

        let response = run(
            &schema,
            "query Wish($id: ID!) { wish(id: $id) { id description } }",
            json!({"id": "2"}),
        )
        .await;

        assert_eq!(response, json!({"data": {"wish": {"id": "2", "description": "b"}}}));
        assert_eq!(backend.get_calls(), 1);
    }

    #[tokio::test]
    async fn nullable_variable_with_value_is_accepted() {
        let schema = build(Arc::new(FakeWishBackend::sample()));

        let response = run(
            &schema,
            "query Wish($id: ID){ wish(id:$id){ description } }",
            json!({"id": "2"}),
        )
        .await;

        assert_eq!(response, json!({"data": {"wish": {"description": "b"}}}));
    }

    #[tokio::test]
    async fn unknown_wish_is_null_without_error() {
        let schema = build(Arc::new(FakeWishBackend::sample()));

        let response = run(
            &schema,
            "query Wish($id: ID){ wish(id:$id){ description } }",
            json!({"id": "999"}),
        )
        .await;

        assert_eq!(response, json!({"data": {"wish": null}}));
        assert!(response.get("errors").is_none());
    }

    #[tokio::test]
    async fn missing_id_is_rejected_before_resolving() {
        let backend = Arc::new(FakeWishBackend::sample());
        let schema = build(backend.clone());

        let response = run(&schema, "{ wish { id } }", json!({})).await;

        assert!(response["errors"].as_array().is_some_and(|e| !e.is_empty()));
        assert_eq!(backend.get_calls(), 0);
    }

    #[tokio::test]
    async fn nullable_variable_without_value_is_rejected() {
        let backend = Arc::new(FakeWishBackend::sample());
        let schema = build(backend.clone());

        let response = run(
            &schema,
            "query Wish($id: ID){ wish(id:$id){ id } }",
            json!({"id": null}),
        )
        .await;

        assert!(response["errors"].as_array().is_some_and(|e| !e.is_empty()));
        assert_eq!(backend.get_calls(), 0);
    }

    #[tokio::test]
    async fn list_failure_becomes_graphql_error() {
        let backend = Arc::new(FakeWishBackend::sample().failing_list(Failure::Unavailable));
        let schema = build(backend.clone());

        let response = run(&schema, "{ allWish { id } }", json!({})).await;

        assert_eq!(response["data"], json!(null));
        assert_eq!(response["errors"].as_array().map(Vec::len), Some(1));
        assert_eq!(response["errors"][0]["extensions"]["code"], "BACKEND_UNAVAILABLE");
        assert_eq!(response["errors"][0]["path"], json!(["allWish"]));
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn wish_timeout_leaves_siblings_intact() {
        let backend = Arc::new(FakeWishBackend::sample().failing_get(Failure::Timeout));
        let schema = build(backend.clone());

        let response = run(
            &schema,
            r#"{ allWish { id } wish(id: "1") { id } }"#,
            json!({}),
        )
        .await;

        assert_eq!(response["data"]["allWish"], json!([{"id": "1"}, {"id": "2"}]));
        assert_eq!(response["data"]["wish"], json!(null));
        assert_eq!(response["errors"].as_array().map(Vec::len), Some(1));
        assert_eq!(response["errors"][0]["extensions"]["code"], "BACKEND_TIMEOUT");
        assert_eq!(response["errors"][0]["path"], json!(["wish"]));
        assert_eq!(backend.get_calls(), 1);
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn production_sanitizes_and_hides_introspection() {
        let backend = Arc::new(FakeWishBackend::sample().failing_list(Failure::Unavailable));
        let schema = SchemaBuilder::new()
            .with_backend(backend)
            .with_environment(Environment::Production)
            .build()
            .unwrap();

        let response = run(&schema, "{ allWish { id } }", json!({})).await;
        assert_eq!(response["errors"][0]["message"], "Wish service unavailable");

        let response = run(&schema, "{ __schema { queryType { name } } }", json!({})).await;
        assert!(response["data"]["__schema"].is_null());
    }

    #[tokio::test]
    async fn development_allows_introspection() {
        let schema = build(Arc::new(FakeWishBackend::sample()));

        let response = run(&schema, "{ __schema { queryType { name } } }", json!({})).await;
        assert_eq!(response["data"]["__schema"]["queryType"]["name"], "Query");
    }

    #[tokio::test]
    async fn executor_runs_http_envelope() {
        let schema = build(Arc::new(FakeWishBackend::sample()));
        let executor: &dyn QueryExecutor = &schema;

        let request = GraphQLRequest::from_slice(br#"{"query":"query { allWish { id } }"}"#).unwrap();
        let response = executor.execute(request).await.unwrap();

        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({"allWish": [{"id": "1"}, {"id": "2"}]})
        );
    }

    #[test]
    fn unbound_field_fails_build() {
        let resolvers = ResolverMap::new()
            .bind(QUERY_TYPE, "allWish", resolvers::all_wish)
            .bind(WISH_TYPE, "id", resolvers::wish_id)
            .bind(WISH_TYPE, "description", resolvers::wish_description);

        let err = SchemaBuilder::new()
            .with_resolvers(resolvers)
            .with_backend(Arc::new(FakeWishBackend::sample()))
            .build()
            .unwrap_err();

        assert!(err.to_string().contains("Query.wish"));
    }

    #[test]
    fn missing_backend_fails_build() {
        let err = SchemaBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn wish_api_binds_every_field() {
        let resolvers = ResolverMap::wish_api();
        assert_eq!(resolvers.len(), 4);
        assert!(resolvers.get(QUERY_TYPE, "allWish").is_some());
        assert!(resolvers.get(WISH_TYPE, "description").is_some());
        assert!(resolvers.get(WISH_TYPE, "title").is_none());
    }
}
