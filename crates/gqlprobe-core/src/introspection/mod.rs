//! Depth-bounded schema introspection.
//!
//! Introspection queries can only follow `ofType` to a fixed depth. When a
//! response contains a wrapper chain that was cut off, the whole query is
//! re-issued with twice the depth until the type is complete or the attempt
//! bound is reached.

mod queries;

pub use queries::{of_type_selection, schema_query, type_query};

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{IntrospectionConfig, TargetConfig};
use crate::schema::{Schema, Type};
use crate::transport::{GraphQLRequest, GraphQLResponse, Transport, TransportError};

/// Introspection errors.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("No target URL configured")]
    NoTarget,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to parse introspection response: {0}")]
    Parse(String),

    #[error("Introspection query returned errors: {0}")]
    GraphQL(String),

    #[error("Type {0} not found")]
    TypeNotFound(String),

    #[error("Type {name} still incomplete after {attempts} introspection queries")]
    Unresolved { name: String, attempts: usize },
}

/// Doubles an introspection depth, treating zero as one.
pub fn next_depth(depth: usize) -> usize {
    depth.max(1) * 2
}

/// Resolves types and schemas from a GraphQL endpoint.
pub struct Introspector<'a, T: Transport + ?Sized> {
    transport: &'a T,
    target: &'a TargetConfig,
    config: IntrospectionConfig,
}

impl<'a, T: Transport + ?Sized> Introspector<'a, T> {
    pub fn new(transport: &'a T, target: &'a TargetConfig, config: IntrospectionConfig) -> Self {
        Self {
            transport,
            target,
            config,
        }
    }

    /// Resolves a single named type, starting at the configured depth.
    pub async fn resolve_type(&self, name: &str) -> Result<Type, IntrospectionError> {
        self.resolve_type_from(name, self.config.initial_depth).await
    }

    /// Resolves the whole schema.
    ///
    /// Types that come back incomplete from the schema query are resolved one
    /// by one, starting at twice the schema query depth.
    pub async fn resolve_schema(&self) -> Result<Schema, IntrospectionError> {
        let depth = self.config.initial_depth;
        debug!(depth, "Fetching schema");

        let response = self.send(schema_query(depth), None).await?;
        let payload = payload(&response, "__schema")
            .ok_or_else(|| missing_payload(&response, "__schema"))?;

        let mut schema: Schema = serde_json::from_value(payload.clone())
            .map_err(|e| IntrospectionError::Parse(e.to_string()))?;

        let mut refetched = 0;
        for ty in schema.types.iter_mut() {
            if ty.is_complete() {
                continue;
            }
            let name = ty.name().to_string();
            *ty = self.resolve_type_from(&name, next_depth(depth)).await?;
            refetched += 1;
        }

        info!(
            types = schema.types.len(),
            refetched,
            "Schema loaded"
        );

        Ok(schema)
    }

    async fn resolve_type_from(&self, name: &str, start: usize) -> Result<Type, IntrospectionError> {
        let mut depth = start;

        for attempt in 1..=self.config.max_attempts {
            debug!(name, depth, attempt, "Fetching type");

            let response = self
                .send(type_query(depth), Some(json!({ "name": name })))
                .await?;

            let payload = payload(&response, "__type").ok_or_else(|| {
                if response.errors.is_empty() {
                    IntrospectionError::TypeNotFound(name.to_string())
                } else {
                    IntrospectionError::GraphQL(response.error_messages())
                }
            })?;

            let ty: Type = serde_json::from_value(payload.clone())
                .map_err(|e| IntrospectionError::Parse(e.to_string()))?;

            if ty.is_complete() {
                return Ok(ty);
            }

            depth = next_depth(depth);
        }

        Err(IntrospectionError::Unresolved {
            name: name.to_string(),
            attempts: self.config.max_attempts,
        })
    }

    async fn send(
        &self,
        query: String,
        variables: Option<serde_json::Value>,
    ) -> Result<GraphQLResponse, IntrospectionError> {
        let endpoint = self.target.url.as_deref().ok_or(IntrospectionError::NoTarget)?;
        let request = GraphQLRequest::new(query, variables).with_headers(self.target.headers.clone());
        Ok(self.transport.execute(endpoint, &request).await?)
    }
}

fn payload<'r>(response: &'r GraphQLResponse, key: &str) -> Option<&'r serde_json::Value> {
    response.data_field(key).filter(|v| !v.is_null())
}

fn missing_payload(response: &GraphQLResponse, key: &str) -> IntrospectionError {
    if response.errors.is_empty() {
        IntrospectionError::Parse(format!("no valid {} field found", key))
    } else {
        IntrospectionError::GraphQL(response.error_messages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeKind;
    use crate::transport::GraphQLError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Answers type queries with a complete type only once the requested
    /// depth reaches `complete_at`.
    struct DepthTransport {
        complete_at: usize,
        depths: Mutex<Vec<usize>>,
    }

    impl DepthTransport {
        fn new(complete_at: usize) -> Self {
            Self {
                complete_at,
                depths: Mutex::new(Vec::new()),
            }
        }

        fn depths(&self) -> Vec<usize> {
            self.depths.lock().unwrap().clone()
        }
    }

    fn user_type(complete: bool) -> Value {
        let field_type = if complete {
            json!({"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "ID", "ofType": null}})
        } else {
            json!({"kind": "NON_NULL", "name": null, "ofType": null})
        };
        json!({
            "kind": "OBJECT",
            "name": "User",
            "fields": [{"name": "id", "args": [], "type": field_type}]
        })
    }

    #[async_trait]
    impl Transport for DepthTransport {
        async fn execute(
            &self,
            _endpoint: &str,
            request: &GraphQLRequest,
        ) -> Result<GraphQLResponse, TransportError> {
            let depth = request.query.matches("ofType").count();
            self.depths.lock().unwrap().push(depth);

            let complete = depth >= self.complete_at;
            let data = if request.query.contains("__schema") {
                json!({"__schema": {"queryType": {"name": "Query"}, "types": [user_type(complete)]}})
            } else {
                json!({"__type": user_type(complete)})
            };

            Ok(GraphQLResponse {
                data: Some(data),
                ..Default::default()
            })
        }
    }

    fn target() -> TargetConfig {
        TargetConfig {
            url: Some("http://localhost/graphql".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_next_depth() {
        assert_eq!(next_depth(0), 2);
        assert_eq!(next_depth(1), 2);
        assert_eq!(next_depth(4), 8);
    }

    #[tokio::test]
    async fn test_complete_type_needs_one_query() {
        let transport = DepthTransport::new(4);
        let target = target();
        let introspector = Introspector::new(&transport, &target, IntrospectionConfig::default());

        let ty = introspector.resolve_type("User").await.unwrap();
        assert_eq!(ty.kind, TypeKind::Object);
        assert_eq!(transport.depths(), vec![4]);
    }

    #[tokio::test]
    async fn test_incomplete_type_is_requeried_once_at_double_depth() {
        let transport = DepthTransport::new(8);
        let target = target();
        let introspector = Introspector::new(&transport, &target, IntrospectionConfig::default());

        let ty = introspector.resolve_type("User").await.unwrap();
        assert!(ty.is_complete());
        assert_eq!(transport.depths(), vec![4, 8]);
    }

    #[tokio::test]
    async fn test_zero_depth_doubles_from_one() {
        let transport = DepthTransport::new(2);
        let target = target();
        let config = IntrospectionConfig {
            initial_depth: 0,
            max_attempts: 3,
        };

        Introspector::new(&transport, &target, config)
            .resolve_type("User")
            .await
            .unwrap();
        assert_eq!(transport.depths(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_attempt_bound() {
        let transport = DepthTransport::new(usize::MAX);
        let target = target();
        let config = IntrospectionConfig {
            initial_depth: 1,
            max_attempts: 3,
        };

        let result = Introspector::new(&transport, &target, config)
            .resolve_type("User")
            .await;

        assert!(matches!(result, Err(IntrospectionError::Unresolved { attempts: 3, .. })));
        assert_eq!(transport.depths(), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_schema_refetches_incomplete_types() {
        let transport = DepthTransport::new(8);
        let target = target();
        let introspector = Introspector::new(&transport, &target, IntrospectionConfig::default());

        let schema = introspector.resolve_schema().await.unwrap();
        assert!(schema.get_type("User").unwrap().is_complete());
        assert_eq!(transport.depths(), vec![4, 8]);
    }

    #[tokio::test]
    async fn test_no_target() {
        let transport = DepthTransport::new(4);
        let target = TargetConfig::default();
        let result = Introspector::new(&transport, &target, IntrospectionConfig::default())
            .resolve_schema()
            .await;

        assert!(matches!(result, Err(IntrospectionError::NoTarget)));
        assert!(transport.depths().is_empty());
    }

    struct StaticTransport(GraphQLResponse);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn execute(
            &self,
            _endpoint: &str,
            _request: &GraphQLRequest,
        ) -> Result<GraphQLResponse, TransportError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_missing_schema_payload() {
        let transport = StaticTransport(GraphQLResponse {
            data: Some(json!({})),
            ..Default::default()
        });
        let target = target();
        let result = Introspector::new(&transport, &target, IntrospectionConfig::default())
            .resolve_schema()
            .await;

        assert!(matches!(result, Err(IntrospectionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_introspection_disabled() {
        let transport = StaticTransport(GraphQLResponse {
            errors: vec![GraphQLError::new("introspection is disabled")],
            ..Default::default()
        });
        let target = target();
        let result = Introspector::new(&transport, &target, IntrospectionConfig::default())
            .resolve_schema()
            .await;

        assert!(matches!(result, Err(IntrospectionError::GraphQL(msg)) if msg.contains("disabled")));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let transport = StaticTransport(GraphQLResponse {
            data: Some(json!({"__type": null})),
            ..Default::default()
        });
        let target = target();
        let result = Introspector::new(&transport, &target, IntrospectionConfig::default())
            .resolve_type("Nope")
            .await;

        assert!(matches!(result, Err(IntrospectionError::TypeNotFound(name)) if name == "Nope"));
    }
}
