//! GraphQL-over-HTTP wire types and the transport seam.

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpTransport;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::null_as_default;

/// A GraphQL request as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
    /// Extra HTTP headers. Never serialized.
    #[serde(skip)]
    pub headers: BTreeMap<String, String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>, variables: Option<Value>) -> Self {
        Self {
            query: query.into(),
            variables,
            headers: BTreeMap::new(),
        }
    }

    /// Attaches headers to the request.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

/// A GraphQL response, see <https://spec.graphql.org/October2021/#sec-Response>.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    /// HTTP status code, when the response came over HTTP.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl GraphQLResponse {
    /// Looks up a top-level key of `data`.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Joins all error messages into one line.
    pub fn error_messages(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Executes GraphQL requests against an endpoint.
///
/// The HTTP implementation is [`HttpTransport`]; tests substitute in-memory
/// fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request to `endpoint` and parses the GraphQL response.
    async fn execute(
        &self,
        endpoint: &str,
        request: &GraphQLRequest,
    ) -> Result<GraphQLResponse, TransportError>;
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn execute(
        &self,
        endpoint: &str,
        request: &GraphQLRequest,
    ) -> Result<GraphQLResponse, TransportError> {
        (**self).execute(endpoint, request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        endpoint: &str,
        request: &GraphQLRequest,
    ) -> Result<GraphQLResponse, TransportError> {
        (**self).execute(endpoint, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_null_variables() {
        let request = GraphQLRequest::new("query{\nping\n}", None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"query": "query{\nping\n}", "variables": null}));
    }

    #[test]
    fn test_request_never_serializes_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer secret".to_string());
        let request = GraphQLRequest::new("{ ping }", Some(json!({"id": "0"}))).with_headers(headers);

        let body = serde_json::to_string(&request).unwrap();
        assert!(!body.contains("secret"));
    }

    #[test]
    fn test_response_with_null_errors() {
        let response: GraphQLResponse =
            serde_json::from_value(json!({"errors": null, "data": {"ping": "pong"}})).unwrap();
        assert!(response.errors.is_empty());
        assert_eq!(response.data_field("ping"), Some(&json!("pong")));
    }

    #[test]
    fn test_error_messages_are_joined() {
        let response = GraphQLResponse {
            errors: vec![GraphQLError::new("first"), GraphQLError::new("second")],
            ..Default::default()
        };
        assert_eq!(response.error_messages(), "first; second");
    }

    #[test]
    fn test_error_path_accepts_indices() {
        let error: GraphQLError =
            serde_json::from_value(json!({"message": "boom", "path": ["users", 0, "name"]})).unwrap();
        assert_eq!(error.path.unwrap().len(), 3);
    }
}
