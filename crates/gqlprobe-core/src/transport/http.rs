use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use super::{GraphQLRequest, GraphQLResponse, Transport, TransportError};

/// GraphQL-over-HTTP transport backed by `reqwest`.
///
/// Every request is a `POST` with a JSON body and
/// `content-type: application/json`, plus the request's own headers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with reqwest's default settings.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Creates a transport that gives up on requests after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        endpoint: &str,
        request: &GraphQLRequest,
    ) -> Result<GraphQLResponse, TransportError> {
        let mut req = self
            .client
            .post(endpoint)
            .header("content-type", "application/json");

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        trace!(status = status.as_u16(), body = %body, "graphql response");

        // Servers commonly answer auth failures with 401/403 and a regular
        // GraphQL body, so the body is parsed regardless of status.
        match serde_json::from_str::<GraphQLResponse>(&body) {
            Ok(mut parsed) => {
                parsed.status = Some(status.as_u16());
                Ok(parsed)
            }
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(TransportError::Parse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_server(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_execute_parses_data() {
        let server = mock_server(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"ping": "pong"}})),
        )
        .await;

        let transport = HttpTransport::new();
        let request = GraphQLRequest::new("query{\nping\n}", None);
        let response = transport
            .execute(&format!("{}/graphql", server.uri()), &request)
            .await
            .unwrap();

        assert_eq!(response.data_field("ping"), Some(&json!("pong")));
        assert_eq!(response.status, Some(200));
    }

    #[tokio::test]
    async fn test_execute_sends_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"query": "query{\nping\n}", "variables": {"id": "0"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = BTreeMap::new();
        headers.insert("authorization".to_string(), "Bearer token".to_string());
        let request =
            GraphQLRequest::new("query{\nping\n}", Some(json!({"id": "0"}))).with_headers(headers);

        HttpTransport::new()
            .execute(&format!("{}/graphql", server.uri()), &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_execute_parses_errors_on_unauthorized_status() {
        let server = mock_server(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errors": [{"message": "Unauthenticated"}]})),
        )
        .await;

        let response = HttpTransport::new()
            .execute(
                &format!("{}/graphql", server.uri()),
                &GraphQLRequest::new("{ ping }", None),
            )
            .await
            .unwrap();

        assert_eq!(response.status, Some(401));
        assert_eq!(response.errors[0].message, "Unauthenticated");
    }

    #[tokio::test]
    async fn test_execute_non_graphql_error_body() {
        let server = mock_server(ResponseTemplate::new(502).set_body_string("Bad Gateway")).await;

        let result = HttpTransport::new()
            .execute(
                &format!("{}/graphql", server.uri()),
                &GraphQLRequest::new("{ ping }", None),
            )
            .await;

        assert!(matches!(result, Err(TransportError::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_execute_invalid_json() {
        let server = mock_server(ResponseTemplate::new(200).set_body_string("<html>")).await;

        let result = HttpTransport::new()
            .execute(
                &format!("{}/graphql", server.uri()),
                &GraphQLRequest::new("{ ping }", None),
            )
            .await;

        assert!(matches!(result, Err(TransportError::Parse(_))));
    }

    #[tokio::test]
    async fn test_execute_connection_refused() {
        let result = HttpTransport::new()
            .execute(
                "http://127.0.0.1:1/graphql",
                &GraphQLRequest::new("{ ping }", None),
            )
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let server = mock_server(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"ping": "pong"}}))
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let result = HttpTransport::with_timeout(Duration::from_millis(100))
            .unwrap()
            .execute(
                &format!("{}/graphql", server.uri()),
                &GraphQLRequest::new("{ ping }", None),
            )
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
