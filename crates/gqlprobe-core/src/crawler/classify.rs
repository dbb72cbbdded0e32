//! Response classification.
//!
//! Classification is substring matching over error messages and error
//! extensions. Servers that word authorization failures differently are
//! reported as allowed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::{GraphQLError, GraphQLResponse};

/// Marker gateways put in errors when the upstream could not be reached.
/// Matched case-sensitively.
pub const FETCH_FAILED_MARKER: &str = "HTTP fetch failed";

/// Lowercase markers of an authorization failure.
pub const DENIED_MARKERS: &[&str] = &["unauthenticated", "permissiondenied"];

/// The result of executing one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The server answered without an authorization error.
    Allowed,
    /// The server rejected the call as unauthenticated or forbidden.
    Denied,
    /// The request never produced a usable response.
    Failed,
    /// No request was sent because the field could not be synthesized or
    /// compiled.
    Skipped,
}

impl Outcome {
    /// Label used when printing results.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Allowed => "ALLOWED",
            Outcome::Denied => "DENIED",
            Outcome::Failed => "FAILED TO FETCH",
            Outcome::Skipped => "SKIPPED",
        }
    }
}

/// Classifies a response. Fetch failures take precedence over denials.
pub fn classify(response: &GraphQLResponse) -> Outcome {
    if is_fetch_failed(response) {
        Outcome::Failed
    } else if is_denied(response) {
        Outcome::Denied
    } else {
        Outcome::Allowed
    }
}

pub fn is_fetch_failed(response: &GraphQLResponse) -> bool {
    response
        .errors
        .iter()
        .any(|e| e.message.contains(FETCH_FAILED_MARKER))
}

pub fn is_denied(response: &GraphQLResponse) -> bool {
    response.errors.iter().any(error_is_denied)
}

fn error_is_denied(error: &GraphQLError) -> bool {
    if contains_marker(&error.message) {
        return true;
    }

    error
        .extensions
        .iter()
        .flat_map(|ext| ext.values())
        .any(|value| match value {
            Value::String(s) => contains_marker(s),
            other => contains_marker(&other.to_string()),
        })
}

fn contains_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    DENIED_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> GraphQLResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_data_is_allowed() {
        assert_eq!(classify(&response(json!({"data": {"ping": "pong"}}))), Outcome::Allowed);
    }

    #[test]
    fn test_unauthenticated_message_is_denied() {
        let resp = response(json!({"errors": [{"message": "Unauthenticated"}]}));
        assert_eq!(classify(&resp), Outcome::Denied);
    }

    #[test]
    fn test_permission_denied_message_is_denied() {
        let resp = response(json!({"errors": [{"message": "rpc error: code = PermissionDenied"}]}));
        assert_eq!(classify(&resp), Outcome::Denied);
    }

    #[test]
    fn test_extension_code_is_denied() {
        let resp = response(json!({
            "errors": [{"message": "Not allowed", "extensions": {"code": "UNAUTHENTICATED"}}]
        }));
        assert_eq!(classify(&resp), Outcome::Denied);
    }

    #[test]
    fn test_nested_extension_is_denied() {
        let resp = response(json!({
            "errors": [{"message": "boom", "extensions": {"details": {"reason": "PermissionDenied"}}}]
        }));
        assert!(is_denied(&resp));
    }

    #[test]
    fn test_other_errors_are_allowed() {
        let resp = response(json!({"errors": [{"message": "Forbidden"}]}));
        assert_eq!(classify(&resp), Outcome::Allowed);
    }

    #[test]
    fn test_fetch_failed_wins() {
        let resp = response(json!({
            "errors": [
                {"message": "Unauthenticated"},
                {"message": "HTTP fetch failed from 'users': connection refused"}
            ]
        }));
        assert_eq!(classify(&resp), Outcome::Failed);
    }

    #[test]
    fn test_fetch_failed_is_case_sensitive() {
        let resp = response(json!({"errors": [{"message": "http fetch failed"}]}));
        assert!(!is_fetch_failed(&resp));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Outcome::Failed.label(), "FAILED TO FETCH");
        assert_eq!(Outcome::Denied.label(), "DENIED");
        assert_eq!(Outcome::Allowed.label(), "ALLOWED");
    }
}
