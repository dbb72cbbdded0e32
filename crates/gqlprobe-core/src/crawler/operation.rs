use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::{classify, Outcome};
use crate::compiler::RequestKind;
use crate::transport::{GraphQLRequest, GraphQLResponse};

/// One tested root field.
///
/// Built once the outcome is known and not changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub kind: RequestKind,
    /// The request that was sent, or would have been sent.
    pub request: Option<GraphQLRequest>,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<GraphQLResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Operation {
    /// An operation that received a response.
    pub fn answered(
        name: impl Into<String>,
        kind: RequestKind,
        request: GraphQLRequest,
        response: GraphQLResponse,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            request: Some(request),
            outcome: classify(&response),
            response: Some(response),
            error: None,
        }
    }

    /// An operation whose request failed in transport.
    pub fn failed(
        name: impl Into<String>,
        kind: RequestKind,
        request: GraphQLRequest,
        error: impl ToString,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            request: Some(request),
            outcome: Outcome::Failed,
            response: None,
            error: Some(error.to_string()),
        }
    }

    /// An operation that was never sent.
    pub fn skipped(name: impl Into<String>, kind: RequestKind, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            kind,
            request: None,
            outcome: Outcome::Skipped,
            response: None,
            error: Some(error.to_string()),
        }
    }

    /// True unless the server denied the call.
    pub fn is_exposed(&self) -> bool {
        self.outcome != Outcome::Denied
    }

    /// Why the operation was not answered normally.
    ///
    /// A gateway reports a failed subgraph fetch inside the response body,
    /// so the response's error messages stand in when there is no
    /// transport or synthesis error.
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }

        self.response
            .as_ref()
            .map(GraphQLResponse::error_messages)
            .filter(|messages| !messages.is_empty())
    }
}

/// The result of one crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Queries first, then mutations, each in schema order.
    pub operations: Vec<Operation>,
}

impl CrawlReport {
    pub fn new(target: impl Into<String>, started_at: DateTime<Utc>, operations: Vec<Operation>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: target.into(),
            started_at,
            finished_at: Utc::now(),
            operations,
        }
    }

    /// Number of operations with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.operations.iter().filter(|op| op.outcome == outcome).count()
    }

    /// Operations that were not denied.
    pub fn exposed(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_exposed())
    }

    /// Drops every denied operation.
    pub fn retain_exposed(&mut self) {
        self.operations.retain(Operation::is_exposed);
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}
