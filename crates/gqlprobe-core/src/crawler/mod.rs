//! Crawl orchestration.
//!
//! The crawler resolves the schema once, caches it as an immutable
//! [`SchemaIndex`] snapshot and then runs every root query and mutation
//! through synthesize → compile → execute → classify.

mod classify;
mod operation;
mod state;

pub use classify::{classify, is_denied, is_fetch_failed, Outcome, DENIED_MARKERS, FETCH_FAILED_MARKER};
pub use operation::{CrawlReport, Operation};
pub use state::CrawlState;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::compiler::{CompileError, RequestCompiler, RequestKind};
use crate::config::{
    Config, ConfigError, IntrospectionConfig, PollingConfig, TargetConfig,
    ALWAYS_IGNORED_OPERATIONS,
};
use crate::introspection::{IntrospectionError, Introspector};
use crate::schema::{Field, Schema, SchemaIndex};
use crate::synth::{SynthesisError, Synthesizer, TimePolicy};
use crate::transport::{GraphQLRequest, GraphQLResponse, Transport, TransportError};

/// Crawl errors.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("No target URL configured")]
    NoTarget,

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("Failed to load schema: {0}")]
    Introspection(#[from] IntrospectionError),

    #[error("Failed to synthesize variables for {operation}: {source}")]
    Synthesis {
        operation: String,
        #[source]
        source: SynthesisError,
    },

    #[error("Failed to compile request for {operation}: {source}")]
    Compile {
        operation: String,
        #[source]
        source: CompileError,
    },

    #[error("No {kind} named {name} in schema")]
    UnknownOperation { kind: RequestKind, name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CrawlError {
    /// Returns true when the failure is a missing target URL.
    pub fn is_no_target(&self) -> bool {
        matches!(
            self,
            CrawlError::NoTarget | CrawlError::Introspection(IntrospectionError::NoTarget)
        )
    }
}

/// Mutable crawl inputs.
#[derive(Debug, Clone)]
struct Settings {
    target: TargetConfig,
    ignore: Vec<String>,
}

/// A resolved schema and the endpoint it was loaded from.
#[derive(Clone)]
struct Snapshot {
    url: String,
    index: Arc<SchemaIndex>,
}

/// Runs crawls against one target.
///
/// Shared across tasks behind an `Arc`. Reads of the cached schema never
/// block on a reload; reloads are serialized by `reload_lock`.
///
/// Lock order is `settings` before `snapshot`. A snapshot is only used while
/// its URL matches the current target.
pub struct Crawler<T: Transport> {
    transport: T,
    settings: RwLock<Settings>,
    introspection: IntrospectionConfig,
    time: TimePolicy,
    strict: bool,
    polling: PollingConfig,
    snapshot: RwLock<Option<Snapshot>>,
    state: RwLock<CrawlState>,
    reload_lock: Mutex<()>,
}

impl<T: Transport> Crawler<T> {
    /// Creates a crawler from a validated configuration.
    pub fn new(transport: T, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            transport,
            settings: RwLock::new(Settings {
                target: config.target.clone(),
                ignore: config.crawl.ignore.clone(),
            }),
            introspection: config.introspection,
            time: config.synthesis.time_policy()?,
            strict: config.crawl.strict,
            polling: config.polling,
            snapshot: RwLock::new(None),
            state: RwLock::new(CrawlState::Idle),
            reload_lock: Mutex::new(()),
        })
    }

    pub async fn target_url(&self) -> Option<String> {
        self.settings.read().await.target.url.clone()
    }

    /// Points the crawler at a new endpoint.
    ///
    /// Returns false when the URL is unchanged. A change drops the cached
    /// schema.
    pub async fn set_target_url(&self, url: &str) -> Result<bool, CrawlError> {
        reqwest::Url::parse(url).map_err(|e| CrawlError::InvalidTarget {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        {
            let mut settings = self.settings.write().await;
            if settings.target.url.as_deref() == Some(url) {
                return Ok(false);
            }
            settings.target.url = Some(url.to_string());
            *self.snapshot.write().await = None;
        }

        info!(url, "Target changed");
        self.set_state(CrawlState::Idle).await;
        Ok(true)
    }

    /// The user-supplied ignore list. `_entities` and `_service` are
    /// skipped regardless.
    pub async fn ignored(&self) -> Vec<String> {
        self.settings.read().await.ignore.clone()
    }

    pub async fn set_ignored(&self, ignore: Vec<String>) {
        self.settings.write().await.ignore = ignore;
    }

    pub async fn state(&self) -> CrawlState {
        *self.state.read().await
    }

    /// Returns true when a schema for the current target is cached.
    pub async fn is_ready(&self) -> bool {
        self.cached().await.is_some()
    }

    /// Returns the cached schema, loading it first if needed.
    pub async fn schema(&self) -> Result<Arc<SchemaIndex>, CrawlError> {
        Ok(self.snapshot().await?.index)
    }

    /// Resolves the schema again and swaps the snapshot.
    pub async fn reload(&self) -> Result<Arc<SchemaIndex>, CrawlError> {
        let _guard = self.reload_lock.lock().await;
        Ok(self.load().await?.index)
    }

    async fn cached(&self) -> Option<Snapshot> {
        let settings = self.settings.read().await;
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| settings.target.url.as_deref() == Some(s.url.as_str()))
            .cloned()
    }

    async fn snapshot(&self) -> Result<Snapshot, CrawlError> {
        if let Some(snapshot) = self.cached().await {
            return Ok(snapshot);
        }

        let _guard = self.reload_lock.lock().await;
        if let Some(snapshot) = self.cached().await {
            return Ok(snapshot);
        }
        self.load().await
    }

    /// Resolves the schema without touching the cache.
    pub async fn fetch_schema(&self) -> Result<Schema, CrawlError> {
        let target = self.settings.read().await.target.clone();
        if target.url.is_none() {
            return Err(CrawlError::NoTarget);
        }

        Ok(Introspector::new(&self.transport, &target, self.introspection)
            .resolve_schema()
            .await?)
    }

    async fn load(&self) -> Result<Snapshot, CrawlError> {
        self.set_state(CrawlState::SchemaLoading).await;

        let target = self.settings.read().await.target.clone();
        let result = match &target.url {
            Some(url) => Introspector::new(&self.transport, &target, self.introspection)
                .resolve_schema()
                .await
                .map(|schema| (url.clone(), schema))
                .map_err(CrawlError::from),
            None => Err(CrawlError::NoTarget),
        };

        let (url, schema) = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                let fallback = if self.is_ready().await {
                    CrawlState::Ready
                } else {
                    CrawlState::Idle
                };
                self.set_state(fallback).await;
                return Err(e);
            }
        };

        let index = Arc::new(SchemaIndex::new(schema));
        info!(
            types = index.type_count(),
            queries = index.queries().len(),
            mutations = index.mutations().len(),
            "Schema indexed"
        );

        let snapshot = Snapshot { url, index };

        // The target may have moved while introspecting.
        let settings = self.settings.read().await;
        if settings.target.url.as_deref() == Some(snapshot.url.as_str()) {
            *self.snapshot.write().await = Some(snapshot.clone());
            self.set_state(CrawlState::Ready).await;
        } else {
            debug!(url = %snapshot.url, "Target changed during load, discarding schema");
        }

        Ok(snapshot)
    }

    /// Tests every non-ignored query, then every non-ignored mutation.
    pub async fn crawl(&self) -> Result<CrawlReport, CrawlError> {
        let Snapshot { url: endpoint, index } = self.snapshot().await?;
        let settings = self.settings.read().await.clone();

        self.set_state(CrawlState::Crawling).await;
        let started_at = Utc::now();

        let roots = [
            (RequestKind::Query, index.queries()),
            (RequestKind::Mutation, index.mutations()),
        ];

        let mut operations = Vec::new();
        for (kind, fields) in roots {
            for field in fields {
                if is_ignored(&settings.ignore, &field.name) {
                    debug!(operation = %field.name, "Ignored");
                    continue;
                }

                match self
                    .run_operation(&index, &settings.target, &endpoint, field, kind, self.strict)
                    .await
                {
                    Ok(op) => operations.push(op),
                    Err(e) => {
                        self.set_state(CrawlState::Ready).await;
                        return Err(e);
                    }
                }
            }
        }

        self.set_state(CrawlState::Done).await;

        let report = CrawlReport::new(endpoint, started_at, operations);
        info!(
            run_id = %report.run_id,
            operations = report.operations.len(),
            denied = report.count(Outcome::Denied),
            allowed = report.count(Outcome::Allowed),
            failed = report.count(Outcome::Failed),
            "Crawl finished"
        );
        Ok(report)
    }

    /// Tests a single root query by name.
    pub async fn test_query(&self, name: &str) -> Result<Operation, CrawlError> {
        self.test_one(RequestKind::Query, name).await
    }

    /// Tests a single root mutation by name.
    pub async fn test_mutation(&self, name: &str) -> Result<Operation, CrawlError> {
        self.test_one(RequestKind::Mutation, name).await
    }

    async fn test_one(&self, kind: RequestKind, name: &str) -> Result<Operation, CrawlError> {
        let Snapshot { url: endpoint, index } = self.snapshot().await?;
        let field = match kind {
            RequestKind::Query => index.query(name),
            RequestKind::Mutation => index.mutation(name),
        }
        .ok_or_else(|| CrawlError::UnknownOperation {
            kind,
            name: name.to_string(),
        })?;

        let target = self.settings.read().await.target.clone();

        self.run_operation(&index, &target, &endpoint, field, kind, true)
            .await
    }

    /// Sends a hand-written request to the target with the configured
    /// headers.
    pub async fn execute(
        &self,
        query: impl Into<String>,
        variables: Option<serde_json::Value>,
    ) -> Result<GraphQLResponse, CrawlError> {
        let target = self.settings.read().await.target.clone();
        let endpoint = target.url.ok_or(CrawlError::NoTarget)?;
        let request = GraphQLRequest::new(query, variables).with_headers(target.headers);
        Ok(self.transport.execute(&endpoint, &request).await?)
    }

    async fn run_operation(
        &self,
        index: &SchemaIndex,
        target: &TargetConfig,
        endpoint: &str,
        field: &Field,
        kind: RequestKind,
        strict: bool,
    ) -> Result<Operation, CrawlError> {
        let request = match self.build_request(index, field, kind) {
            Ok(request) => request.with_headers(target.headers.clone()),
            Err(e) if !strict => {
                warn!(operation = %field.name, error = %e, "Skipping operation");
                return Ok(Operation::skipped(&field.name, kind, e));
            }
            Err(e) => return Err(e),
        };

        debug!(operation = %field.name, %kind, "Executing");

        let operation = match self.transport.execute(endpoint, &request).await {
            Ok(response) => Operation::answered(&field.name, kind, request, response),
            Err(e) => {
                warn!(operation = %field.name, error = %e, "Request failed");
                Operation::failed(&field.name, kind, request, e)
            }
        };

        debug!(operation = %field.name, outcome = operation.outcome.label(), "Classified");
        Ok(operation)
    }

    fn build_request(
        &self,
        index: &SchemaIndex,
        field: &Field,
        kind: RequestKind,
    ) -> Result<GraphQLRequest, CrawlError> {
        let variables = Synthesizer::new(index)
            .with_time_policy(self.time)
            .synthesize(field)
            .map_err(|source| CrawlError::Synthesis {
                operation: field.name.clone(),
                source,
            })?;

        let query = RequestCompiler::new(index)
            .compile(field, kind)
            .map_err(|source| CrawlError::Compile {
                operation: field.name.clone(),
                source,
            })?;

        Ok(GraphQLRequest::new(query, variables.map(|v| v.to_json())))
    }

    async fn set_state(&self, state: CrawlState) {
        let mut current = self.state.write().await;
        if *current != state {
            debug!(from = current.display_name(), to = state.display_name(), "State change");
            *current = state;
        }
    }
}

impl<T: Transport + 'static> Crawler<T> {
    /// Starts the background schema reload if polling is enabled.
    pub fn spawn_polling(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.polling.enabled {
            return None;
        }

        let period = Duration::from_secs(self.polling.interval_minutes * 60);
        Some(self.spawn_reload_every(period))
    }

    /// Reloads the schema every `period`, starting one period from now.
    pub fn spawn_reload_every(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;

                if self.target_url().await.is_none() {
                    info!("No target URL configured, skipping schema poll");
                    continue;
                }

                info!("Polling for schema changes");
                if let Err(e) = self.reload().await {
                    warn!(error = %e, "Schema reload failed");
                }
            }
        })
    }
}

fn is_ignored(ignore: &[String], name: &str) -> bool {
    ALWAYS_IGNORED_OPERATIONS.contains(&name) || ignore.iter().any(|i| i == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_ignored() {
        assert!(is_ignored(&[], "_entities"));
        assert!(is_ignored(&[], "_service"));
        assert!(!is_ignored(&[], "ping"));
        assert!(is_ignored(&["ping".to_string()], "ping"));
    }

    #[test]
    fn test_no_target_detection() {
        assert!(CrawlError::NoTarget.is_no_target());
        assert!(CrawlError::Introspection(IntrospectionError::NoTarget).is_no_target());
        assert!(!CrawlError::Transport(TransportError::Network("x".into())).is_no_target());
    }
}
