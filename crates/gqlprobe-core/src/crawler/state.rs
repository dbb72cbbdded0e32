use serde::{Deserialize, Serialize};

/// Lifecycle of a crawler.
///
/// Idle → SchemaLoading → Ready → Crawling → Done. `Ready` and `Done` both
/// hold a cached schema; a target change drops back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    /// No schema loaded
    #[default]
    Idle,
    /// Introspection in progress
    SchemaLoading,
    /// Schema cached, no crawl running
    Ready,
    /// Operations being executed
    Crawling,
    /// Last crawl finished, schema still cached
    Done,
}

impl CrawlState {
    /// Returns a human-readable name for the state.
    pub fn display_name(&self) -> &'static str {
        match self {
            CrawlState::Idle => "Idle",
            CrawlState::SchemaLoading => "Loading schema",
            CrawlState::Ready => "Ready",
            CrawlState::Crawling => "Crawling",
            CrawlState::Done => "Done",
        }
    }
}
