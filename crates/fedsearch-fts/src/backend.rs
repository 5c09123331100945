//! Search backend trait, engine acquisition, and factory.
//!
//! This module defines the `SearchBackend` trait that all engine clients
//! must satisfy, the `EngineQuery` they receive, and the `EngineProvider`
//! the dispatcher acquires them from.
//!
//! # Backends
//!
//! - `MemoryBackend`: Linear scan over in-memory records
//! - `ElasticBackend`: Elasticsearch over HTTP

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fedsearch_core::{Error, QueryDescriptor, Record, RequestContext, Result, ResultSet, SortField};
use serde::{Deserialize, Serialize};

use crate::elastic::ElasticBackend;
use crate::memory::MemoryBackend;
use crate::types::SearchConfig;

/// The query as submitted to a backend.
///
/// Differs from [`QueryDescriptor`] in one way: an empty term is absent
/// rather than an empty string, so backends cannot mistake browsing for a
/// literal empty-string match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineQuery {
    /// Modules to restrict the search to.
    pub modules: Vec<String>,
    /// Free-text term, `None` when browsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    /// Page size, unchecked.
    pub limit: i64,
    /// Page start, unchecked.
    pub offset: i64,
    /// Sort pairs.
    pub sort: Vec<SortField>,
    /// Whether to produce highlight fragments.
    pub highlights: bool,
}

impl From<&QueryDescriptor> for EngineQuery {
    fn from(query: &QueryDescriptor) -> Self {
        Self {
            modules: query.modules.clone(),
            term: query.search_term().map(str::to_string),
            limit: query.limit,
            offset: query.offset,
            sort: query.sort.clone(),
            highlights: query.highlights,
        }
    }
}

/// Abstract search engine client.
///
/// One instance serves every request concurrently.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a query.
    ///
    /// Any error is a runtime failure from the dispatcher's point of view.
    async fn search(&self, ctx: &RequestContext, query: &EngineQuery) -> Result<ResultSet>;

    /// Whether the engine is currently able to serve queries.
    async fn is_available(&self) -> bool;

    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Acquires search engine handles by scope name.
pub trait EngineProvider: Send + Sync {
    /// Return the engine serving `scope`.
    fn acquire(&self, scope: &str) -> Result<Arc<dyn SearchBackend>>;
}

/// Provider over a fixed scope → engine table.
#[derive(Default, Clone)]
pub struct StaticEngineProvider {
    engines: HashMap<String, Arc<dyn SearchBackend>>,
}

impl StaticEngineProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `engine` under `scope`.
    pub fn with_engine(mut self, scope: impl Into<String>, engine: Arc<dyn SearchBackend>) -> Self {
        self.engines.insert(scope.into(), engine);
        self
    }
}

impl EngineProvider for StaticEngineProvider {
    fn acquire(&self, scope: &str) -> Result<Arc<dyn SearchBackend>> {
        self.engines
            .get(scope)
            .cloned()
            .ok_or_else(|| Error::config(format!("no search engine registered for scope '{scope}'")))
    }
}

impl std::fmt::Debug for StaticEngineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut scopes: Vec<_> = self.engines.keys().collect();
        scopes.sort();
        f.debug_struct("StaticEngineProvider")
            .field("scopes", &scopes)
            .finish()
    }
}

/// Create a search backend based on configuration.
///
/// `records` seeds the memory backend and is ignored by the others.
///
/// # Errors
///
/// Returns a configuration error for an unknown backend name, or for the
/// elastic backend without a URL. The elastic HTTP client carries
/// `timeout_ms` as its request timeout.
pub fn create_search_backend(
    config: &SearchConfig,
    records: Vec<Record>,
) -> Result<Arc<dyn SearchBackend>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBackend::new(records))),
        "elastic" => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| Error::config("search.url is required for the elastic backend"))?;
            let mut client = reqwest::Client::builder();
            if let Some(timeout) = config.timeout() {
                client = client.timeout(timeout);
            }
            let client = client
                .build()
                .map_err(|e| Error::config(format!("cannot build search HTTP client: {e}")))?;
            Ok(Arc::new(ElasticBackend::with_client(
                url,
                &config.index_prefix,
                client,
            )))
        }
        other => Err(Error::config(format!("unknown search backend '{other}'"))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fedsearch_core::SortDirection;

    #[test]
    fn test_engine_query_omits_empty_term() {
        let descriptor = QueryDescriptor::new(vec!["Accounts".to_string()]);
        let query = EngineQuery::from(&descriptor);
        assert_eq!(query.term, None);

        let json = serde_json::to_string(&query).unwrap();
        assert!(!json.contains("term"));
    }

    #[test]
    fn test_engine_query_carries_everything_else() {
        let mut descriptor = QueryDescriptor::new(vec!["Accounts".into(), "Contacts".into()])
            .with_term("acme")
            .with_page(-1, 40);
        descriptor.highlights = false;
        descriptor.sort = vec![SortField::new("name", SortDirection::Desc)];

        let query = EngineQuery::from(&descriptor);
        assert_eq!(query.term.as_deref(), Some("acme"));
        assert_eq!(query.modules, vec!["Accounts", "Contacts"]);
        assert_eq!(query.limit, -1);
        assert_eq!(query.offset, 40);
        assert!(!query.highlights);
        assert_eq!(query.sort.len(), 1);
    }

    #[test]
    fn test_static_provider_unknown_scope() {
        let provider = StaticEngineProvider::new();
        let err = provider.acquire("GlobalSearch").err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_static_provider_returns_shared_handle() {
        let engine: Arc<dyn SearchBackend> = Arc::new(MemoryBackend::new(Vec::new()));
        let provider = StaticEngineProvider::new().with_engine("GlobalSearch", engine.clone());
        let acquired = provider.acquire("GlobalSearch").unwrap();
        assert!(Arc::ptr_eq(&acquired, &engine));
    }

    #[test]
    fn test_create_search_backend_memory() {
        let backend = create_search_backend(&SearchConfig::default(), Vec::new()).unwrap();
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_create_search_backend_elastic_requires_url() {
        let config = SearchConfig {
            backend: "elastic".to_string(),
            ..Default::default()
        };
        assert!(create_search_backend(&config, Vec::new()).is_err());

        let config = SearchConfig {
            url: Some("http://localhost:9200".to_string()),
            ..config
        };
        let backend = create_search_backend(&config, Vec::new()).unwrap();
        assert_eq!(backend.name(), "elastic");
    }

    #[test]
    fn test_create_search_backend_elastic_with_timeout() {
        let config = SearchConfig {
            backend: "elastic".to_string(),
            url: Some("http://localhost:9200".to_string()),
            timeout_ms: Some(250),
            ..Default::default()
        };
        let backend = create_search_backend(&config, Vec::new()).unwrap();
        assert_eq!(backend.name(), "elastic");
    }

    #[test]
    fn test_create_search_backend_unknown() {
        let config = SearchConfig {
            backend: "solr".to_string(),
            ..Default::default()
        };
        let err = create_search_backend(&config, Vec::new()).err().unwrap();
        assert!(err.to_string().contains("solr"));
    }
}
