//! Configuration types for search engine access.

use serde::{Deserialize, Serialize};

/// Name of the engine scope the search endpoint runs against.
pub const GLOBAL_SEARCH_SCOPE: &str = "GlobalSearch";

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Backend type: "memory" or "elastic".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Engine scope to acquire.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Base URL of the Elasticsearch cluster.
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix prepended to lowercased module names to form index names.
    #[serde(default)]
    pub index_prefix: String,

    /// Upper bound on one engine call, in milliseconds. Unbounded when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_scope() -> String {
    GLOBAL_SEARCH_SCOPE.to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            scope: default_scope(),
            url: None,
            index_prefix: String::new(),
            timeout_ms: None,
        }
    }
}

impl SearchConfig {
    /// The configured timeout as a `Duration`.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_ms.map(std::time::Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
