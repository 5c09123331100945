//! Search dispatch with failure classification.
//!
//! The dispatcher is the only place engine failures are classified:
//!
//! | condition | outcome |
//! |---|---|
//! | engine cannot be acquired | `SearchRuntime` |
//! | engine reports unavailable | `SearchUnavailable` |
//! | availability check times out | `SearchRuntime` |
//! | search fails or times out | `SearchRuntime` |
//!
//! Causes are logged, never returned. There are no retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fedsearch_core::{Error, QueryDescriptor, RequestContext, Result, ResultSet};

use crate::backend::{EngineProvider, EngineQuery};

/// Sends normalized queries to the engine serving a scope.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn EngineProvider>,
    scope: String,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher for `scope`, without a timeout.
    pub fn new(provider: Arc<dyn EngineProvider>, scope: impl Into<String>) -> Self {
        Self {
            provider,
            scope: scope.into(),
            timeout: None,
        }
    }

    /// Bound each engine call (availability check and search) by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Scope this dispatcher acquires.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Run `query` and return the raw result set.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        query: &QueryDescriptor,
    ) -> Result<ResultSet> {
        let request_id = ctx.request_id();

        let engine = self.provider.acquire(&self.scope).map_err(|e| {
            log::error!("[{request_id}] Could not acquire '{}' engine: {e}", self.scope);
            Error::SearchRuntime
        })?;

        let available = self.bounded(engine.is_available()).await.map_err(|limit| {
            log::error!(
                "[{request_id}] Availability check on '{}' timed out after {limit:?}",
                engine.name()
            );
            Error::SearchRuntime
        })?;
        if !available {
            log::warn!("[{request_id}] Engine '{}' reports unavailable", engine.name());
            return Err(Error::SearchUnavailable);
        }

        let engine_query = EngineQuery::from(query);
        let outcome = match self.bounded(engine.search(ctx, &engine_query)).await {
            Ok(outcome) => outcome,
            Err(limit) => Err(Error::backend(format!("timed out after {limit:?}"))),
        };

        outcome.map_err(|e| {
            log::error!("[{request_id}] Search on '{}' failed: {e}", engine.name());
            Error::SearchRuntime
        })
    }

    /// Await `call`, or the configured timeout if it expires first.
    async fn bounded<F: Future>(&self, call: F) -> std::result::Result<F::Output, Duration> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| limit),
            None => Ok(call.await),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SearchBackend, StaticEngineProvider};
    use async_trait::async_trait;
    use fedsearch_core::ActingIdentity;
    use std::sync::Mutex;

    /// Engine double that records what it was asked.
    struct RecordingEngine {
        available: bool,
        fail: bool,
        delay: Option<Duration>,
        check_delay: Option<Duration>,
        seen: Mutex<Vec<EngineQuery>>,
    }

    impl RecordingEngine {
        fn new() -> Self {
            Self {
                available: true,
                fail: false,
                delay: None,
                check_delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for RecordingEngine {
        async fn search(&self, _ctx: &RequestContext, query: &EngineQuery) -> Result<ResultSet> {
            self.seen.lock().unwrap().push(query.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::backend("shard failure: index_not_found"));
            }
            Ok(ResultSet::new(3, 1.5, Vec::new()))
        }

        async fn is_available(&self) -> bool {
            if let Some(delay) = self.check_delay {
                tokio::time::sleep(delay).await;
            }
            self.available
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(ActingIdentity {
            id: "1".into(),
            user_name: "admin".into(),
            is_admin: true,
        })
    }

    fn dispatcher(engine: Arc<RecordingEngine>) -> Dispatcher {
        let provider = StaticEngineProvider::new().with_engine("GlobalSearch", engine);
        Dispatcher::new(Arc::new(provider), "GlobalSearch")
    }

    fn accounts() -> QueryDescriptor {
        QueryDescriptor::new(vec!["Accounts".to_string()])
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let engine = Arc::new(RecordingEngine::new());
        let results = dispatcher(engine.clone())
            .dispatch(&ctx(), &accounts().with_term("acme"))
            .await
            .unwrap();

        assert_eq!(results.total_hits(), 3);
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].term.as_deref(), Some("acme"));
        assert_eq!(seen[0].modules, vec!["Accounts"]);
    }

    #[tokio::test]
    async fn test_empty_term_is_not_submitted() {
        let engine = Arc::new(RecordingEngine::new());
        dispatcher(engine.clone())
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0].term, None);
        assert_eq!(seen[0].modules, vec!["Accounts"]);
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let engine = Arc::new(RecordingEngine {
            available: false,
            ..RecordingEngine::new()
        });
        let err = dispatcher(engine.clone())
            .dispatch(&ctx(), &accounts().with_term("acme"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SearchUnavailable));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_scope_is_runtime_error() {
        let engine = Arc::new(RecordingEngine::new());
        let provider = StaticEngineProvider::new().with_engine("Other", engine);
        let err = Dispatcher::new(Arc::new(provider), "GlobalSearch")
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SearchRuntime));
    }

    #[tokio::test]
    async fn test_search_failure_hides_cause() {
        let engine = Arc::new(RecordingEngine {
            fail: true,
            ..RecordingEngine::new()
        });
        let err = dispatcher(engine)
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SearchRuntime));
        assert!(!err.to_string().contains("index_not_found"));
    }

    #[tokio::test]
    async fn test_timeout_is_runtime_error() {
        let engine = Arc::new(RecordingEngine {
            delay: Some(Duration::from_millis(200)),
            ..RecordingEngine::new()
        });
        let err = dispatcher(engine)
            .with_timeout(Some(Duration::from_millis(10)))
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SearchRuntime));
    }

    #[tokio::test]
    async fn test_hung_availability_check_is_runtime_error() {
        let engine = Arc::new(RecordingEngine {
            check_delay: Some(Duration::from_secs(3600)),
            ..RecordingEngine::new()
        });
        let err = dispatcher(engine.clone())
            .with_timeout(Some(Duration::from_millis(50)))
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SearchRuntime));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_availability_check_within_timeout() {
        let engine = Arc::new(RecordingEngine {
            check_delay: Some(Duration::from_millis(5)),
            ..RecordingEngine::new()
        });
        let results = dispatcher(engine)
            .with_timeout(Some(Duration::from_secs(5)))
            .dispatch(&ctx(), &accounts())
            .await
            .unwrap();

        assert_eq!(results.total_hits(), 3);
    }

    #[tokio::test]
    async fn test_unclamped_paging_reaches_engine() {
        let engine = Arc::new(RecordingEngine::new());
        dispatcher(engine.clone())
            .dispatch(&ctx(), &accounts().with_page(-3, 1_000_000))
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0].limit, -3);
        assert_eq!(seen[0].offset, 1_000_000);
    }
}
