//! Elasticsearch search backend.
//!
//! Each module maps to one index, `{index_prefix}{module lowercased}`. A
//! query over several modules is a single `_search` over the comma-joined
//! index list. Availability is read from `_cluster/health`.

use std::time::Instant;

use async_trait::async_trait;
use fedsearch_core::{Error, RawHit, RecordRef, RequestContext, Result, ResultSet};
use serde_json::{Map, Value, json};

use crate::backend::{EngineQuery, SearchBackend};
use crate::document::{HIGHLIGHT_POST, HIGHLIGHT_PRE};

/// Elasticsearch backend over HTTP.
pub struct ElasticBackend {
    base_url: String,
    index_prefix: String,
    client: reqwest::Client,
}

impl ElasticBackend {
    /// Create a backend for the cluster at `base_url`.
    pub fn new(base_url: &str, index_prefix: &str) -> Self {
        Self::with_client(base_url, index_prefix, reqwest::Client::new())
    }

    /// Create a backend with a preconfigured HTTP client.
    pub fn with_client(base_url: &str, index_prefix: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index_prefix: index_prefix.to_string(),
            client,
        }
    }

    /// Index name for a module.
    pub fn index_name(&self, module: &str) -> String {
        format!("{}{}", self.index_prefix, module.to_lowercase())
    }

    /// Map an index name back to the requested module it came from.
    fn module_for_index<'a>(&self, index: &'a str, modules: &'a [String]) -> &'a str {
        modules
            .iter()
            .find(|m| self.index_name(m) == index)
            .map(String::as_str)
            .unwrap_or(index)
    }

    /// Build the `_search` request body.
    ///
    /// `from` and `size` are passed through as given; the cluster rejects
    /// values it cannot serve.
    pub fn request_body(query: &EngineQuery) -> Value {
        let clause = match query.term.as_deref() {
            Some(term) => json!({
                "multi_match": { "query": term, "fields": ["*"], "lenient": true }
            }),
            None => json!({ "match_all": {} }),
        };

        let mut body = json!({
            "from": query.offset,
            "size": query.limit,
            "track_total_hits": true,
            "query": clause,
        });

        if !query.sort.is_empty() {
            body["sort"] = query
                .sort
                .iter()
                .map(|s| {
                    let mut clause = Map::new();
                    clause.insert(s.field.clone(), json!({ "order": s.direction.as_str() }));
                    Value::Object(clause)
                })
                .collect();
        }

        if query.highlights {
            body["highlight"] = json!({
                "pre_tags": [HIGHLIGHT_PRE],
                "post_tags": [HIGHLIGHT_POST],
                "fields": { "*": {} },
            });
        }

        body
    }

    /// Parse a `_search` response into a result set.
    pub fn parse_response(&self, body: &Value, modules: &[String]) -> Result<ResultSet> {
        let hits = body
            .get("hits")
            .ok_or_else(|| Error::backend("search response has no 'hits' object"))?;

        // 7.x+ reports {"value": n}; older clusters a bare number
        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::Object(o)) => o.get("value").and_then(Value::as_u64),
            _ => None,
        }
        .ok_or_else(|| Error::backend("search response has no total hit count"))?;

        let took = body.get("took").and_then(Value::as_f64).unwrap_or(0.0);

        let raw_hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let parsed = raw_hits
            .iter()
            .map(|hit| self.parse_hit(hit, modules))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultSet::new(total, took, parsed))
    }

    fn parse_hit(&self, hit: &Value, modules: &[String]) -> Result<RawHit> {
        let index = hit
            .get("_index")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::backend("hit has no '_index'"))?;
        let id = hit
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::backend("hit has no '_id'"))?;

        let module = self.module_for_index(index, modules);
        let mut raw = RawHit::new(RecordRef::new(module, id));

        if let Some(score) = hit.get("_score").and_then(Value::as_f64) {
            raw = raw.with_score(score);
        }
        if let Some(highlight) = hit.get("highlight").and_then(Value::as_object) {
            raw = raw.with_highlights(highlight.clone());
        }
        if let Some(source) = hit.get("_source").and_then(Value::as_object) {
            raw = raw.with_data_fields(source.keys().cloned());
        }

        Ok(raw)
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn search(&self, ctx: &RequestContext, query: &EngineQuery) -> Result<ResultSet> {
        let indices = query
            .modules
            .iter()
            .map(|m| self.index_name(m))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/{indices}/_search", self.base_url);
        let body = Self::request_body(query);

        log::debug!("[{}] POST {url}", ctx.request_id());
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::backend(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::backend(format!("search rejected (HTTP {status})")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::backend(format!("search response parse failed: {e}")))?;

        log::debug!(
            "[{}] Elasticsearch answered in {:.1}ms",
            ctx.request_id(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        self.parse_response(&payload, &query.modules)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/_cluster/health", self.base_url);
        let health: Map<String, Value> = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(health) => health,
                Err(e) => {
                    log::warn!("Cluster health unreadable: {e}");
                    return false;
                }
            },
            Ok(resp) => {
                log::warn!("Cluster health check returned HTTP {}", resp.status());
                return false;
            }
            Err(e) => {
                log::warn!("Cluster health check failed: {e}");
                return false;
            }
        };

        match health.get("status").and_then(Value::as_str) {
            Some("red") | None => false,
            Some(_) => true,
        }
    }

    fn name(&self) -> &str {
        "elastic"
    }
}

impl std::fmt::Debug for ElasticBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticBackend")
            .field("base_url", &self.base_url)
            .field("index_prefix", &self.index_prefix)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
