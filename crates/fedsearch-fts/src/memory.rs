//! In-memory search backend.
//!
//! `MemoryBackend` scans a fixed set of records. It stands in for a real
//! engine in development and tests, and behaves like one at the edges:
//! negative paging is rejected, totals count every match, and availability
//! can be switched off at runtime.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Instant;

use async_trait::async_trait;
use fedsearch_core::{
    Error, RawHit, Record, RequestContext, Result, ResultSet, SortDirection, SortField,
};
use serde_json::Value;

use crate::backend::{EngineQuery, SearchBackend};
use crate::document::SearchDocument;

/// Linear-scan search backend.
///
/// # Limitations
///
/// - O(n) search time
/// - No stemming or fuzzy matching
/// - ASCII case-insensitive substring matching only
pub struct MemoryBackend {
    documents: Vec<SearchDocument>,
    available: AtomicBool,
}

impl MemoryBackend {
    /// Create a backend over `records`, in the given order.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            documents: records.into_iter().map(SearchDocument::new).collect(),
            available: AtomicBool::new(true),
        }
    }

    /// Mark the backend available or unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the backend holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn to_hit(doc: &SearchDocument, query: &EngineQuery) -> RawHit {
        let mut hit =
            RawHit::new(doc.record().reference()).with_data_fields(doc.data_fields());
        if let Some(term) = query.term.as_deref() {
            hit = hit.with_score(doc.relevance(term));
            if query.highlights {
                hit = hit.with_highlights(doc.highlights(term));
            }
        }
        hit
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, ctx: &RequestContext, query: &EngineQuery) -> Result<ResultSet> {
        let started = Instant::now();

        let limit = usize::try_from(query.limit)
            .map_err(|_| Error::backend(format!("invalid size [{}]", query.limit)))?;
        let offset = usize::try_from(query.offset)
            .map_err(|_| Error::backend(format!("invalid from [{}]", query.offset)))?;

        log::debug!(
            "[{}] MemoryBackend: modules={:?}, term={:?}, limit={limit}, offset={offset}",
            ctx.request_id(),
            query.modules,
            query.term
        );

        // Module order follows the request; record order within a module
        // follows insertion.
        let mut matches: Vec<(&SearchDocument, f64)> = query
            .modules
            .iter()
            .flat_map(|module| self.documents.iter().filter(move |d| d.module() == module))
            .filter_map(|doc| match query.term.as_deref() {
                Some(term) if doc.matches_query(term) => Some((doc, doc.relevance(term))),
                Some(_) => None,
                None => Some((doc, 0.0)),
            })
            .collect();

        if !query.sort.is_empty() {
            matches.sort_by(|(a, _), (b, _)| compare_by_sort(a.record(), b.record(), &query.sort));
        } else if query.term.is_some() {
            matches.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        }

        let total = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(doc, _)| Self::to_hit(doc, query))
            .collect();

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        Ok(ResultSet::new(total, elapsed_ms, hits))
    }

    async fn is_available(&self) -> bool {
        self.available.load(AtomicOrdering::SeqCst)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("documents", &self.documents.len())
            .field("available", &self.available.load(AtomicOrdering::SeqCst))
            .finish()
    }
}

fn compare_by_sort(a: &Record, b: &Record, sort: &[SortField]) -> Ordering {
    for key in sort {
        let ordering = compare_values(a.fields.get(&key.field), b.fields.get(&key.field));
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing and null values sort after everything else.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
