//! Data model for the search pipeline.
//!
//! Every type here lives for a single request: the descriptor is built by
//! the normalizer, the result set by a search backend, and the formatted
//! records by the result formatter. Nothing is cached across requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Page size used when `max_num` is absent.
pub const DEFAULT_LIMIT: i64 = 20;

/// Offset used when `offset` is absent.
pub const DEFAULT_OFFSET: i64 = 0;

// ============================================================================
// Identity and request context
// ============================================================================

/// The administrative identity a request executes as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingIdentity {
    /// Record id of the user.
    pub id: String,
    /// Login name used as the lookup key.
    pub user_name: String,
    /// Whether the user carries administrative rights.
    #[serde(default)]
    pub is_admin: bool,
}

/// Per-request context threaded through the dispatcher and formatter.
///
/// Owns the acting identity for exactly one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: ActingIdentity,
    request_id: Uuid,
}

impl RequestContext {
    /// Create a context for a new request.
    pub fn new(identity: ActingIdentity) -> Self {
        Self {
            identity,
            request_id: Uuid::new_v4(),
        }
    }

    /// The identity this request acts as.
    pub fn identity(&self) -> &ActingIdentity {
        &self.identity
    }

    /// Correlation id for log lines.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

// ============================================================================
// Query descriptor
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One `(field, direction)` sort pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field to sort on.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Create a sort pair.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Validated, typed search query.
///
/// `limit` and `offset` are carried as parsed, without range checks; the
/// search backend is the backstop for out-of-range values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Free-text term. Empty means browse.
    pub term: String,
    /// Modules to search, in request order. Never empty.
    pub modules: Vec<String>,
    /// Page size.
    pub limit: i64,
    /// Page start.
    pub offset: i64,
    /// Sort pairs, in priority order.
    pub sort: Vec<SortField>,
    /// Whether the engine should produce highlight fragments.
    pub highlights: bool,
}

impl QueryDescriptor {
    /// Create a descriptor with default paging, no sort, and highlights on.
    pub fn new(modules: Vec<String>) -> Self {
        Self {
            term: String::new(),
            modules,
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            sort: Vec::new(),
            highlights: true,
        }
    }

    /// Set the free-text term.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    /// Set limit and offset.
    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// The term to submit to the engine, or `None` when browsing.
    pub fn search_term(&self) -> Option<&str> {
        if self.term.is_empty() {
            None
        } else {
            Some(&self.term)
        }
    }
}

// ============================================================================
// Engine results
// ============================================================================

/// Reference sufficient to materialize a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Module the record belongs to.
    pub module: String,
    /// Record id within the module.
    pub id: String,
}

impl RecordRef {
    /// Create a record reference.
    pub fn new(module: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            id: id.into(),
        }
    }

    /// Module-qualified identifier, `Module:id`.
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.module, self.id)
    }
}

/// One hit as returned by the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Record this hit points at.
    pub reference: RecordRef,
    /// Relevance score, if the engine computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Field name to highlighted snippet(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Map<String, Value>>,
    /// Fields the hit advertises for materialization.
    #[serde(default)]
    pub data_fields: Vec<String>,
}

impl RawHit {
    /// Create a hit with no score, highlights, or advertised fields.
    pub fn new(reference: RecordRef) -> Self {
        Self {
            reference,
            score: None,
            highlights: None,
            data_fields: Vec::new(),
        }
    }

    /// Set the relevance score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the highlight map.
    pub fn with_highlights(mut self, highlights: Map<String, Value>) -> Self {
        self.highlights = Some(highlights);
        self
    }

    /// Set the advertised data fields.
    pub fn with_data_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Raw result set of one search call. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    total_hits: u64,
    query_time_ms: f64,
    hits: Vec<RawHit>,
}

impl ResultSet {
    /// Build a result set.
    pub fn new(total_hits: u64, query_time_ms: f64, hits: Vec<RawHit>) -> Self {
        Self {
            total_hits,
            query_time_ms,
            hits,
        }
    }

    /// An empty result set.
    pub fn empty() -> Self {
        Self::new(0, 0.0, Vec::new())
    }

    /// Total number of matching records, independent of paging.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// Time the engine spent on the query, in milliseconds.
    pub fn query_time_ms(&self) -> f64 {
        self.query_time_ms
    }

    /// Hits of the requested page, in engine order.
    pub fn hits(&self) -> &[RawHit] {
        &self.hits
    }
}

// ============================================================================
// Records
// ============================================================================

/// Email-address substructure of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddressSet {
    /// Address entries.
    #[serde(default)]
    pub addresses: Vec<Value>,
    /// Whether the addresses are already loaded.
    #[serde(default)]
    pub fetched: bool,
}

/// A fully materialized record ("bean").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record id.
    pub id: String,
    /// Module the record belongs to.
    pub module: String,
    /// Field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Email-address substructure, for modules that carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<EmailAddressSet>,
}

impl Record {
    /// Create an empty record.
    pub fn new(module: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module: module.into(),
            fields: Map::new(),
            email_address: None,
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach an email-address substructure.
    pub fn with_email_address(mut self, email_address: EmailAddressSet) -> Self {
        self.email_address = Some(email_address);
        self
    }

    /// Reference to this record.
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(&self.module, &self.id)
    }
}

/// Client-facing record.
///
/// Serializes as a flat JSON object. The email substructure is kept as
/// internal state for inspection and is not serialized on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormattedRecord {
    #[serde(flatten)]
    values: Map<String, Value>,
    #[serde(skip)]
    email_address: Option<EmailAddressSet>,
}

impl FormattedRecord {
    /// Build from projected values and the record's email substructure.
    pub fn new(values: Map<String, Value>, email_address: Option<EmailAddressSet>) -> Self {
        Self {
            values,
            email_address,
        }
    }

    /// Output values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Look up one output value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` is present with a non-null value.
    pub fn has_value(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !v.is_null())
    }

    /// Set an output value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// The record's email substructure, as reconciled by the formatter.
    pub fn email_address(&self) -> Option<&EmailAddressSet> {
        self.email_address.as_ref()
    }
}

// ============================================================================
// Tests
// ============================================================================
