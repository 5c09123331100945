//! Result formatting.
//!
//! Each raw hit is materialized into its full record, reconciled with the
//! record's email substructure, projected onto the fields the hit
//! advertises, and decorated with `_score` and `_highlights`. Hits are
//! processed in engine order and one failure aborts the whole page.

use fedsearch_core::{
    Error, FormattedRecord, RawHit, Record, RecordStore, RequestContext, Result, ResultSet,
};
use serde_json::{Map, Value};

/// Output key holding the record's module.
pub const MODULE_KEY: &str = "_module";

/// Output key holding the relevance score.
pub const SCORE_KEY: &str = "_score";

/// Output key holding highlight fragments.
pub const HIGHLIGHTS_KEY: &str = "_highlights";

const EMAIL_FIELD: &str = "email";

/// Format every hit of `results`, in order.
///
/// # Errors
///
/// `SearchRuntime` if any record fails to materialize. No partial page is
/// returned.
pub async fn format_results(
    store: &dyn RecordStore,
    ctx: &RequestContext,
    results: &ResultSet,
) -> Result<Vec<FormattedRecord>> {
    let mut formatted = Vec::with_capacity(results.hits().len());
    for hit in results.hits() {
        let record = store
            .materialize(ctx, &hit.reference, &hit.data_fields)
            .await
            .map_err(|e| {
                log::error!(
                    "[{}] Could not materialize {}: {e}",
                    ctx.request_id(),
                    hit.reference.qualified_id()
                );
                Error::SearchRuntime
            })?;
        formatted.push(format_hit(hit, record));
    }
    Ok(formatted)
}

/// Format one hit against its materialized record.
pub fn format_hit(hit: &RawHit, mut record: Record) -> FormattedRecord {
    splice_email(&mut record);

    let mut output = project(&record, &hit.data_fields);

    if let Some(score) = hit.score {
        output.insert(SCORE_KEY, Value::from(score));
    }

    if let Some(highlights) = hit.highlights.as_ref().filter(|h| !h.is_empty()) {
        let kept: Map<String, Value> = highlights
            .iter()
            .filter(|(field, _)| output.has_value(field))
            .map(|(field, snippet)| (field.clone(), snippet.clone()))
            .collect();
        output.insert(HIGHLIGHTS_KEY, Value::Object(kept));
    }

    output
}

/// Copy a plain `email` value into the record's address list.
///
/// A list replaces the addresses; a scalar becomes a single address. The
/// substructure is marked fetched so nothing reloads it.
fn splice_email(record: &mut Record) {
    let Some(email) = record.fields.get(EMAIL_FIELD).filter(|v| !v.is_null()) else {
        return;
    };
    let Some(set) = record.email_address.as_mut() else {
        return;
    };

    set.addresses = match email {
        Value::Array(items) => items.clone(),
        scalar => vec![scalar.clone()],
    };
    set.fetched = true;
}

/// Project `record` onto `fields`. An empty field list keeps every field.
fn project(record: &Record, fields: &[String]) -> FormattedRecord {
    let mut values = Map::new();
    values.insert("id".to_string(), Value::String(record.id.clone()));
    values.insert(MODULE_KEY.to_string(), Value::String(record.module.clone()));

    let names: Vec<&String> = if fields.is_empty() {
        record.fields.keys().collect()
    } else {
        fields.iter().collect()
    };

    for name in names {
        let value = match (name.as_str(), &record.email_address) {
            (EMAIL_FIELD, Some(set)) => Some(Value::Array(set.addresses.clone())),
            _ => record.fields.get(name).cloned(),
        };
        if let Some(value) = value {
            values.insert(name.clone(), value);
        }
    }

    FormattedRecord::new(values, record.email_address.clone())
}

// ============================================================================
// Tests
// ============================================================================
