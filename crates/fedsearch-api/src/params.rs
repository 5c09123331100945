//! Query normalization.
//!
//! Turns loosely-typed request parameters into a [`QueryDescriptor`]. Values
//! arrive as JSON (from a POST body) or as strings (from the query string),
//! so every field is coerced rather than deserialized strictly.
//!
//! | parameter | field | default |
//! |---|---|---|
//! | `q` | `term` | `""` |
//! | `module_list` | `modules` | required |
//! | `max_num` | `limit` | 20 |
//! | `offset` | `offset` | 0 |
//! | `highlights` | `highlights` | `true` |
//! | `sort` | `sort` | none |

use axum::extract::Query;
use fedsearch_core::{
    DEFAULT_LIMIT, DEFAULT_OFFSET, Error, QueryDescriptor, Result, SortDirection, SortField,
};
use http::Uri;
use serde_json::{Map, Value};

/// Wire name of the required module list.
pub const MODULE_LIST: &str = "module_list";

/// Build a [`QueryDescriptor`] from raw parameters.
///
/// # Errors
///
/// `MissingParameter("module_list")` when the module list is absent, a
/// string that is blank after trimming, or an empty list. Nothing else is
/// rejected: malformed sort input is dropped and unparseable numbers
/// coerce to 0.
pub fn normalize(params: &Map<String, Value>) -> Result<QueryDescriptor> {
    let modules = params
        .get(MODULE_LIST)
        .and_then(module_list)
        .ok_or_else(|| Error::missing_parameter(MODULE_LIST))?;

    let mut descriptor = QueryDescriptor::new(modules);

    if let Some(term) = present(params, "q") {
        descriptor.term = scalar_string(term);
    }
    descriptor.limit = present(params, "max_num").map_or(DEFAULT_LIMIT, int_value);
    descriptor.offset = present(params, "offset").map_or(DEFAULT_OFFSET, int_value);
    if let Some(flag) = present(params, "highlights") {
        descriptor.highlights = bool_value(flag);
    }
    if let Some(sort) = present(params, "sort") {
        descriptor.sort = sort_spec(sort).unwrap_or_default();
    }

    Ok(descriptor)
}

/// Collect query-string parameters into a JSON map.
///
/// Bracketed keys nest the way form encoders write them: `a[]=x` appends
/// to a list, `a[0][]=x` and `a[0][1]=y` build nested lists, and a
/// non-numeric index (`a[k]=x`) builds an object. A plain key given more
/// than once collects into a list in order of appearance. An unparseable
/// query string yields an empty map.
pub fn query_params(uri: &Uri) -> Map<String, Value> {
    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            log::debug!("Ignoring unparseable query string: {e}");
            return Map::new();
        }
    };

    let mut params = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        let (base, path) = split_key(&key);

        if !path.is_empty() {
            let slot = params
                .entry(base.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            insert_path(slot, &path, value);
            continue;
        }

        match params.get_mut(base) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(base.to_string(), value);
            }
        }
    }

    for value in params.values_mut() {
        index_maps_to_lists(value);
    }
    params
}

/// Split `sort[0][]` into `("sort", ["0", ""])`. Keys without a complete
/// bracket group are returned whole.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[').filter(|&i| i > 0) else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);

    let mut path = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else { break };
        path.push(&inner[..close]);
        rest = &inner[close + 1..];
    }

    if path.is_empty() {
        (key, path)
    } else {
        (base, path)
    }
}

/// Store `value` under `path` below `slot`. An empty segment appends at
/// the next free integer index.
fn insert_path(slot: &mut Value, path: &[&str], value: Value) {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let Value::Object(map) = slot else {
        return;
    };

    let key = match path[0] {
        "" => next_index(map).to_string(),
        segment => segment.to_string(),
    };

    if path.len() == 1 {
        map.insert(key, value);
    } else {
        let child = map.entry(key).or_insert(Value::Null);
        insert_path(child, &path[1..], value);
    }
}

fn next_index(map: &Map<String, Value>) -> usize {
    map.keys()
        .filter_map(|k| k.parse::<usize>().ok())
        .max()
        .map_or(0, |i| i + 1)
}

/// Turn every object whose keys are exactly `0..n` into a list, deepest
/// first.
fn index_maps_to_lists(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };
    for child in map.values_mut() {
        index_maps_to_lists(child);
    }

    let mut indexed: Vec<(usize, Value)> = Vec::with_capacity(map.len());
    for (key, child) in map.iter() {
        match key.parse::<usize>() {
            Ok(i) if i.to_string() == *key => indexed.push((i, child.clone())),
            _ => return,
        }
    }
    indexed.sort_by_key(|(i, _)| *i);
    if indexed.iter().enumerate().all(|(pos, (i, _))| pos == *i) {
        *value = Value::Array(indexed.into_iter().map(|(_, v)| v).collect());
    }
}

/// Overlay `body` onto `params`; body values win.
pub fn merge_body(params: &mut Map<String, Value>, body: Map<String, Value>) {
    params.extend(body);
}

fn present<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|v| !v.is_null())
}

/// Module names, or `None` when the list counts as missing.
///
/// Only the list as a whole is checked for blankness; a string splits on
/// `,` with its entries kept as written.
fn module_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(items.iter().map(scalar_string).collect()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.split(',').map(str::to_string).collect()),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(map.values().map(scalar_string).collect()),
        other => Some(vec![scalar_string(other)]),
    }
}

/// Render a scalar as a string. Booleans follow the `"1"`/`""` convention
/// of form values; arrays and objects render empty.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Coerce to an integer.
fn int_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_int(s),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// Integer value of the leading numeric prefix of `s`, after leading
/// whitespace. `"12abc"` is 12, `"1e3"` is 1000, `"2.9"` is 2, `"abc"` is 0.
/// Integer prefixes saturate on overflow; decimal or exponent prefixes
/// truncate toward zero.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = sign + digit_run(&bytes[sign..]);
    let mut end = int_end;
    let mut decimal = false;

    if bytes.get(end) == Some(&b'.') {
        let frac = digit_run(&bytes[end + 1..]);
        if frac > 0 || int_end > sign {
            decimal = true;
            end += 1 + frac;
        }
    }
    if end == sign {
        return 0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = digit_run(&bytes[exp..]);
        if digits > 0 {
            decimal = true;
            end = exp + digits;
        }
    }

    if decimal {
        return s[..end].parse::<f64>().map_or(0, |f| f as i64);
    }

    let negative = bytes.first() == Some(&b'-');
    let mut acc: i64 = 0;
    for &d in &bytes[sign..int_end] {
        let d = i64::from(d - b'0');
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        };
    }
    acc
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Coerce to a boolean. Only the strings `""` and `"0"` are false.
fn bool_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.as_str(), "" | "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

/// Parse a sort list. `None` if any element is malformed.
fn sort_spec(value: &Value) -> Option<Vec<SortField>> {
    value.as_array()?.iter().map(sort_pair).collect()
}

fn sort_pair(value: &Value) -> Option<SortField> {
    let (field, direction) = match value {
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        Value::Object(map) => (map.get("field")?, map.get("direction")?),
        _ => return None,
    };

    let field = field.as_str().filter(|f| !f.trim().is_empty())?;
    let direction = SortDirection::parse(direction.as_str()?)?;
    Some(SortField::new(field, direction))
}

// ============================================================================
// Tests
// ============================================================================
