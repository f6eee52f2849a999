use serde_json::{Map, Value};

use crate::filter::Expr;
use crate::store::record::is_record_id;
use crate::store::{ListOptions, TableStore};

/// Resolve a candidate value to a record id in `table`, creating the record
/// when nothing matches. The candidate may already be a record id (returned
/// unchanged) or free text matched case-insensitively against each of
/// `match_fields` in order; a miss creates a record with the first field as
/// the name column.
///
/// Best-effort: any store failure returns None (the caller omits the link)
/// and logs a warning. Only idempotent within a single request; two
/// concurrent requests can still create duplicates, there is no server-side
/// uniqueness.
pub async fn ensure_linked(
    store: &dyn TableStore,
    table: &str,
    candidate: &str,
    match_fields: &[&str],
) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    if is_record_id(candidate) {
        return Some(candidate.to_string());
    }

    for field in match_fields {
        let options = ListOptions::filtered(Expr::case_eq(*field, candidate)).with_max(1);
        match store.list(table, &options).await {
            Ok(records) => {
                if let Some(existing) = records.into_iter().next() {
                    return Some(existing.id);
                }
            }
            Err(e) => {
                tracing::warn!(table, candidate, error = %e, "linked-record lookup failed");
                return None;
            }
        }
    }

    let Some(name_field) = match_fields.first() else {
        return None;
    };
    let mut fields = Map::new();
    fields.insert(name_field.to_string(), Value::String(candidate.to_string()));

    match store.create(table, fields).await {
        Ok(record) => Some(record.id),
        Err(e) => {
            tracing::warn!(table, candidate, error = %e, "linked-record creation failed");
            None
        }
    }
}

/// Resolve up to `max` candidates, dropping the ones that fail. Used for
/// establishment categories, which are capped at two.
pub async fn ensure_linked_all(
    store: &dyn TableStore,
    table: &str,
    candidates: &[String],
    match_fields: &[&str],
    max: usize,
) -> Vec<String> {
    let mut ids = Vec::new();
    for candidate in candidates.iter().take(max) {
        if let Some(id) = ensure_linked(store, table, candidate, match_fields).await {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}
