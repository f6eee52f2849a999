use std::collections::{HashMap, HashSet};

use crate::filter::Expr;
use crate::store::{ListOptions, Record, TableStore};

/// Distinct linked ids for one field across a whole page. Feeding this to
/// `resolve_names` is what keeps lookups at one-per-table instead of
/// one-per-row.
pub fn collect_linked_ids(records: &[Record], field: &str) -> HashSet<String> {
    records
        .iter()
        .flat_map(|rec| rec.str_list(field))
        .collect()
}

/// Batched id→display-name map for a set of record ids, in a single
/// `RECORD_ID()` lookup. Failures degrade to an empty map (rows fall back
/// to raw ids) rather than failing the request.
pub async fn resolve_names(
    store: &dyn TableStore,
    table: &str,
    name_field: &str,
    ids: &HashSet<String>,
) -> HashMap<String, String> {
    if ids.is_empty() {
        return HashMap::new();
    }

    let options = ListOptions::filtered(Expr::RecordIdIn(ids.iter().cloned().collect()))
        .with_fields(&[name_field]);

    match store.list(table, &options).await {
        Ok(records) => records
            .into_iter()
            .filter_map(|rec| {
                let name = rec.str_field(name_field)?.to_string();
                Some((rec.id, name))
            })
            .collect(),
        Err(e) => {
            tracing::warn!(table, error = %e, "name resolution failed; returning raw ids");
            HashMap::new()
        }
    }
}

/// Display names for a linked field, falling back to the raw id when the
/// map has no entry for it.
pub fn display_list(record: &Record, field: &str, names: &HashMap<String, String>) -> Vec<String> {
    record
        .str_list(field)
        .into_iter()
        .map(|id| names.get(&id).cloned().unwrap_or(id))
        .collect()
}
