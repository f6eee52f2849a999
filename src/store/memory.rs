use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::filter::expr::DisplayResolver;
use crate::filter::sort::{SortDirection, SortSpec};

use super::{ListOptions, Record, StoreError, TableStore};

/// In-process `TableStore` used by the test suite. Evaluates the same
/// structured filters the Airtable client renders to formulas, including
/// linked-id display resolution, so scoping invariants hold offline too.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Base>,
}

#[derive(Default)]
struct Base {
    tables: HashMap<String, Table>,
}

struct Table {
    /// Field whose value stands in for the record when a link is rendered,
    /// mirroring Airtable primary fields inside ARRAYJOIN.
    primary_field: String,
    records: Vec<Record>,
}

impl DisplayResolver for Base {
    fn display(&self, record_id: &str) -> Option<String> {
        for table in self.tables.values() {
            if let Some(rec) = table.records.iter().find(|r| r.id == record_id) {
                return rec.str_field(&table.primary_field).map(str::to_string);
            }
        }
        None
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table(&self, name: &str, primary_field: &str) {
        let mut base = self.lock();
        base.tables.entry(name.to_string()).or_insert_with(|| Table {
            primary_field: primary_field.to_string(),
            records: Vec::new(),
        });
    }

    /// Insert a record with a generated id. `fields` must be a JSON object;
    /// intended for test seeding only.
    pub fn seed(&self, table: &str, fields: Value) -> Record {
        let id = mint_record_id();
        self.seed_with_id(table, &id, fields)
    }

    pub fn seed_with_id(&self, table: &str, id: &str, fields: Value) -> Record {
        let Value::Object(map) = fields else {
            panic!("seed fields must be a JSON object");
        };
        let record = Record::new(id, map);
        let mut base = self.lock();
        base.tables
            .entry(table.to_string())
            .or_insert_with(|| Table {
                primary_field: "Nom".to_string(),
                records: Vec::new(),
            })
            .records
            .push(record.clone());
        record
    }

    /// Snapshot of a table's rows, for assertions on write effects.
    pub fn dump(&self, table: &str) -> Vec<Record> {
        let base = self.lock();
        base.tables.get(table).map(|t| t.records.clone()).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Base> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mint_record_id() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("rec{}", &tail[..14])
}

fn cmp_field(a: &Record, b: &Record, field: &str) -> Ordering {
    let av = a.value(field);
    let bv = b.value(field);
    match (av, bv) {
        (None, None) => Ordering::Equal,
        // Missing values sort last, as Airtable does
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn sort_records(records: &mut [Record], specs: &[SortSpec]) {
    // Stable sort keeps insertion order on ties, matching the "stable
    // underlying order" guarantee in the API contract.
    records.sort_by(|a, b| {
        for spec in specs {
            let ord = match spec.direction {
                SortDirection::Asc => cmp_field(a, b, &spec.field),
                SortDirection::Desc => cmp_field(b, a, &spec.field),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn list(&self, table: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError> {
        let base = self.lock();
        let Some(t) = base.tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<Record> = t
            .records
            .iter()
            .filter(|rec| match &options.filter {
                Some(expr) => expr.eval(rec, &*base),
                None => true,
            })
            .cloned()
            .collect();

        sort_records(&mut records, &options.sort);

        if let Some(max) = options.max_records {
            records.truncate(max);
        }
        Ok(records)
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let base = self.lock();
        Ok(base
            .tables
            .get(table)
            .and_then(|t| t.records.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let record = Record::new(mint_record_id(), fields);
        let mut base = self.lock();
        base.tables
            .entry(table.to_string())
            .or_insert_with(|| Table {
                primary_field: "Nom".to_string(),
                records: Vec::new(),
            })
            .records
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let mut base = self.lock();
        let record = base
            .tables
            .get_mut(table)
            .and_then(|t| t.records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", table, id)))?;

        for (key, value) in fields {
            // A null clears the field, per the Airtable PATCH contract
            if value.is_null() {
                record.fields.remove(&key);
            } else {
                record.fields.insert(key, value);
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut base = self.lock();
        let t = base
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", table, id)))?;
        let before = t.records.len();
        t.records.retain(|r| r.id != id);
        if t.records.len() == before {
            return Err(StoreError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::expr::Expr;
    use serde_json::json;

    #[tokio::test]
    async fn filter_resolves_links_through_primary_fields() {
        let store = MemoryStore::new();
        store.register_table("Villes EPICU", "Ville EPICU");
        store.register_table("Établissements", "Nom de l'établissement");

        let lille = store.seed("Villes EPICU", json!({ "Ville EPICU": "Lille" }));
        store.seed(
            "Établissements",
            json!({ "Nom de l'établissement": "Le Bistrot", "Ville EPICU": [lille.id] }),
        );
        store.seed("Établissements", json!({ "Nom de l'établissement": "Autre" }));

        let options =
            ListOptions::filtered(Expr::contains_in_links("lille", "Ville EPICU"));
        let rows = store.list("Établissements", &options).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].str_field("Nom de l'établissement"), Some("Le Bistrot"));
    }

    #[tokio::test]
    async fn sort_and_truncate() {
        let store = MemoryStore::new();
        for name in ["b", "a", "c"] {
            store.seed("T", json!({ "Nom": name }));
        }
        let options = ListOptions::default()
            .with_sort(SortSpec { field: "Nom".into(), direction: SortDirection::Asc })
            .with_max(2);
        let rows = store.list("T", &options).await.unwrap();
        let names: Vec<_> = rows.iter().filter_map(|r| r.str_field("Nom")).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn update_merges_and_null_clears() {
        let store = MemoryStore::new();
        let rec = store.seed("T", json!({ "Nom": "x", "Statut": "Ouvert" }));

        let Value::Object(patch) = json!({ "Statut": Value::Null, "Email": "a@b.fr" }) else {
            unreachable!()
        };
        let updated = store.update("T", &rec.id, patch).await.unwrap();
        assert_eq!(updated.str_field("Nom"), Some("x"));
        assert_eq!(updated.str_field("Email"), Some("a@b.fr"));
        assert!(updated.value("Statut").is_none());
    }
}
