pub mod airtable;
pub mod memory;
pub mod record;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::filter::expr::Expr;
use crate::filter::sort::SortSpec;

pub use airtable::AirtableStore;
pub use memory::MemoryStore;
pub use record::Record;

/// Query options for a table listing. `max_records` caps the total fetch
/// (the fetch-then-slice pagination window); `fields` trims the payload for
/// batched name lookups.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: Option<Expr>,
    pub sort: Vec<SortSpec>,
    pub max_records: Option<usize>,
    pub fields: Vec<String>,
}

impl ListOptions {
    pub fn filtered(filter: Expr) -> Self {
        Self { filter: Some(filter), ..Default::default() }
    }

    pub fn with_max(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Seam between the API and the external tabular store. The production
/// implementation talks to Airtable over REST; tests run against an
/// in-memory store so every scoping invariant is checkable offline.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn list(&self, table: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError>;

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError>;

    async fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}
