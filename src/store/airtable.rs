use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::AirtableConfig;

use super::{ListOptions, Record, StoreError, TableStore};

/// Airtable REST API client. One instance is shared across all requests;
/// reqwest pools connections internally.
pub struct AirtableStore {
    http: reqwest::Client,
    api_key: String,
    base_id: String,
    endpoint_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Record>,
    /// Cursor for the next page of results, absent on the last page.
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<Value>,
}

impl AirtableStore {
    pub fn from_config(config: &AirtableConfig) -> Result<Self, StoreError> {
        if config.api_key.is_empty() {
            return Err(StoreError::Transport(
                "AIRTABLE_API_KEY is not configured".to_string(),
            ));
        }
        if config.base_id.is_empty() {
            return Err(StoreError::Transport(
                "AIRTABLE_BASE_ID is not configured".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(table.as_bytes()).collect();
        format!("{}/v0/{}/{}", self.endpoint_url, self.base_id, encoded)
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}", self.table_url(table), id)
    }

    /// Query-string pairs for a list call. Sort and field projections use
    /// Airtable's indexed bracket syntax.
    fn list_params(options: &ListOptions) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(filter) = &options.filter {
            params.push(("filterByFormula".to_string(), filter.to_formula()));
        }
        for (i, spec) in options.sort.iter().enumerate() {
            params.push((format!("sort[{}][field]", i), spec.field.clone()));
            params.push((format!("sort[{}][direction]", i), spec.direction.as_str().to_string()));
        }
        if let Some(max) = options.max_records {
            params.push(("maxRecords".to_string(), max.to_string()));
            params.push(("pageSize".to_string(), max.min(100).to_string()));
        }
        for field in &options.fields {
            params.push(("fields[]".to_string(), field.clone()));
        }

        params
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<UpstreamErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .map(|e| match e {
                Value::String(s) => s,
                Value::Object(map) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Value::Object(map).to_string()),
                other => other.to_string(),
            })
            .unwrap_or(body);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Upstream { status: status.as_u16(), message })
    }
}

#[async_trait]
impl TableStore for AirtableStore {
    async fn list(&self, table: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(table);
        let params = Self::list_params(options);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        // Follow the offset cursor until the window is filled or the table
        // is exhausted. maxRecords caps the total across pages server-side,
        // but the cursor loop is still required for windows above pageSize.
        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&params);
            if let Some(cursor) = &cursor {
                request = request.query(&[("offset", cursor.as_str())]);
            }

            let response = self.check(request.send().await?).await?;
            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

            records.extend(page.records);

            let done = page.offset.is_none()
                || options.max_records.is_some_and(|max| records.len() >= max);
            if done {
                break;
            }
            cursor = page.offset;
        }

        if let Some(max) = options.max_records {
            records.truncate(max);
        }
        Ok(records)
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let response = self
            .http
            .get(self.record_url(table, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match self.check(response).await {
            Ok(response) => {
                let record = response
                    .json()
                    .await
                    .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
                Ok(Some(record))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let response = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.api_key)
            // typecast lets select fields grow new options on the fly,
            // which the lookup-or-create flow depends on
            .json(&json!({ "fields": fields, "typecast": true }))
            .send()
            .await?;

        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let response = self
            .http
            .patch(self.record_url(table, id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields, "typecast": true }))
            .send()
            .await?;

        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.record_url(table, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        self.check(response).await?;
        Ok(())
    }
}
