use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::config;
use crate::error::{ApiError, ApiResult};
use crate::filter::PageParams;
use crate::services::resolve_scope;
use crate::store::{ListOptions, Record};

use super::{body_str, page_body};

const F_SUJET: &str = "Sujet";
const F_DESCRIPTION: &str = "Description";
const F_TYPE: &str = "Type";
const F_STATUT: &str = "Statut";
const F_COLLABORATEUR: &str = "Collaborateur";

const STATUT_OUVERT: &str = "Ouvert";

const ALLOWED_SORTS: &[&str] = &[F_SUJET, F_STATUT];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
}

/// GET /api/help - the caller's own support tickets.
///
/// Link fields hold record ids, which formulas cannot match against, so
/// ownership is filtered here after the fetch.
pub async fn get(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let params = PageParams::from_query(
        query.limit,
        query.offset,
        query.order_by.as_deref(),
        query.order.as_deref(),
        50,
        ALLOWED_SORTS,
        F_SUJET,
    );

    let options = ListOptions::default().with_sort(params.sort.clone());
    let records = state
        .store
        .list(&config::config().tables.tickets, &options)
        .await?;
    let mut mine: Vec<Record> = records
        .into_iter()
        .filter(|rec| rec.str_list(F_COLLABORATEUR).iter().any(|id| id == &user.user_id))
        .collect();
    // Window after the ownership filter; the truncate stands in for the
    // maxRecords cap the store applies on formula-filterable routes
    mine.truncate(params.window_size());
    let (page, pagination) = crate::api::window(mine, &params);

    let rows: Vec<Value> = page.iter().map(map_row).collect();
    Ok(Json(page_body("tickets", rows, &pagination)))
}

/// POST /api/help - open a support ticket
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;

    let sujet = body_str(&payload, "sujet").ok_or_else(|| ApiError::validation("Sujet requis"))?;
    let description = body_str(&payload, "description")
        .ok_or_else(|| ApiError::validation("Description requise"))?;

    let mut fields = Map::new();
    fields.insert(F_SUJET.to_string(), Value::String(sujet));
    fields.insert(F_DESCRIPTION.to_string(), Value::String(description));
    if let Some(kind) = body_str(&payload, "type") {
        fields.insert(F_TYPE.to_string(), Value::String(kind));
    }
    fields.insert(F_STATUT.to_string(), Value::String(STATUT_OUVERT.to_string()));
    fields.insert(F_COLLABORATEUR.to_string(), json!([user.user_id]));

    let created = state
        .store
        .create(&config::config().tables.tickets, fields)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "ticket": map_row(&created) }))))
}

fn map_row(rec: &Record) -> Value {
    json!({
        "id": rec.id,
        "sujet": rec.str_field(F_SUJET),
        "description": rec.str_field(F_DESCRIPTION),
        "type": rec.str_field(F_TYPE),
        "statut": rec.str_field(F_STATUT),
    })
}
