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
use crate::filter::{parse_date_param, PageParams};
use crate::services::names::{collect_linked_ids, display_list, resolve_names};
use crate::services::scope::CallerScope;
use crate::services::{ensure_linked, resolve_scope};
use crate::store::{Record, TableStore};

use super::etablissements::{F_NOM as F_ETAB_NOM, F_VILLE_EPICU};
use super::{body_str, empty_page, page_body};

const F_DATE: &str = "Date";
const F_TYPE: &str = "Type";
const F_DESCRIPTION: &str = "Description";
const F_ETABLISSEMENT: &str = "Établissement";
const F_COLLABORATEUR: &str = "Collaborateur";

const ALLOWED_SORTS: &[&str] = &[F_DATE, F_TYPE];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    #[serde(rename = "dateStart")]
    pub date_start: Option<String>,
    #[serde(rename = "dateEnd")]
    pub date_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// GET /api/agenda - city-scoped events within an optional date window
pub async fn get(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let params = PageParams::from_query(
        query.limit,
        query.offset,
        query.order_by.as_deref(),
        query.order.as_deref(),
        20,
        ALLOWED_SORTS,
        F_DATE,
    );

    let mut sq = scope.query(F_VILLE_EPICU);
    if sq.is_empty_scope() {
        return Ok(Json(empty_page("evenements", &params)));
    }
    sq.search(query.q.as_deref(), &[F_DESCRIPTION, F_TYPE]);
    sq.eq_filter(F_TYPE, query.event_type.as_deref());
    sq.date_window(
        F_DATE,
        parse_date_param(query.date_start.as_deref(), "dateStart")?,
        parse_date_param(query.date_end.as_deref(), "dateEnd")?,
    );

    let records = state
        .store
        .list(&config::config().tables.agenda, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(state.store.as_ref(), &page, &scope).await;

    Ok(Json(page_body("evenements", rows, &pagination)))
}

/// POST /api/agenda - create an event; the date is mandatory
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let date = body_str(&payload, "date").ok_or_else(|| ApiError::validation("Date requise"))?;

    let mut fields = Map::new();
    fields.insert(F_DATE.to_string(), Value::String(date));
    if let Some(event_type) = body_str(&payload, "type") {
        fields.insert(F_TYPE.to_string(), Value::String(event_type));
    }
    if let Some(description) = body_str(&payload, "description") {
        fields.insert(F_DESCRIPTION.to_string(), Value::String(description));
    }
    // The event is always attributed to its creator
    fields.insert(F_COLLABORATEUR.to_string(), json!([user.user_id]));
    resolve_links(state.store.as_ref(), &payload, &mut fields).await;

    let created = state.store.create(&config::config().tables.agenda, fields).await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&created), &scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok((StatusCode::CREATED, Json(json!({ "evenement": row }))))
}

/// PATCH /api/agenda?id=recX - partial update
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let mut fields = Map::new();
    for (key, field) in [("date", F_DATE), ("type", F_TYPE), ("description", F_DESCRIPTION)] {
        if let Some(value) = body_str(&payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    resolve_links(state.store.as_ref(), &payload, &mut fields).await;
    if fields.is_empty() {
        return Err(ApiError::validation("Aucun champ à mettre à jour"));
    }

    let updated = state
        .store
        .update(&config::config().tables.agenda, &id, fields)
        .await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&updated), &scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "evenement": row })))
}

/// DELETE /api/agenda?id=recX
pub async fn delete(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;
    state.store.delete(&config::config().tables.agenda, &id).await?;
    Ok(Json(json!({ "deleted": true, "id": id })))
}

async fn resolve_links(store: &dyn TableStore, payload: &Value, fields: &mut Map<String, Value>) {
    let tables = &config::config().tables;
    if let Some(etablissement) = body_str(payload, "etablissement") {
        if let Some(id) =
            ensure_linked(store, &tables.etablissements, &etablissement, &[F_ETAB_NOM]).await
        {
            fields.insert(F_ETABLISSEMENT.to_string(), json!([id]));
        }
    }
    if let Some(ville) = body_str(payload, "ville") {
        if let Some(id) = ensure_linked(store, &tables.villes, &ville, &[F_VILLE_EPICU]).await {
            fields.insert(F_VILLE_EPICU.to_string(), json!([id]));
        }
    }
}

async fn map_rows(store: &dyn TableStore, records: &[Record], _scope: &CallerScope) -> Vec<Value> {
    let tables = &config::config().tables;
    let etab_ids = collect_linked_ids(records, F_ETABLISSEMENT);
    let ville_ids = collect_linked_ids(records, F_VILLE_EPICU);
    let collab_ids = collect_linked_ids(records, F_COLLABORATEUR);

    let (etabs, villes, collabs) = tokio::join!(
        resolve_names(store, &tables.etablissements, F_ETAB_NOM, &etab_ids),
        resolve_names(store, &tables.villes, F_VILLE_EPICU, &ville_ids),
        resolve_names(store, &tables.collaborateurs, "Nom", &collab_ids),
    );

    records
        .iter()
        .map(|rec| {
            json!({
                "id": rec.id,
                "date": rec.str_field(F_DATE),
                "type": rec.str_field(F_TYPE),
                "description": rec.str_field(F_DESCRIPTION),
                "etablissements": display_list(rec, F_ETABLISSEMENT, &etabs),
                "villesEpicu": display_list(rec, F_VILLE_EPICU, &villes),
                "collaborateurs": display_list(rec, F_COLLABORATEUR, &collabs),
            })
        })
        .collect()
}
