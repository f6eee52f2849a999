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
use crate::services::{ensure_linked, resolve_scope};
use crate::store::{Record, TableStore};

use super::etablissements::{F_NOM as F_ETAB_NOM, F_VILLE_EPICU};
use super::{body_str, empty_page, page_body};

const F_TITRE: &str = "Titre";
const F_DATE: &str = "Date de publication";
const F_STATUT: &str = "Statut";
const F_ETABLISSEMENT: &str = "Établissement";

const ALLOWED_SORTS: &[&str] = &[F_DATE, F_TITRE, F_STATUT];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    pub statut: Option<String>,
    #[serde(rename = "dateStart")]
    pub date_start: Option<String>,
    #[serde(rename = "dateEnd")]
    pub date_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// GET /api/publications - city-scoped publication listing
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
        return Ok(Json(empty_page("publications", &params)));
    }
    sq.search(query.q.as_deref(), &[F_TITRE]);
    sq.eq_filter(F_STATUT, query.statut.as_deref());
    sq.date_window(
        F_DATE,
        parse_date_param(query.date_start.as_deref(), "dateStart")?,
        parse_date_param(query.date_end.as_deref(), "dateEnd")?,
    );

    let records = state
        .store
        .list(&config::config().tables.publications, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(state.store.as_ref(), &page).await;

    Ok(Json(page_body("publications", rows, &pagination)))
}

/// POST /api/publications - create a publication
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let titre = body_str(&payload, "titre").ok_or_else(|| ApiError::validation("Titre requis"))?;

    let tables = &config::config().tables;
    let mut fields = Map::new();
    fields.insert(F_TITRE.to_string(), Value::String(titre));
    for (key, field) in [("datePublication", F_DATE), ("statut", F_STATUT)] {
        if let Some(value) = body_str(&payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    if let Some(etablissement) = body_str(&payload, "etablissement") {
        if let Some(id) =
            ensure_linked(state.store.as_ref(), &tables.etablissements, &etablissement, &[F_ETAB_NOM])
                .await
        {
            fields.insert(F_ETABLISSEMENT.to_string(), json!([id]));
        }
    }
    if let Some(ville) = body_str(&payload, "villeEpicu") {
        if let Some(id) =
            ensure_linked(state.store.as_ref(), &tables.villes, &ville, &[F_VILLE_EPICU]).await
        {
            fields.insert(F_VILLE_EPICU.to_string(), json!([id]));
        }
    }

    let created = state.store.create(&tables.publications, fields).await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&created)).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok((StatusCode::CREATED, Json(json!({ "publication": row }))))
}

/// PATCH /api/publications?id=recX
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let mut fields = Map::new();
    for (key, field) in [
        ("titre", F_TITRE),
        ("datePublication", F_DATE),
        ("statut", F_STATUT),
    ] {
        if let Some(value) = body_str(&payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    if fields.is_empty() {
        return Err(ApiError::validation("Aucun champ à mettre à jour"));
    }

    let updated = state
        .store
        .update(&config::config().tables.publications, &id, fields)
        .await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&updated)).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "publication": row })))
}

async fn map_rows(store: &dyn TableStore, records: &[Record]) -> Vec<Value> {
    let tables = &config::config().tables;
    let etab_ids = collect_linked_ids(records, F_ETABLISSEMENT);
    let ville_ids = collect_linked_ids(records, F_VILLE_EPICU);

    let (etabs, villes) = tokio::join!(
        resolve_names(store, &tables.etablissements, F_ETAB_NOM, &etab_ids),
        resolve_names(store, &tables.villes, F_VILLE_EPICU, &ville_ids),
    );

    records
        .iter()
        .map(|rec| {
            json!({
                "id": rec.id,
                "titre": rec.str_field(F_TITRE),
                "datePublication": rec.str_field(F_DATE),
                "statut": rec.str_field(F_STATUT),
                "etablissements": display_list(rec, F_ETABLISSEMENT, &etabs),
                "villesEpicu": display_list(rec, F_VILLE_EPICU, &villes),
            })
        })
        .collect()
}
