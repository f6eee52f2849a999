use axum::{
    extract::{Extension, Query},
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

const F_DATE: &str = "Date";
const F_STATUT: &str = "Statut";
const F_ETABLISSEMENT: &str = "Établissement";

const ALLOWED_SORTS: &[&str] = &[F_DATE, F_STATUT];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub statut: Option<String>,
    pub ville: Option<String>,
    #[serde(rename = "dateStart")]
    pub date_start: Option<String>,
    #[serde(rename = "dateEnd")]
    pub date_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// GET /api/publications/creneaux - publication slots, city-scoped
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
        50,
        ALLOWED_SORTS,
        F_DATE,
    );

    let mut sq = scope.query(F_VILLE_EPICU);
    if sq.is_empty_scope() {
        return Ok(Json(empty_page("creneaux", &params)));
    }
    sq.eq_filter(F_STATUT, query.statut.as_deref());
    sq.link_filter(query.ville.as_deref(), F_VILLE_EPICU);
    sq.date_window(
        F_DATE,
        parse_date_param(query.date_start.as_deref(), "dateStart")?,
        parse_date_param(query.date_end.as_deref(), "dateEnd")?,
    );

    let records = state
        .store
        .list(&config::config().tables.creneaux, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(state.store.as_ref(), &page).await;

    Ok(Json(page_body("creneaux", rows, &pagination)))
}

/// PATCH /api/publications/creneaux?id=recX - book or release a slot
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let tables = &config::config().tables;
    let mut fields = Map::new();
    if let Some(statut) = body_str(&payload, "statut") {
        fields.insert(F_STATUT.to_string(), Value::String(statut));
    }
    if let Some(etablissement) = body_str(&payload, "etablissement") {
        if let Some(etab_id) =
            ensure_linked(state.store.as_ref(), &tables.etablissements, &etablissement, &[F_ETAB_NOM])
                .await
        {
            fields.insert(F_ETABLISSEMENT.to_string(), json!([etab_id]));
        }
    }
    if fields.is_empty() {
        return Err(ApiError::validation("Aucun champ à mettre à jour"));
    }

    let updated = state.store.update(&tables.creneaux, &id, fields).await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&updated)).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "creneau": row })))
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
                "date": rec.str_field(F_DATE),
                "statut": rec.str_field(F_STATUT),
                "etablissements": display_list(rec, F_ETABLISSEMENT, &etabs),
                "villesEpicu": display_list(rec, F_VILLE_EPICU, &villes),
            })
        })
        .collect()
}
