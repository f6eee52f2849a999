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

const F_NUMERO: &str = "Numéro";
const F_MONTANT: &str = "Montant";
const F_STATUT: &str = "Statut";
const F_DATE_EMISSION: &str = "Date d'émission";
const F_ETABLISSEMENT: &str = "Établissement";

const ALLOWED_SORTS: &[&str] = &[F_DATE_EMISSION, F_MONTANT, F_NUMERO];

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

/// GET /api/facturation - city-scoped invoices
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
        F_DATE_EMISSION,
    );

    let mut sq = scope.query(F_VILLE_EPICU);
    if sq.is_empty_scope() {
        return Ok(Json(empty_page("factures", &params)));
    }
    sq.search(query.q.as_deref(), &[F_NUMERO]);
    sq.eq_filter(F_STATUT, query.statut.as_deref());
    sq.date_window(
        F_DATE_EMISSION,
        parse_date_param(query.date_start.as_deref(), "dateStart")?,
        parse_date_param(query.date_end.as_deref(), "dateEnd")?,
    );

    let records = state
        .store
        .list(&config::config().tables.factures, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(state.store.as_ref(), &page).await;

    Ok(Json(page_body("factures", rows, &pagination)))
}

/// POST /api/facturation - create an invoice
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;

    let montant = payload
        .get("montant")
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::validation("Montant requis"))?;
    let etablissement = body_str(&payload, "etablissement")
        .ok_or_else(|| ApiError::validation("Établissement requis"))?;

    let tables = &config::config().tables;
    let mut fields = Map::new();
    fields.insert(F_MONTANT.to_string(), json!(montant));
    if let Some(numero) = body_str(&payload, "numero") {
        fields.insert(F_NUMERO.to_string(), Value::String(numero));
    }
    if let Some(statut) = body_str(&payload, "statut") {
        fields.insert(F_STATUT.to_string(), Value::String(statut));
    }
    if let Some(date) = body_str(&payload, "dateEmission") {
        fields.insert(F_DATE_EMISSION.to_string(), Value::String(date));
    }
    match ensure_linked(state.store.as_ref(), &tables.etablissements, &etablissement, &[F_ETAB_NOM])
        .await
    {
        Some(id) => {
            fields.insert(F_ETABLISSEMENT.to_string(), json!([id]));
        }
        // The establishment is mandatory input, but the link itself stays
        // best-effort like every other link: the invoice is created anyway
        None => {
            tracing::warn!(etablissement, "invoice created without establishment link");
        }
    }
    if let Some(ville) = body_str(&payload, "villeEpicu") {
        if let Some(id) =
            ensure_linked(state.store.as_ref(), &tables.villes, &ville, &[F_VILLE_EPICU]).await
        {
            fields.insert(F_VILLE_EPICU.to_string(), json!([id]));
        }
    }

    let created = state.store.create(&tables.factures, fields).await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&created)).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok((StatusCode::CREATED, Json(json!({ "facture": row }))))
}

/// PATCH /api/facturation?id=recX - partial update (status changes mostly)
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;
    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let mut fields = Map::new();
    if let Some(montant) = payload.get("montant").and_then(Value::as_f64) {
        fields.insert(F_MONTANT.to_string(), json!(montant));
    }
    for (key, field) in [
        ("numero", F_NUMERO),
        ("statut", F_STATUT),
        ("dateEmission", F_DATE_EMISSION),
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
        .update(&config::config().tables.factures, &id, fields)
        .await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&updated)).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "facture": row })))
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
                "numero": rec.str_field(F_NUMERO),
                "montant": rec.f64_field(F_MONTANT),
                "statut": rec.str_field(F_STATUT),
                "dateEmission": rec.str_field(F_DATE_EMISSION),
                "etablissements": display_list(rec, F_ETABLISSEMENT, &etabs),
                "villesEpicu": display_list(rec, F_VILLE_EPICU, &villes),
            })
        })
        .collect()
}
