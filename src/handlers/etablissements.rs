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
use crate::filter::{Expr, PageParams};
use crate::services::names::{collect_linked_ids, display_list, resolve_names};
use crate::services::scope::CallerScope;
use crate::services::{ensure_linked, ensure_linked_all, resolve_scope};
use crate::store::{Record, TableStore};

use super::{body_list, body_str, empty_page, page_body};

// Établissements table fields
pub(crate) const F_NOM: &str = "Nom de l'établissement";
pub(crate) const F_CATEGORIE: &str = "Catégorie";
pub(crate) const F_VILLE: &str = "Ville";
pub(crate) const F_VILLE_EPICU: &str = "Ville EPICU";
pub(crate) const F_SUIVI: &str = "Suivi par";
pub(crate) const F_STATUT: &str = "Statut de prospection";
pub(crate) const F_DATE_CONTACT: &str = "Date de prise de contact";
const F_EMAIL: &str = "Email";
const F_TELEPHONE: &str = "Téléphone";
const F_SIRET: &str = "SIRET";
const F_COMMENTAIRES: &str = "Commentaires";

const ALLOWED_SORTS: &[&str] = &[F_NOM, F_VILLE, F_DATE_CONTACT, F_STATUT];
const SEARCH_FIELDS: &[&str] = &[F_NOM, F_VILLE, F_COMMENTAIRES];
const MAX_CATEGORIES: usize = 2;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    pub categorie: Option<String>,
    pub suivi: Option<String>,
    pub ville: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// GET /api/etablissements - city-scoped establishment listing
pub async fn get(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    list_page(state.store.as_ref(), &scope, &query, None, "etablissements").await
}

/// POST /api/etablissements - create, resolving linked fields by name
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    create_establishment(state.store.as_ref(), &scope, &payload, None, false).await
}

/// PATCH /api/etablissements?id=recX - partial update
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    patch_establishment(state.store.as_ref(), &scope, query.id.as_deref(), &payload).await
}

/// Shared list flow: scope, filter, fetch window, slice, denormalize.
/// `statut` restricts to one prospection status (the prospects routes).
pub(crate) async fn list_page(
    store: &dyn TableStore,
    scope: &CallerScope,
    query: &ListQuery,
    statut: Option<&str>,
    items_key: &str,
) -> ApiResult<Json<Value>> {
    let params = PageParams::from_query(
        query.limit,
        query.offset,
        query.order_by.as_deref(),
        query.order.as_deref(),
        config::config().api.default_page_size,
        ALLOWED_SORTS,
        F_NOM,
    );

    let mut sq = scope.query(F_VILLE_EPICU);
    if sq.is_empty_scope() {
        return Ok(Json(empty_page(items_key, &params)));
    }
    if let Some(statut) = statut {
        sq.push(Expr::eq(F_STATUT, statut));
    }
    sq.search(query.q.as_deref(), SEARCH_FIELDS);
    sq.link_filter(query.categorie.as_deref(), F_CATEGORIE);
    sq.link_filter(query.suivi.as_deref(), F_SUIVI);
    if let Some(ville) = query.ville.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        // Matches either the free-text address city or the linked EPICU city
        sq.push(Expr::or(vec![
            Expr::contains(ville, F_VILLE),
            Expr::contains_in_links(ville, F_VILLE_EPICU),
        ]));
    }

    let records = store
        .list(&config::config().tables.etablissements, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(store, &page, scope).await;

    Ok(Json(page_body(items_key, rows, &pagination)))
}

/// Denormalize one page: one batched name lookup per linked table, run
/// concurrently, then substitute names into each row.
pub(crate) async fn map_rows(
    store: &dyn TableStore,
    records: &[Record],
    scope: &CallerScope,
) -> Vec<Value> {
    let tables = &config::config().tables;
    let category_ids = collect_linked_ids(records, F_CATEGORIE);
    let ville_ids = collect_linked_ids(records, F_VILLE_EPICU);
    let suivi_ids = collect_linked_ids(records, F_SUIVI);

    let (categories, villes, suivis) = tokio::join!(
        resolve_names(store, &tables.categories, "Nom", &category_ids),
        resolve_names(store, &tables.villes, F_VILLE_EPICU, &ville_ids),
        resolve_names(store, &tables.collaborateurs, "Nom", &suivi_ids),
    );

    records
        .iter()
        .map(|rec| {
            let mut row = json!({
                "id": rec.id,
                "nom": rec.str_field(F_NOM),
                "categories": display_list(rec, F_CATEGORIE, &categories),
                "ville": rec.str_field(F_VILLE),
                "villesEpicu": display_list(rec, F_VILLE_EPICU, &villes),
                "suiviPar": display_list(rec, F_SUIVI, &suivis),
                "email": rec.str_field(F_EMAIL),
                "commentaires": rec.str_field(F_COMMENTAIRES),
                "statut": rec.str_field(F_STATUT),
                "datePriseContact": rec.str_field(F_DATE_CONTACT),
            });
            if scope.is_admin() {
                row["telephone"] = json!(rec.str_field(F_TELEPHONE));
                row["siret"] = json!(rec.str_field(F_SIRET));
            }
            row
        })
        .collect()
}

/// Shared create flow. `forced_statut` pins the prospection status for the
/// prospects routes; `require_contact_date` is their extra validation.
pub(crate) async fn create_establishment(
    store: &dyn TableStore,
    scope: &CallerScope,
    payload: &Value,
    forced_statut: Option<&str>,
    require_contact_date: bool,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let nom = body_str(payload, "nom")
        .ok_or_else(|| ApiError::validation("Nom de l'établissement requis"))?;
    let date_contact = body_str(payload, "datePriseContact");
    if require_contact_date && date_contact.is_none() {
        return Err(ApiError::validation("Date de prise de contact requise"));
    }

    let mut fields = Map::new();
    fields.insert(F_NOM.to_string(), Value::String(nom));
    if let Some(date) = date_contact {
        fields.insert(F_DATE_CONTACT.to_string(), Value::String(date));
    }
    let statut = forced_statut
        .map(str::to_string)
        .or_else(|| body_str(payload, "statut"));
    if let Some(statut) = statut {
        fields.insert(F_STATUT.to_string(), Value::String(statut));
    }
    for (key, field) in [
        ("ville", F_VILLE),
        ("email", F_EMAIL),
        ("telephone", F_TELEPHONE),
        ("siret", F_SIRET),
        ("commentaires", F_COMMENTAIRES),
    ] {
        if let Some(value) = body_str(payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }

    resolve_links(store, payload, &mut fields).await;

    let tables = &config::config().tables;
    let created = store.create(&tables.etablissements, fields).await?;
    let rows = map_rows(store, std::slice::from_ref(&created), scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok((StatusCode::CREATED, Json(json!({ "etablissement": row }))))
}

/// Shared partial-update flow.
pub(crate) async fn patch_establishment(
    store: &dyn TableStore,
    scope: &CallerScope,
    id: Option<&str>,
    payload: &Value,
) -> ApiResult<Json<Value>> {
    let id = id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let mut fields = Map::new();
    for (key, field) in [
        ("nom", F_NOM),
        ("ville", F_VILLE),
        ("email", F_EMAIL),
        ("telephone", F_TELEPHONE),
        ("siret", F_SIRET),
        ("commentaires", F_COMMENTAIRES),
        ("statut", F_STATUT),
        ("datePriseContact", F_DATE_CONTACT),
    ] {
        if let Some(value) = body_str(payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    resolve_links(store, payload, &mut fields).await;

    if fields.is_empty() {
        return Err(ApiError::validation("Aucun champ à mettre à jour"));
    }

    let tables = &config::config().tables;
    let updated = store.update(&tables.etablissements, id, fields).await?;
    let rows = map_rows(store, std::slice::from_ref(&updated), scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "etablissement": row })))
}

/// Write-side relational resolution: free-text categories, city and
/// follower become record ids, created on the fly when missing. Failures
/// drop the link (warn-logged in the linking service) without failing the
/// request.
async fn resolve_links(store: &dyn TableStore, payload: &Value, fields: &mut Map<String, Value>) {
    let tables = &config::config().tables;

    let categories = body_list(payload, "categories");
    if !categories.is_empty() {
        let ids =
            ensure_linked_all(store, &tables.categories, &categories, &["Nom"], MAX_CATEGORIES)
                .await;
        if !ids.is_empty() {
            fields.insert(
                F_CATEGORIE.to_string(),
                Value::Array(ids.into_iter().map(Value::String).collect()),
            );
        }
    }

    if let Some(ville) = body_str(payload, "villeEpicu") {
        if let Some(id) = ensure_linked(store, &tables.villes, &ville, &[F_VILLE_EPICU]).await {
            fields.insert(F_VILLE_EPICU.to_string(), json!([id]));
        }
    }

    if let Some(suivi) = body_str(payload, "suiviPar") {
        if let Some(id) =
            ensure_linked(store, &tables.collaborateurs, &suivi, &["Nom", "Email"]).await
        {
            fields.insert(F_SUIVI.to_string(), json!([id]));
        }
    }
}
