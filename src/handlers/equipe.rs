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
use crate::services::names::{collect_linked_ids, display_list, resolve_names};
use crate::services::scope::{CallerScope, FIELD_ROLE, FIELD_VILLES};
use crate::services::{ensure_linked, resolve_scope};
use crate::store::{Record, TableStore};

use super::{body_str, empty_page, page_body};

const F_NOM: &str = "Nom";
const F_PRENOM: &str = "Prénom";
const F_EMAIL: &str = "Email";
const F_TELEPHONE: &str = "Téléphone";
const F_DATE_NAISSANCE: &str = "Date de naissance";

const ALLOWED_SORTS: &[&str] = &[F_NOM, F_PRENOM, F_EMAIL];
const SEARCH_FIELDS: &[&str] = &[F_NOM, F_PRENOM, F_EMAIL];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    pub ville: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

fn require_admin(scope: &CallerScope) -> Result<(), ApiError> {
    if scope.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Action réservée aux administrateurs"))
    }
}

/// GET /api/equipe - team listing; non-admins only see collaborators
/// sharing at least one of their cities
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
        F_NOM,
    );

    let mut sq = scope.query(FIELD_VILLES);
    if sq.is_empty_scope() {
        return Ok(Json(empty_page("collaborateurs", &params)));
    }
    sq.search(query.q.as_deref(), SEARCH_FIELDS);
    sq.link_filter(query.ville.as_deref(), FIELD_VILLES);

    let records = state
        .store
        .list(&config::config().tables.collaborateurs, &sq.into_options(&params))
        .await?;
    let (page, pagination) = crate::api::window(records, &params);
    let rows = map_rows(state.store.as_ref(), &page, &scope).await;

    Ok(Json(page_body("collaborateurs", rows, &pagination)))
}

/// POST /api/equipe - admin-only collaborator creation
pub async fn post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    require_admin(&scope)?;

    let nom = body_str(&payload, "nom").ok_or_else(|| ApiError::validation("Nom requis"))?;

    let mut fields = Map::new();
    fields.insert(F_NOM.to_string(), Value::String(nom));
    for (key, field) in [
        ("prenom", F_PRENOM),
        ("email", F_EMAIL),
        ("telephone", F_TELEPHONE),
        ("role", FIELD_ROLE),
        ("dateNaissance", F_DATE_NAISSANCE),
    ] {
        if let Some(value) = body_str(&payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    resolve_villes(state.store.as_ref(), &payload, &mut fields).await;

    let created = state
        .store
        .create(&config::config().tables.collaborateurs, fields)
        .await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&created), &scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok((StatusCode::CREATED, Json(json!({ "collaborateur": row }))))
}

/// PATCH /api/equipe?id=recX - admin-only, 403 for everyone else no matter
/// the payload
pub async fn patch(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    require_admin(&scope)?;

    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;

    let mut fields = Map::new();
    for (key, field) in [
        ("nom", F_NOM),
        ("prenom", F_PRENOM),
        ("email", F_EMAIL),
        ("telephone", F_TELEPHONE),
        ("role", FIELD_ROLE),
        ("dateNaissance", F_DATE_NAISSANCE),
    ] {
        if let Some(value) = body_str(&payload, key) {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    resolve_villes(state.store.as_ref(), &payload, &mut fields).await;
    if fields.is_empty() {
        return Err(ApiError::validation("Aucun champ à mettre à jour"));
    }

    let updated = state
        .store
        .update(&config::config().tables.collaborateurs, &id, fields)
        .await?;
    let rows = map_rows(state.store.as_ref(), std::slice::from_ref(&updated), &scope).await;
    let row = rows.into_iter().next().unwrap_or(Value::Null);

    Ok(Json(json!({ "collaborateur": row })))
}

/// DELETE /api/equipe?id=recX - admin-only
pub async fn delete(
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    require_admin(&scope)?;

    let id = query.id.ok_or_else(|| ApiError::validation("Identifiant requis"))?;
    state
        .store
        .delete(&config::config().tables.collaborateurs, &id)
        .await?;
    Ok(Json(json!({ "deleted": true, "id": id })))
}

async fn resolve_villes(store: &dyn TableStore, payload: &Value, fields: &mut Map<String, Value>) {
    let villes = super::body_list(payload, "villesEpicu");
    if villes.is_empty() {
        return;
    }
    let tables = &config::config().tables;
    let mut ids = Vec::new();
    for ville in &villes {
        if let Some(id) = ensure_linked(store, &tables.villes, ville, &[FIELD_VILLES]).await {
            ids.push(Value::String(id));
        }
    }
    if !ids.is_empty() {
        fields.insert(FIELD_VILLES.to_string(), Value::Array(ids));
    }
}

async fn map_rows(store: &dyn TableStore, records: &[Record], scope: &CallerScope) -> Vec<Value> {
    let tables = &config::config().tables;
    let ville_ids = collect_linked_ids(records, FIELD_VILLES);
    let villes = resolve_names(store, &tables.villes, FIELD_VILLES, &ville_ids).await;

    records
        .iter()
        .map(|rec| {
            let mut row = json!({
                "id": rec.id,
                "nom": rec.str_field(F_NOM),
                "prenom": rec.str_field(F_PRENOM),
                "email": rec.str_field(F_EMAIL),
                "role": rec.str_field(FIELD_ROLE),
                "villesEpicu": display_list(rec, FIELD_VILLES, &villes),
            });
            if scope.is_admin() {
                row["telephone"] = json!(rec.str_field(F_TELEPHONE));
                row["dateNaissance"] = json!(rec.str_field(F_DATE_NAISSANCE));
            }
            row
        })
        .collect()
}
