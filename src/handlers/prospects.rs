use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::resolve_scope;

use super::etablissements::{
    create_establishment, list_page, patch_establishment, IdQuery, ListQuery,
};

/// Prospection pipeline segments exposed in the route path.
fn statut_from_segment(segment: &str) -> Result<&'static str, ApiError> {
    match segment {
        "glacial" => Ok("Glacial"),
        "a_contacter" => Ok("À contacter"),
        "prospects" => Ok("Prospect"),
        _ => Err(ApiError::not_found("Statut de prospection inconnu")),
    }
}

/// GET /api/prospects/:statut - establishments in one pipeline stage
pub async fn get(
    Path(segment): Path<String>,
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let statut = statut_from_segment(&segment)?;
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    list_page(state.store.as_ref(), &scope, &query, Some(statut), "prospects").await
}

/// POST /api/prospects/:statut - new prospect; the contact date is
/// mandatory here, unlike plain establishments
pub async fn post(
    Path(segment): Path<String>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let statut = statut_from_segment(&segment)?;
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    create_establishment(state.store.as_ref(), &scope, &payload, Some(statut), true).await
}

/// PATCH /api/prospects/:statut?id=recX - update, e.g. moving a prospect
/// along the pipeline
pub async fn patch(
    Path(segment): Path<String>,
    Query(query): Query<IdQuery>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    statut_from_segment(&segment)?;
    let scope = resolve_scope(state.store.as_ref(), &user.user_id).await?;
    patch_establishment(state.store.as_ref(), &scope, query.id.as_deref(), &payload).await
}
