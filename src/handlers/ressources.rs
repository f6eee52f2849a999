use axum::{extract::Extension, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::config;
use crate::error::ApiResult;
use crate::filter::Expr;
use crate::services::resolve_scope;
use crate::store::ListOptions;

const F_NOM: &str = "Nom";
const F_URL: &str = "URL";
const F_DESCRIPTION: &str = "Description";
const F_TYPE: &str = "Type";

const TYPE_CANVA: &str = "Canva";

/// GET /api/ressources/canva - shared Canva template links
pub async fn get_canva(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    resolve_scope(state.store.as_ref(), &user.user_id).await?;

    let options = ListOptions::filtered(Expr::eq(F_TYPE, TYPE_CANVA));
    let records = state
        .store
        .list(&config::config().tables.ressources, &options)
        .await?;

    let rows: Vec<Value> = records
        .iter()
        .map(|rec| {
            json!({
                "id": rec.id,
                "nom": rec.str_field(F_NOM),
                "url": rec.str_field(F_URL),
                "description": rec.str_field(F_DESCRIPTION),
            })
        })
        .collect();

    Ok(Json(json!({ "ressources": rows })))
}
