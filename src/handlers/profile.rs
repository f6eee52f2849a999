use axum::{extract::Extension, response::Json};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::config;
use crate::error::{ApiError, ApiResult};
use crate::services::names::{collect_linked_ids, display_list, resolve_names};
use crate::services::scope::{load_collaborator, FIELD_ROLE, FIELD_VILLES};
use crate::store::{Record, TableStore};

use super::body_str;

const F_NOM: &str = "Nom";
const F_PRENOM: &str = "Prénom";
const F_EMAIL: &str = "Email";
const F_TELEPHONE: &str = "Téléphone";

/// GET /api/profile - the caller's own collaborator record
pub async fn get(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let record = load_collaborator(state.store.as_ref(), &user.user_id).await?;
    let row = map_row(state.store.as_ref(), &record).await;
    Ok(Json(json!({ "profile": row })))
}

/// PATCH /api/profile - callers edit their own contact fields only
pub async fn patch(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    load_collaborator(state.store.as_ref(), &user.user_id).await?;

    let mut fields = Map::new();
    for (key, field) in [
        ("nom", F_NOM),
        ("prenom", F_PRENOM),
        ("email", F_EMAIL),
        ("telephone", F_TELEPHONE),
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
        .update(&config::config().tables.collaborateurs, &user.user_id, fields)
        .await?;
    let row = map_row(state.store.as_ref(), &updated).await;
    Ok(Json(json!({ "profile": row })))
}

async fn map_row(store: &dyn TableStore, record: &Record) -> Value {
    let tables = &config::config().tables;
    let ville_ids = collect_linked_ids(std::slice::from_ref(record), FIELD_VILLES);
    let villes = resolve_names(store, &tables.villes, FIELD_VILLES, &ville_ids).await;

    json!({
        "id": record.id,
        "nom": record.str_field(F_NOM),
        "prenom": record.str_field(F_PRENOM),
        "email": record.str_field(F_EMAIL),
        "telephone": record.str_field(F_TELEPHONE),
        "role": record.str_field(FIELD_ROLE),
        "villesEpicu": display_list(record, FIELD_VILLES, &villes),
    })
}
