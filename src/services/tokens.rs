use chrono::DateTime;

use crate::auth::{AuthUser, Clock};
use crate::config;
use crate::error::ApiError;
use crate::filter::Expr;
use crate::store::{ListOptions, TableStore};

// Access-token table fields. Tokens are issued by the external login flow;
// this service only ever reads them.
const FIELD_TOKEN: &str = "Token";
const FIELD_EXPIRATION: &str = "Expiration";
const FIELD_COLLABORATEUR: &str = "Collaborateur";

/// Resolve an opaque bearer token to the collaborator it belongs to.
/// Expired tokens are treated the same as unknown ones.
pub async fn resolve_token(
    store: &dyn TableStore,
    clock: &Clock,
    token: &str,
) -> Result<AuthUser, ApiError> {
    let options = ListOptions::filtered(Expr::eq(FIELD_TOKEN, token)).with_max(1);
    let records = store
        .list(&config::config().tables.access_tokens, &options)
        .await
        .map_err(ApiError::from)?;

    let Some(record) = records.into_iter().next() else {
        return Err(ApiError::auth("Token invalide"));
    };

    let expired = match record.str_field(FIELD_EXPIRATION) {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(expires_at) => expires_at <= clock.now(),
            Err(_) => {
                tracing::warn!(token_record = %record.id, "unparseable token expiration");
                true
            }
        },
        // A token without an expiration is malformed; reject it
        None => true,
    };
    if expired {
        return Err(ApiError::auth("Token expiré"));
    }

    let Some(user_id) = record.first_link(FIELD_COLLABORATEUR) else {
        return Err(ApiError::auth("Token invalide"));
    };

    Ok(AuthUser { user_id })
}
