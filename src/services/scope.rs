use crate::auth::Role;
use crate::config;
use crate::error::ApiError;
use crate::filter::ScopedQuery;
use crate::store::{Record, TableStore};

use super::names;

// Collaborator record fields
pub const FIELD_ROLE: &str = "Rôle";
pub const FIELD_VILLES: &str = "Ville EPICU";

/// Visibility scope of the calling collaborator: role plus the resolved
/// names of the cities they are linked to.
#[derive(Debug, Clone)]
pub struct CallerScope {
    pub role: Role,
    pub city_names: Vec<String>,
}

impl CallerScope {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Start a query scoped to this caller for a resource whose city link
    /// lives in `city_link_field`.
    pub fn query(&self, city_link_field: &str) -> ScopedQuery {
        ScopedQuery::scoped(self.is_admin(), &self.city_names, city_link_field)
    }
}

/// Load the caller's collaborator record.
pub async fn load_collaborator(
    store: &dyn TableStore,
    user_id: &str,
) -> Result<Record, ApiError> {
    let table = &config::config().tables.collaborateurs;
    store
        .find(table, user_id)
        .await
        .map_err(|e| {
            tracing::error!(user_id, error = %e, "collaborator lookup failed");
            ApiError::internal("Impossible de récupérer les informations de l'utilisateur")
        })?
        .ok_or_else(|| {
            ApiError::internal("Impossible de récupérer les informations de l'utilisateur")
        })
}

/// Resolve the caller's role and city names. One batched lookup resolves
/// all linked city ids at once.
pub async fn resolve_scope(
    store: &dyn TableStore,
    user_id: &str,
) -> Result<CallerScope, ApiError> {
    let collaborator = load_collaborator(store, user_id).await?;

    let role = Role::parse(collaborator.str_field(FIELD_ROLE).unwrap_or_default());

    let city_ids: std::collections::HashSet<String> =
        collaborator.str_list(FIELD_VILLES).into_iter().collect();
    let tables = &config::config().tables;
    let name_map = names::resolve_names(store, &tables.villes, FIELD_VILLES, &city_ids).await;

    // Keep only ids that actually resolved; an unresolvable link must not
    // become a city filter value
    let city_names: Vec<String> = collaborator
        .str_list(FIELD_VILLES)
        .into_iter()
        .filter_map(|id| name_map.get(&id).cloned())
        .collect();

    Ok(CallerScope { role, city_names })
}
