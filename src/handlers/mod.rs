pub mod agenda;
pub mod creneaux;
pub mod equipe;
pub mod etablissements;
pub mod facturation;
pub mod help;
pub mod profile;
pub mod prospects;
pub mod publications;
pub mod ressources;

use serde_json::{Map, Value};

use crate::api::Pagination;

/// List response body: `{ <items key>: [...], "pagination": {...} }`.
pub(crate) fn page_body(items_key: &str, items: Vec<Value>, pagination: &Pagination) -> Value {
    let mut body = Map::new();
    body.insert(items_key.to_string(), Value::Array(items));
    body.insert(
        "pagination".to_string(),
        serde_json::to_value(pagination).unwrap_or(Value::Null),
    );
    Value::Object(body)
}

pub(crate) fn empty_page(items_key: &str, params: &crate::filter::PageParams) -> Value {
    page_body(items_key, Vec::new(), &Pagination::empty(params))
}

/// Trimmed, non-empty string field from a JSON body.
pub(crate) fn body_str(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String-list field from a JSON body; a bare string becomes a single-item
/// list, matching how the form frontend sends single selections.
pub(crate) fn body_list(body: &Value, key: &str) -> Vec<String> {
    match body.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_helpers() {
        let body = json!({
            "nom": "  Le Bistrot  ",
            "vide": "   ",
            "categories": ["FOOD", " ", "SHOP"],
            "seule": "BEAUTY",
        });
        assert_eq!(body_str(&body, "nom").as_deref(), Some("Le Bistrot"));
        assert!(body_str(&body, "vide").is_none());
        assert!(body_str(&body, "absent").is_none());
        assert_eq!(body_list(&body, "categories"), vec!["FOOD", "SHOP"]);
        assert_eq!(body_list(&body, "seule"), vec!["BEAUTY"]);
        assert!(body_list(&body, "absent").is_empty());
    }
}
