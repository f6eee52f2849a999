mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, TOK_ADMIN, TOK_LILLE, TOK_NOCITY};
use serde_json::Value;

fn names(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["nom"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn franchisee_only_sees_own_city() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);

    let rows = names(&body, "etablissements");
    assert_eq!(rows.len(), 3);
    assert!(!rows.contains(&"Café Parisien".to_string()));
}

#[tokio::test]
async fn admin_sees_every_city() {
    let app = seeded_app();
    let (_, body) = common::get(&app, "/api/etablissements", Some(TOK_ADMIN)).await;
    let rows = names(&body, "etablissements");
    assert_eq!(rows.len(), 4);
    assert!(rows.contains(&"Café Parisien".to_string()));
}

#[tokio::test]
async fn zero_city_franchisee_sees_nothing() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", Some(TOK_NOCITY)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["etablissements"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn query_filters_cannot_widen_the_scope() {
    // A Lille franchisee explicitly asking for Paris still gets nothing
    let app = seeded_app();
    let (_, body) =
        common::get(&app, "/api/etablissements?ville=Paris", Some(TOK_LILLE)).await;
    let rows = names(&body, "etablissements");
    assert!(!rows.contains(&"Café Parisien".to_string()));
}

#[tokio::test]
async fn agenda_is_scoped_too() {
    let app = seeded_app();
    let (_, body) = common::get(&app, "/api/agenda", Some(TOK_LILLE)).await;
    let events = body["evenements"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["description"], "Tournage au Bistrot");
}

#[tokio::test]
async fn team_listing_shows_city_colleagues_only() {
    let app = seeded_app();
    let (_, body) = common::get(&app, "/api/equipe", Some(TOK_LILLE)).await;
    let rows = names(&body, "collaborateurs");
    assert_eq!(rows, vec!["Martin".to_string()]);
}

#[tokio::test]
async fn admin_gets_sensitive_fields_franchisee_does_not() {
    let app = seeded_app();

    let (_, body) = common::get(&app, "/api/etablissements", Some(TOK_ADMIN)).await;
    let bistrot = body["etablissements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["nom"] == "Le Bistrot")
        .unwrap()
        .clone();
    assert_eq!(bistrot["siret"], "11111111100011");

    let (_, body) = common::get(&app, "/api/etablissements", Some(TOK_LILLE)).await;
    let bistrot = body["etablissements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["nom"] == "Le Bistrot")
        .unwrap()
        .clone();
    assert!(bistrot.get("siret").is_none());
    assert!(bistrot.get("telephone").is_none());
}

#[tokio::test]
async fn linked_records_come_back_as_names() {
    let app = seeded_app();
    let (_, body) = common::get(&app, "/api/etablissements", Some(TOK_LILLE)).await;
    let bistrot = body["etablissements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["nom"] == "Le Bistrot")
        .unwrap()
        .clone();
    assert_eq!(bistrot["villesEpicu"][0], "Lille");
    assert_eq!(bistrot["categories"][0], "FOOD");
    assert_eq!(bistrot["suiviPar"][0], "Martin");
}
