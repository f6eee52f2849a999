mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, TOK_ADMIN, TOK_LILLE};
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
    body["prospects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["nom"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn pipeline_stage_filters_by_status() {
    let app = seeded_app();
    let (status, body) =
        common::get(&app, "/api/prospects/glacial?limit=5", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);

    // Default sort is the establishment name, ascending
    assert_eq!(names(&body), vec!["Aux Trois Brasseurs", "Le Bistrot"]);
    assert_eq!(body["pagination"]["limit"], 5);
}

#[tokio::test]
async fn identical_page_requests_return_identical_results() {
    let app = seeded_app();
    let uri = "/api/prospects/glacial?limit=1&offset=1&order=asc";

    let (_, first) = common::get(&app, uri, Some(TOK_LILLE)).await;
    let (_, second) = common::get(&app, uri, Some(TOK_LILLE)).await;
    assert_eq!(first, second);
    assert_eq!(names(&first), vec!["Le Bistrot"]);
}

#[tokio::test]
async fn unknown_stage_is_a_404() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/prospects/tiede", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Statut de prospection inconnu");
}

#[tokio::test]
async fn pages_cover_the_stage_without_overlap() {
    let app = seeded_app();

    let (_, page1) =
        common::get(&app, "/api/prospects/glacial?limit=1&offset=0", Some(TOK_LILLE)).await;
    assert_eq!(names(&page1), vec!["Aux Trois Brasseurs"]);
    assert_eq!(page1["pagination"]["hasMore"], true);
    assert_eq!(page1["pagination"]["nextOffset"], 1);

    let (_, page2) =
        common::get(&app, "/api/prospects/glacial?limit=1&offset=1", Some(TOK_LILLE)).await;
    assert_eq!(names(&page2), vec!["Le Bistrot"]);
    assert_eq!(page2["pagination"]["prevOffset"], 0);

    // A full window cannot distinguish "exactly exhausted" from "more rows",
    // so the empty page after the last one is where hasMore settles
    let (_, page3) =
        common::get(&app, "/api/prospects/glacial?limit=1&offset=2", Some(TOK_LILLE)).await;
    assert!(names(&page3).is_empty());
    assert_eq!(page3["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn creating_a_prospect_requires_the_contact_date() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/prospects/glacial",
        Some(TOK_LILLE),
        json!({ "nom": "La Chicorée" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date de prise de contact requise");
}

#[tokio::test]
async fn created_prospect_gets_the_stage_status() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/prospects/a_contacter",
        Some(TOK_LILLE),
        json!({
            "nom": "La Chicorée",
            "datePriseContact": "2026-06-01",
            "villeEpicu": "Lille",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["etablissement"]["statut"], "À contacter");
    assert_eq!(body["etablissement"]["villesEpicu"][0], "Lille");
}

#[tokio::test]
async fn patching_moves_a_prospect_along_the_pipeline() {
    let app = seeded_app();
    let (_, listing) =
        common::get(&app, "/api/prospects/glacial?limit=1", Some(TOK_ADMIN)).await;
    let id = listing["prospects"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/prospects/glacial?id={id}");
    let (status, body) =
        common::patch(&app, &uri, Some(TOK_ADMIN), json!({ "statut": "Client" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["etablissement"]["statut"], "Client");
}

#[tokio::test]
async fn patch_without_id_is_a_400() {
    let app = seeded_app();
    let (status, body) = common::patch(
        &app,
        "/api/prospects/glacial",
        Some(TOK_LILLE),
        json!({ "statut": "Client" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Identifiant requis");
}
