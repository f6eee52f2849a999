mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, TOK_LILLE, TOK_NOCITY};
use serde_json::json;

#[tokio::test]
async fn invoices_are_city_scoped() {
    let app = seeded_app();

    let (status, body) = common::get(&app, "/api/facturation", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["factures"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["numero"], "F-2026-001");
    assert_eq!(rows[0]["montant"], 450.0);

    let (_, body) = common::get(&app, "/api/facturation", Some(TOK_NOCITY)).await;
    assert!(body["factures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn creating_an_invoice_requires_amount_and_establishment() {
    let app = seeded_app();

    let (status, body) = common::post(
        &app,
        "/api/facturation",
        Some(TOK_LILLE),
        json!({ "etablissement": "Le Bistrot" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Montant requis");

    let (status, body) = common::post(
        &app,
        "/api/facturation",
        Some(TOK_LILLE),
        json!({ "montant": 120.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Établissement requis");
}

#[tokio::test]
async fn invoice_create_links_the_establishment() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/facturation",
        Some(TOK_LILLE),
        json!({
            "montant": 320.5,
            "numero": "F-2026-002",
            "statut": "En attente",
            "dateEmission": "2026-06-01",
            "etablissement": "Le Bistrot",
            "villeEpicu": "Lille",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["facture"]["montant"], 320.5);
    assert_eq!(body["facture"]["etablissements"][0], "Le Bistrot");
}

#[tokio::test]
async fn invoice_status_change() {
    let app = seeded_app();
    let (_, listing) = common::get(&app, "/api/facturation", Some(TOK_LILLE)).await;
    let id = listing["factures"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/facturation?id={id}");
    let (status, body) =
        common::patch(&app, &uri, Some(TOK_LILLE), json!({ "statut": "Relancée" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["facture"]["statut"], "Relancée");
}

#[tokio::test]
async fn invoice_date_window() {
    let app = seeded_app();
    let (_, body) = common::get(
        &app,
        "/api/facturation?dateStart=2026-05-01&dateEnd=2026-05-31",
        Some(TOK_LILLE),
    )
    .await;
    assert_eq!(body["factures"].as_array().unwrap().len(), 1);

    let (_, body) =
        common::get(&app, "/api/facturation?dateStart=2026-06-01", Some(TOK_LILLE)).await;
    assert!(body["factures"].as_array().unwrap().is_empty());
}
