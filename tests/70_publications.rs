mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, TOK_ADMIN, TOK_LILLE, TOK_NOCITY};
use serde_json::json;

#[tokio::test]
async fn publications_are_city_scoped() {
    let app = seeded_app();

    let (status, body) = common::get(&app, "/api/publications", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["publications"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["titre"], "Reel Le Bistrot");

    let (_, body) = common::get(&app, "/api/publications", Some(TOK_NOCITY)).await;
    assert!(body["publications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn creating_a_publication_requires_a_title() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/publications",
        Some(TOK_LILLE),
        json!({ "statut": "Brouillon" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Titre requis");
}

#[tokio::test]
async fn publication_create_resolves_links() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/publications",
        Some(TOK_LILLE),
        json!({
            "titre": "Reel Chez Marcel",
            "datePublication": "2026-06-05",
            "etablissement": "Chez Marcel",
            "villeEpicu": "Lille",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["publication"]["etablissements"][0], "Chez Marcel");
    assert_eq!(body["publication"]["villesEpicu"][0], "Lille");
}

#[tokio::test]
async fn slots_are_listed_and_filtered() {
    let app = seeded_app();
    let (status, body) =
        common::get(&app, "/api/publications/creneaux", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["creneaux"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["statut"], "Libre");

    let (_, body) = common::get(
        &app,
        "/api/publications/creneaux?statut=Réservé",
        Some(TOK_LILLE),
    )
    .await;
    assert!(body["creneaux"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn booking_a_slot_sets_status_and_establishment() {
    let app = seeded_app();
    let (_, listing) =
        common::get(&app, "/api/publications/creneaux", Some(TOK_ADMIN)).await;
    let id = listing["creneaux"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/publications/creneaux?id={id}");
    let (status, body) = common::patch(
        &app,
        &uri,
        Some(TOK_LILLE),
        json!({ "statut": "Réservé", "etablissement": "Le Bistrot" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["creneau"]["statut"], "Réservé");
    assert_eq!(body["creneau"]["etablissements"][0], "Le Bistrot");
}

#[tokio::test]
async fn booking_without_any_field_is_a_400() {
    let app = seeded_app();
    let (_, listing) =
        common::get(&app, "/api/publications/creneaux", Some(TOK_ADMIN)).await;
    let id = listing["creneaux"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/publications/creneaux?id={id}");
    let (status, body) = common::patch(&app, &uri, Some(TOK_LILLE), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Aucun champ à mettre à jour");
}
