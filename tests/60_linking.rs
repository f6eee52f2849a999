mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, ID_LILLE, TOK_LILLE};
use serde_json::json;

#[tokio::test]
async fn repeated_free_text_category_creates_one_record() {
    let app = seeded_app();
    let before = app.store.dump("Catégories").len();

    for nom in ["Brunch", "brunch"] {
        let (status, _) = common::post(
            &app,
            "/api/etablissements",
            Some(TOK_LILLE),
            json!({ "nom": format!("Etab {nom}"), "categories": [nom] }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Case-insensitive lookup reuses the record created by the first call
    assert_eq!(app.store.dump("Catégories").len(), before + 1);
}

#[tokio::test]
async fn existing_category_is_reused_not_duplicated() {
    let app = seeded_app();
    let before = app.store.dump("Catégories").len();

    let (_, body) = common::post(
        &app,
        "/api/etablissements",
        Some(TOK_LILLE),
        json!({ "nom": "La Friterie", "categories": ["food"] }),
    )
    .await;
    assert_eq!(body["etablissement"]["categories"][0], "FOOD");
    assert_eq!(app.store.dump("Catégories").len(), before);
}

#[tokio::test]
async fn category_count_is_capped_at_two() {
    let app = seeded_app();
    let (_, body) = common::post(
        &app,
        "/api/etablissements",
        Some(TOK_LILLE),
        json!({ "nom": "Le Fourre-Tout", "categories": ["A", "B", "C"] }),
    )
    .await;
    assert_eq!(body["etablissement"]["categories"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn record_id_values_pass_through_without_lookup() {
    let app = seeded_app();
    let (_, body) = common::post(
        &app,
        "/api/etablissements",
        Some(TOK_LILLE),
        json!({ "nom": "Chez Benoît", "suiviPar": ID_LILLE }),
    )
    .await;
    assert_eq!(body["etablissement"]["suiviPar"][0], "Martin");
}

#[tokio::test]
async fn follower_matches_on_name_then_email() {
    let app = seeded_app();
    let (_, body) = common::post(
        &app,
        "/api/etablissements",
        Some(TOK_LILLE),
        json!({ "nom": "Le Comptoir", "suiviPar": "benoit@epicu.fr" }),
    )
    .await;
    // No collaborator is named after the email; the fallback field matches
    assert_eq!(body["etablissement"]["suiviPar"][0], "Martin");

    let collaborateurs = app.store.dump("Collaborateurs");
    assert!(collaborateurs.iter().all(|r| r.str_field("Nom") != Some("benoit@epicu.fr")));
}

#[tokio::test]
async fn blank_link_values_are_ignored() {
    let app = seeded_app();
    let before = app.store.dump("Villes EPICU").len();
    let (_, body) = common::post(
        &app,
        "/api/etablissements",
        Some(TOK_LILLE),
        json!({ "nom": "Sans Ville", "villeEpicu": "   " }),
    )
    .await;
    assert!(body["etablissement"]["villesEpicu"].as_array().unwrap().is_empty());
    assert_eq!(app.store.dump("Villes EPICU").len(), before);
}
