mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, ID_LILLE, TOK_ADMIN, TOK_LILLE};
use serde_json::json;

#[tokio::test]
async fn non_admin_cannot_create_collaborators() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/equipe",
        Some(TOK_LILLE),
        json!({ "nom": "Nouveau" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Action réservée aux administrateurs");
}

#[tokio::test]
async fn non_admin_patch_is_rejected_regardless_of_payload() {
    let app = seeded_app();
    let uri = format!("/api/equipe?id={ID_LILLE}");
    let (status, body) = common::patch(&app, &uri, Some(TOK_LILLE), json!({})).await;
    // The role check fires before payload validation
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Action réservée aux administrateurs");
}

#[tokio::test]
async fn non_admin_cannot_delete() {
    let app = seeded_app();
    let uri = format!("/api/equipe?id={ID_LILLE}");
    let (status, _) = common::delete(&app, &uri, Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creation_requires_a_name() {
    let app = seeded_app();
    let (status, body) =
        common::post(&app, "/api/equipe", Some(TOK_ADMIN), json!({ "email": "x@epicu.fr" }))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nom requis");
}

#[tokio::test]
async fn admin_creates_and_deletes_a_collaborator() {
    let app = seeded_app();
    let (status, body) = common::post(
        &app,
        "/api/equipe",
        Some(TOK_ADMIN),
        json!({
            "nom": "Lefevre",
            "prenom": "David",
            "email": "david@epicu.fr",
            "villesEpicu": ["Paris"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["collaborateur"]["nom"], "Lefevre");
    assert_eq!(body["collaborateur"]["villesEpicu"][0], "Paris");
    let id = body["collaborateur"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/equipe?id={id}");
    let (status, body) = common::delete(&app, &uri, Some(TOK_ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
}

#[tokio::test]
async fn birth_date_is_admin_only() {
    let app = seeded_app();
    let uri = format!("/api/equipe?id={ID_LILLE}");
    let (_, body) = common::patch(
        &app,
        &uri,
        Some(TOK_ADMIN),
        json!({ "dateNaissance": "1995-03-14" }),
    )
    .await;
    assert_eq!(body["collaborateur"]["dateNaissance"], "1995-03-14");

    let (_, body) = common::get(&app, "/api/equipe", Some(TOK_LILLE)).await;
    let martin = body["collaborateurs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["nom"] == "Martin")
        .unwrap()
        .clone();
    assert!(martin.get("dateNaissance").is_none());
    assert!(martin.get("telephone").is_none());
}
