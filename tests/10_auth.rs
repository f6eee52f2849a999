mod common;

use axum::http::StatusCode;
use epicu_api::testing::{seeded_app, TOK_EXPIRED, TOK_LILLE};

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access token manquant");
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", Some("tok-nope")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token invalide");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", Some(TOK_EXPIRED)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token expiré");
}

#[tokio::test]
async fn valid_token_passes() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/api/etablissements", Some(TOK_LILLE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["etablissements"].is_array());
}

#[tokio::test]
async fn query_parameter_token_fallback() {
    let app = seeded_app();
    let uri = format!("/api/etablissements?accessToken={TOK_LILLE}");
    let (status, _) = common::get(&app, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unsupported_verb_gets_a_405_with_allow() {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let app = seeded_app();
    let request = Request::builder()
        .method("PUT")
        .uri("/api/etablissements")
        .header(header::AUTHORIZATION, format!("Bearer {TOK_LILLE}"))
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response
        .headers()
        .get(header::ALLOW)
        .expect("405 must carry an Allow header")
        .to_str()
        .unwrap();
    assert!(allow.contains("GET"));
    assert!(allow.contains("POST"));
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = seeded_app();
    let (status, body) = common::get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
