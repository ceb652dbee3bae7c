//! Handler-level tests: route wiring, status codes, and the JSON error
//! envelope.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use campus_passkey::config::Config;
use campus_passkey::db::{ChallengeStore, CredentialStore};
use campus_passkey::handlers;
use campus_passkey::state::AppState;
use campus_passkey::webauthn::CeremonyManager;

async fn app() -> axum::Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "sqlite::memory:".into(),
        rp_id: "localhost".into(),
        rp_origin: "http://localhost:5173".into(),
        rp_name: "Campus Academic System".into(),
        challenge_ttl_secs: 300,
    };
    let ceremonies = CeremonyManager::new(
        &config,
        ChallengeStore::new(pool.clone()),
        CredentialStore::new(pool.clone()),
    );

    handlers::router(AppState { db: pool, ceremonies })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app().await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_start_returns_options() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::get("/webauthn/register/start?subject=S1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["rp"]["id"], "localhost");
    assert_eq!(body["user"]["name"], "S1");
    assert_eq!(body["attestation"], "none");
    assert_eq!(body["authenticatorSelection"]["userVerification"], "required");
    assert!(body["challenge"].as_str().unwrap().len() >= 43); // 32 bytes base64url
}

#[tokio::test]
async fn register_start_without_subject_is_bad_request() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::get("/webauthn/register/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn auth_start_includes_allow_credentials() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::get("/webauthn/auth/start?subject=S1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["rpId"], "localhost");
    assert_eq!(body["userVerification"], "required");
    assert!(body["allowCredentials"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn auth_finish_without_start_is_unauthorized() {
    let app = app().await;

    let request_body = serde_json::json!({
        "subject": "S1",
        "response": {
            "id": "AAAA",
            "rawId": "AAAA",
            "response": {
                "clientDataJSON": "AAAA",
                "authenticatorData": "AAAA",
                "signature": "AAAA",
            },
        },
    });

    let response = app
        .oneshot(
            Request::post("/webauthn/auth/finish")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("no ceremony"));
}

#[tokio::test]
async fn register_finish_without_start_is_bad_request() {
    let app = app().await;

    let request_body = serde_json::json!({
        "subject": "S1",
        "response": {
            "id": "AAAA",
            "rawId": "AAAA",
            "response": {
                "clientDataJSON": "AAAA",
                "attestationObject": "AAAA",
            },
        },
    });

    let response = app
        .oneshot(
            Request::post("/webauthn/register/finish")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn credentials_listing_starts_empty() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::get("/webauthn/credentials?subject=S1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}
