//! Wire-contract tests for the analytics API.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use booth_api::{create_router, AppState};
use booth_models::ARTIST_COUNT;

async fn app() -> (Router, AppState) {
    let state = AppState::for_tests().await;
    (create_router(state.clone(), None), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn user_access_creates_and_returns_201() {
    let (app, _) = app().await;

    let response = app
        .oneshot(post_json(
            "/userAccess",
            json!({
                "userId": "U1",
                "accessId": "acc-1",
                "artistId": 4,
                "takePhoto": 0,
                "takeVideo": 0,
                "saveAndShare": 0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["accessId"], "acc-1");
    assert_eq!(body["message"], "New transaction created");
}

#[tokio::test]
async fn user_access_missing_fields_is_400() {
    let (app, _) = app().await;

    let response = app
        .oneshot(post_json("/userAccess", json!({ "userId": "U1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_transaction_invalid_field_is_400() {
    let (app, state) = app().await;
    let access = booth_models::AccessId::from_string("acc-2");
    state.store.create_access("U1", &access, 1).await.unwrap();

    let response = app
        .oneshot(post_json(
            "/updateTransaction",
            json!({ "accessId": "acc-2", "field": "droppedTables" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad request: Invalid field");
}

#[tokio::test]
async fn update_transaction_unknown_access_is_500() {
    let (app, _) = app().await;

    let response = app
        .oneshot(post_json(
            "/updateTransaction",
            json!({ "accessId": "missing", "field": "takePhoto" }),
        ))
        .await
        .unwrap();

    // The dashboard contract reports an unknown accessId as a server error
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn update_transaction_increments_exactly_once() {
    let (app, state) = app().await;
    let access = booth_models::AccessId::from_string("acc-3");
    state.store.create_access("U1", &access, 2).await.unwrap();

    let response = app
        .oneshot(post_json(
            "/updateTransaction",
            json!({ "accessId": "acc-3", "field": "takePhoto" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.store.counters(&access).await.unwrap(), (1, 0, 0));
    assert!(state.store.updated_at(&access).await.unwrap().is_some());
}

#[tokio::test]
async fn get_transactions_empty_zero_fills_artists() {
    let (app, _) = app().await;

    let response = app.oneshot(get("/getTransactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["totalRecords"], 0);
    let by_artist = body["sumByArtist"].as_array().unwrap();
    assert_eq!(by_artist.len(), ARTIST_COUNT as usize);
    for (i, artist) in by_artist.iter().enumerate() {
        assert_eq!(artist["artistId"], i as u64 + 1);
        assert_eq!(artist["totalRows"], 0);
    }
    assert_eq!(
        body["saveShareByArtist"].as_array().unwrap().len(),
        ARTIST_COUNT as usize
    );
}

#[tokio::test]
async fn get_transactions_wrong_method_is_405() {
    let (app, _) = app().await;

    let response = app
        .oneshot(post_json("/getTransactions", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn session_resolves_encrypted_parameters() {
    let (app, state) = app().await;

    let uri = format!(
        "/session?userid={}&consent={}&age={}&artistId={}",
        state.crypto.encrypt("U555"),
        state.crypto.encrypt("true"),
        state.crypto.encrypt("23"),
        state.crypto.encrypt("4"),
    );

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["userId"], "U555");
    assert_eq!(body["consent"], true);
    assert_eq!(body["age"], 23);
    assert_eq!(body["artistId"], 4);
    let access_id = body["accessId"].as_str().unwrap().to_string();

    // The visit was recorded under the generated access id
    let access = booth_models::AccessId::from_string(access_id);
    assert_eq!(state.store.counters(&access).await.unwrap(), (0, 0, 0));
}

#[tokio::test]
async fn session_missing_parameters_is_scan_to_begin() {
    let (app, _) = app().await;

    let response = app.oneshot(get("/session?userid=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "SCAN_TO_BEGIN");
}

#[tokio::test]
async fn session_tampered_ciphertext_is_scan_to_begin() {
    let (app, state) = app().await;

    let uri = format!(
        "/session?userid=AAAA&consent={}&age={}&artistId={}",
        state.crypto.encrypt("true"),
        state.crypto.encrypt("23"),
        state.crypto.encrypt("4"),
    );

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_unknown_artist_rejected() {
    let (app, state) = app().await;

    let uri = format!(
        "/session?userid={}&consent={}&age={}&artistId={}",
        state.crypto.encrypt("U1"),
        state.crypto.encrypt("true"),
        state.crypto.encrypt("23"),
        state.crypto.encrypt("99"),
    );

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _) = app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}
