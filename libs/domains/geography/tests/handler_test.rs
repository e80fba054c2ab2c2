//! Handler tests for the geography domain
//!
//! Exercise the localities router on top of the in-memory store:
//! - Request deserialization and validation
//! - Response shape and HTTP status codes
//! - Error bodies for conflicts and missing localities

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_geography::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn app(repository: InMemoryGeographyRepository) -> Router {
    handlers::router(GeographyService::new(repository))
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_locality_handler_returns_201() {
    let builder = TestDataBuilder::from_test_name("handler_create_201");
    let locality_id = builder.locality_id();
    let app = app(InMemoryGeographyRepository::new());

    let response = app
        .oneshot(post_json(json!({
            "id": locality_id,
            "localityName": "Rosario",
            "provinceName": "Santa Fe",
            "countryName": "Argentina"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let created: ResponseGeography = json_body(response.into_body()).await;
    assert_eq!(created.locality_id, locality_id);
    assert_eq!(created.locality_name, "Rosario");
    assert_eq!(created.province_name, "Santa Fe");
    assert_eq!(created.country_name, "Argentina");
}

#[tokio::test]
async fn test_create_locality_handler_uses_camel_case() {
    let app = app(InMemoryGeographyRepository::new());

    let response = app
        .oneshot(post_json(json!({
            "id": "2000",
            "localityName": "Rosario",
            "provinceName": "Santa Fe",
            "countryName": "Argentina"
        })))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["localityId"], "2000");
    assert_eq!(body["localityName"], "Rosario");
    assert_eq!(body["provinceName"], "Santa Fe");
    assert_eq!(body["countryName"], "Argentina");
}

#[tokio::test]
async fn test_create_locality_handler_returns_409_for_duplicate_id() {
    let repository = InMemoryGeographyRepository::new();
    let app = app(repository.clone());
    let body = json!({
        "id": "2000",
        "localityName": "Rosario",
        "provinceName": "Santa Fe",
        "countryName": "Argentina"
    });

    let first = app.clone().oneshot(post_json(body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post_json(body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let error: Value = json_body(second.into_body()).await;
    assert_eq!(error["error"], "CONFLICT");
    assert_eq!(error["message"], "locality already exists");

    assert_eq!(repository.country_count().await, 1);
    assert_eq!(repository.province_count().await, 1);
    assert_eq!(repository.locality_count().await, 1);
}

#[tokio::test]
async fn test_create_locality_handler_validates_input() {
    let repository = InMemoryGeographyRepository::new();
    let app = app(repository.clone());

    let response = app
        .oneshot(post_json(json!({
            "id": "2000",
            "localityName": "Rosario",
            "provinceName": "   ",
            "countryName": ""
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response.into_body()).await;
    assert_eq!(error["error"], "VALIDATION_ERROR");
    assert!(error["details"].is_object());

    // Nothing reached the store
    assert_eq!(repository.country_count().await, 0);
}

#[tokio::test]
async fn test_create_locality_handler_rejects_missing_fields() {
    let app = app(InMemoryGeographyRepository::new());

    let response = app
        .oneshot(post_json(json!({ "id": "2000" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_get_locality_handler_returns_200() {
    let app = app(InMemoryGeographyRepository::new());

    let created = app
        .clone()
        .oneshot(post_json(json!({
            "id": "5000",
            "localityName": "Córdoba",
            "provinceName": "Córdoba",
            "countryName": "Argentina"
        })))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/5000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let found: ResponseGeography = json_body(response.into_body()).await;
    assert_eq!(found.locality_id, "5000");
    assert_eq!(found.province_name, "Córdoba");
    assert_eq!(found.country_name, "Argentina");
}

#[tokio::test]
async fn test_get_locality_handler_returns_404() {
    let app = app(InMemoryGeographyRepository::new());

    let response = app.oneshot(get("/9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: Value = json_body(response.into_body()).await;
    assert_eq!(error["error"], "NOT_FOUND");
}
