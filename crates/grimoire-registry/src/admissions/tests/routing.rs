use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request as HttpRequest, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::admissions::router::{admission_router, create_handler};
use crate::admissions::service::RequestRegistry;

fn router() -> Router {
    let (registry, _) = build_registry();
    admission_router(Arc::new(registry))
}

fn json_request(method: Method, uri: &str, body: Value) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn empty_request(method: Method, uri: &str) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

fn noelle_json() -> Value {
    json!({
        "identity": "ID123456",
        "given_name": "Noelle",
        "family_name": "Silva",
        "age": 25,
        "affinity": "Light"
    })
}

#[tokio::test]
async fn create_route_returns_created_then_conflict() {
    let router = router();

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/requests", noelle_json()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "Pending");
    assert_eq!(payload["id"], 1);

    let response = router
        .oneshot(json_request(Method::POST, "/api/v1/requests", noelle_json()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_route_maps_bad_payloads_to_bad_request() {
    let router = router();

    let mut too_old = noelle_json();
    too_old["age"] = json!(100);
    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/requests", too_old))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut unknown_affinity = noelle_json();
    unknown_affinity["affinity"] = json!("Lightning");
    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/requests",
            unknown_affinity,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("malformed payload"));
}

#[tokio::test]
async fn status_route_approves_once() {
    let router = router();
    router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/requests", noelle_json()))
        .await
        .expect("route executes");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/v1/requests/1/status",
            json!({ "status": "approved" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["request"]["status"], "Approved");
    assert!(payload["category"].is_string());

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/v1/requests/1/status",
            json!({ "status": "rejected" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/requests/1",
            json!({ "age": 30 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/assignments"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let views = payload.as_array().expect("array of assignments");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["given_name"], "Noelle");
}

#[tokio::test]
async fn update_route_accepts_partial_payloads() {
    let router = router();
    router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/requests", noelle_json()))
        .await
        .expect("route executes");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/requests/1",
            json!({ "age": 30 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/requests/1"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["age"], 30);
    assert_eq!(payload["given_name"], "Noelle");
}

#[tokio::test]
async fn missing_requests_are_not_found() {
    let router = router();

    for request in [
        empty_request(Method::DELETE, "/api/v1/requests/7"),
        empty_request(Method::GET, "/api/v1/requests/7"),
        json_request(Method::PUT, "/api/v1/requests/7", json!({ "age": 3 })),
        json_request(
            Method::PATCH,
            "/api/v1/requests/7/status",
            json!({ "status": "approved" }),
        ),
        json_request(Method::PUT, "/api/v1/requests/7", json!({ "age": 500 })),
        json_request(
            Method::PATCH,
            "/api/v1/requests/7/status",
            json!({ "status": "bogus" }),
        ),
    ] {
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn delete_route_removes_request() {
    let router = router();
    router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/requests", noelle_json()))
        .await
        .expect("route executes");

    let response = router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/api/v1/requests/1"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["deleted"], 1);

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/requests"))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await, json!([]));
}

#[tokio::test]
async fn create_handler_hides_storage_details() {
    let registry = Arc::new(RequestRegistry::new(
        Arc::new(UnavailableRepository),
        seeded_engine(),
    ));

    let response = create_handler::<UnavailableRepository>(
        State(registry),
        Ok(axum::Json(noelle())),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "internal server error");
}
