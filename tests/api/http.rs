//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use lernreise::api;
use serde_json::{json, Value};

use crate::support::{FakeCatalog, Fixture};

/// Bind to port 0 and return the base url plus the catalog handle.
async fn start_server() -> (String, FakeCatalog) {
    let Fixture {
        service, catalog, ..
    } = Fixture::with_course();
    let app = api::router(Arc::new(api::handlers::api(service)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), catalog)
}

#[tokio::test]
async fn health_pings_catalog() {
    let (base, catalog) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["commands"].as_array().unwrap().len(), 12);

    catalog.fail_ping(true);
    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn select_and_submit_over_http() {
    let (base, _catalog) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/instance.select"))
        .header("x-user-id", "anna")
        .header("x-display-name", "Anna Schmidt")
        .json(&json!({ "course_id": "course1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let id = body["instance"]["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{base}/task.submit"))
        .header("x-user-id", "anna")
        .json(&json!({ "instance_id": id, "module_id": "mod1", "task_id": "task1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["xp_awarded"], 60);
}

#[tokio::test]
async fn empty_body_is_empty_input() {
    let (base, _catalog) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/instance.list"))
        .header("x-user-id", "anna")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "instances": [] }));
}

#[tokio::test]
async fn error_statuses() {
    let (base, _catalog) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/instance.list"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{base}/instance.get"))
        .header("x-user-id", "anna")
        .json(&json!({ "instance_id": "missing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "not_found");

    let resp = client
        .post(format!("{base}/instance.select"))
        .header("x-user-id", "anna")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/nope"))
        .header("x-user-id", "anna")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
