//! Dispatching every command through the registered handlers.

use std::collections::HashMap;

use lernreise::api::{self, Api, CommandRequest, HandlerError, Session};
use serde_json::{json, Value};

use crate::support::{rust_basics, FakeCatalog, FakeRegistry, Fixture, TestService};

struct Harness {
    api: Api<TestService>,
    catalog: FakeCatalog,
    registry: FakeRegistry,
}

fn harness() -> Harness {
    let Fixture {
        service,
        catalog,
        registry,
        ..
    } = Fixture::with_course();
    Harness {
        api: api::handlers::api(service),
        catalog,
        registry,
    }
}

fn anna() -> Session {
    let mut session = Session::for_user("anna");
    session.set(api::DISPLAY_NAME, "Anna Schmidt");
    session.set(api::EMAIL, "anna@example.org");
    session
}

fn select(api: &Api<TestService>) -> String {
    let result = api
        .dispatch("instance.select", json!({ "course_id": "course1" }), anna())
        .unwrap();
    result["instance"]["id"].as_str().unwrap().to_string()
}

#[test]
fn all_commands_registered() {
    let Harness { api, .. } = harness();
    assert_eq!(
        api.commands(),
        vec![
            "catalog.detail",
            "catalog.list",
            "context.resolve",
            "instance.abandon",
            "instance.active",
            "instance.get",
            "instance.list",
            "instance.pause",
            "instance.resume",
            "instance.select",
            "progress.list",
            "task.submit",
        ]
    );
}

#[test]
fn resolve_and_browse_catalog() {
    let Harness { api, registry, .. } = harness();

    let result = api.dispatch("context.resolve", json!({}), anna()).unwrap();
    assert_eq!(result, json!({ "context_id": "ctx-anna" }));
    assert_eq!(registry.registrations()[0].given_name, "Anna");

    let result = api.dispatch("catalog.list", json!({}), anna()).unwrap();
    assert_eq!(result["courses"][0]["id"], "course1");

    let result = api
        .dispatch("catalog.detail", json!({ "course_id": "course1" }), anna())
        .unwrap();
    assert_eq!(result, serde_json::to_value(rust_basics()).unwrap());
    assert_eq!(result["modules"][0]["progressPercent"], 0);
}

#[test]
fn select_submit_and_audit() {
    let Harness { api, .. } = harness();
    let id = select(&api);

    let active = api.dispatch("instance.active", json!({}), anna()).unwrap();
    assert_eq!(active["instance"]["id"], id.as_str());
    assert_eq!(active["instance"]["status"], "active");

    let result = api
        .dispatch(
            "task.submit",
            json!({ "instance_id": id, "module_id": "mod1", "task_id": "task1" }),
            anna(),
        )
        .unwrap();
    assert_eq!(result["xp_awarded"], 60);
    assert_eq!(result["event"]["new_state"], "done");
    assert_eq!(result["instance"]["progress_percent"], 33);
    assert_eq!(result["course"]["progressPercent"], 33);

    let events = api
        .dispatch("progress.list", json!({ "instance_id": id }), anna())
        .unwrap();
    assert_eq!(events["events"].as_array().unwrap().len(), 1);

    let list = api.dispatch("instance.list", json!({}), anna()).unwrap();
    assert_eq!(list["instances"].as_array().unwrap().len(), 1);
}

#[test]
fn lifecycle_commands() {
    let Harness { api, .. } = harness();
    let id = select(&api);
    let input = json!({ "instance_id": id });

    let paused = api.dispatch("instance.pause", input.clone(), anna()).unwrap();
    assert_eq!(paused["status"], "paused");

    let active = api.dispatch("instance.active", json!({}), anna()).unwrap();
    assert_eq!(active, json!({ "instance": Value::Null }));

    let resumed = api.dispatch("instance.resume", input.clone(), anna()).unwrap();
    assert_eq!(resumed["status"], "active");

    let abandoned = api.dispatch("instance.abandon", input.clone(), anna()).unwrap();
    assert_eq!(abandoned["status"], "abandoned");

    let fetched = api.dispatch("instance.get", input, anna()).unwrap();
    assert_eq!(fetched["status"], "abandoned");
}

#[test]
fn guard_rejects_missing_fields() {
    let Harness { api, catalog, .. } = harness();

    let result = api.dispatch("task.submit", json!({ "instance_id": "i-1" }), anna());
    assert!(matches!(result, Err(HandlerError::GuardRejected(ref c)) if c == "task.submit"));

    let result = api.dispatch("instance.select", json!({ "course_id": "" }), anna());
    assert!(matches!(result, Err(HandlerError::GuardRejected(_))));
    assert_eq!(catalog.fetches(), 0);
}

#[test]
fn missing_session_is_unauthorized() {
    let Harness { api, .. } = harness();
    let result = api.dispatch("instance.list", json!({}), Session::new());
    assert!(matches!(result, Err(HandlerError::Unauthorized(_))));
}

#[test]
fn service_errors_map_to_statuses() {
    let Harness { api, catalog, .. } = harness();
    let id = select(&api);

    let request = |command: &str, input: Value, user: &str| CommandRequest {
        command: command.to_string(),
        input,
        session_variables: HashMap::from([("x-user-id".to_string(), user.to_string())]),
    };

    // conflict carries the existing instance
    let resp = api.dispatch_request(&request(
        "instance.select",
        json!({ "course_id": "course1" }),
        "anna",
    ));
    assert_eq!(resp.status, 409);
    assert_eq!(resp.body["kind"], "conflict");
    assert_eq!(resp.body["instance_id"], id.as_str());

    let resp = api.dispatch_request(&request("instance.get", json!({ "instance_id": id }), "max"));
    assert_eq!(resp.status, 404);

    let resp = api.dispatch_request(&request("instance.pause", json!({ "instance_id": id }), "max"));
    assert_eq!(resp.status, 403);

    let resp = api.dispatch_request(&request("instance.resume", json!({ "instance_id": id }), "anna"));
    assert_eq!(resp.status, 400);

    catalog.fail_submit(true);
    let resp = api.dispatch_request(&request(
        "task.submit",
        json!({ "instance_id": id, "module_id": "mod1", "task_id": "task1" }),
        "anna",
    ));
    assert_eq!(resp.status, 502);
    assert_eq!(resp.body["kind"], "upstream_unavailable");

    let resp = api.dispatch_request(&request("instance.delete", json!({}), "anna"));
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["kind"], "unknown_command");
}
