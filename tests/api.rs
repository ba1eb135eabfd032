use std::sync::Arc;

use axum::Router;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use contact_tracer::app_state::AppState;
use contact_tracer::handlers::router;
use contact_tracer::models::{Contact, InsertResult, User};
use contact_tracer::store::{ContactFilter, ContactStore, SqliteStore, StoreError};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(deduplicate: bool) -> Router {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    router(AppState::new(Arc::new(store)).with_deduplication(deduplicate))
}

/// Backend whose every round trip fails.
struct DownStore;

#[async_trait::async_trait]
impl ContactStore for DownStore {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Corrupt("connection refused".into()))
    }

    async fn insert_user(&self, _user: &User) -> Result<InsertResult, StoreError> {
        Err(StoreError::Corrupt("connection refused".into()))
    }

    async fn find_user(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Corrupt("connection refused".into()))
    }

    async fn insert_contact(&self, _contact: &Contact) -> Result<InsertResult, StoreError> {
        Err(StoreError::Corrupt("connection refused".into()))
    }

    async fn find_contacts(&self, _filter: &ContactFilter) -> Result<Vec<Contact>, StoreError> {
        Err(StoreError::Corrupt("connection refused".into()))
    }
}

async fn app() -> Router {
    app_with(false).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn add_contact(app: &Router, one: &str, two: &str, at: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/contacts",
        Some(json!({ "useridone": one, "useridtwo": two, "timeofcontact": at })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["InsertedID"].is_i64());
}

async fn contacts_of(app: &Router, user: &str, infection: &str) -> (StatusCode, Value) {
    send(
        app,
        "GET",
        &format!("/contacts?user={user}&infection_timestamp={infection}"),
        None,
    )
    .await
}

fn sorted(value: &Value) -> Vec<String> {
    let mut ids: Vec<String> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn created_user_is_fetched_by_id() {
    let app = app().await;
    let user = json!({
        "id": "u1",
        "name": "Ada Lovelace",
        "dateofbirth": "1815-12-10",
        "phonenumber": "555-0100",
        "emailaddress": "ada@example.com",
        "creationtimestamp": "2020-10-01T12:00:00Z"
    });

    let (status, created) = send(&app, "POST", "/users", Some(user.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(created["InsertedID"].is_i64());

    let (status, fetched) = send(&app, "GET", "/users/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, user);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/users/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn contacts_are_matched_in_either_slot() {
    let app = app().await;
    add_contact(&app, "u1", "u2", "2020-10-10T00:00:00Z").await;
    add_contact(&app, "u2", "u3", "2020-10-10T00:00:00Z").await;

    let (status, body) = contacts_of(&app, "u2", "2020-10-10T00:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sorted(&body), vec!["u1", "u3"]);
}

#[tokio::test]
async fn window_bounds_are_inclusive_and_outsiders_excluded() {
    let app = app().await;
    add_contact(&app, "p", "start", "2020-10-01T00:00:00Z").await;
    add_contact(&app, "end", "p", "2020-10-15T00:00:00Z").await;
    add_contact(&app, "p", "too-early", "2020-09-30T23:59:59Z").await;
    add_contact(&app, "p", "too-late", "2020-10-15T00:00:01Z").await;
    add_contact(&app, "x", "y", "2020-10-10T00:00:00Z").await;

    let (status, body) = contacts_of(&app, "p", "2020-10-15T00:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sorted(&body), vec!["end", "start"]);
}

#[tokio::test]
async fn no_edges_yields_empty_array() {
    let app = app().await;
    let (status, body) = contacts_of(&app, "lonely", "2020-10-15T00:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn trailing_slash_route_answers_the_query() {
    let app = app().await;
    add_contact(&app, "a", "b", "2020-10-10T00:00:00Z").await;
    let (status, body) = send(
        &app,
        "GET",
        "/contacts/?user=a&infection_timestamp=2020-10-10T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["b"]));
}

#[tokio::test]
async fn duplicates_kept_by_default_and_collapsed_when_enabled() {
    for (deduplicate, expected) in [(false, json!(["b", "b"])), (true, json!(["b"]))] {
        let app = app_with(deduplicate).await;
        add_contact(&app, "a", "b", "2020-10-09T00:00:00Z").await;
        add_contact(&app, "b", "a", "2020-10-10T00:00:00Z").await;

        let (status, body) = contacts_of(&app, "a", "2020-10-10T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }
}

#[tokio::test]
async fn unparsable_infection_timestamp_is_a_client_error() {
    let app = app().await;
    add_contact(&app, "a", "b", "1970-01-01T00:00:00Z").await;

    let (status, body) = contacts_of(&app, "a", "2006-01-02%2015:04:05").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = send(&app, "GET", "/contacts?user=a", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/contacts?infection_timestamp=2020-10-10T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/contacts",
        Some(json!({ "useridone": 5, "useridtwo": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn unregistered_paths_do_not_fall_through_to_user_lookup() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/whatever", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn padded_ids_are_matched_verbatim() {
    let app = app().await;
    add_contact(&app, " u1", "x", "2020-10-10T00:00:00Z").await;

    let (status, body) = contacts_of(&app, "%20u1", "2020-10-10T00:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["x"]));

    let (status, body) = contacts_of(&app, "u1", "2020-10-10T00:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn storage_failure_is_a_server_error_and_service_keeps_answering() {
    // No schema applied, so every table access fails.
    let store = SqliteStore::in_memory().await.unwrap();
    let app = router(AppState::new(Arc::new(store)));

    let (status, body) = send(&app, "POST", "/users", Some(json!({ "id": "u1" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");

    let (status, body) = contacts_of(&app, "u1", "2020-10-10T00:00:00Z").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unreachable_store_reports_unavailable_health() {
    let app = router(AppState::new(Arc::new(DownStore)));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "service_unavailable");

    let (status, body) = send(&app, "GET", "/users/u1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
