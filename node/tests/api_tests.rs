// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use wheretomeetup::config::SyncOptions;
use wheretomeetup::account::OutboundMessage;
use wheretomeetup::error::ApiError;
use wheretomeetup::remote::MeetupApi;
use wheretomeetup::store::{Document, MemoryStore};
use wheretomeetup::types::{GroupId, MemberId, VenueId};
use wheretomeetup_node::errors::NodeError;
use wheretomeetup_node::mail::{dispatch, LogMailer, Mailer};
use wheretomeetup_node::server::{build_router, AppState};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// Meetup stand-in for member 1, organizer of "Rust NYC".
#[derive(Default)]
struct StubApi {
    calls: AtomicUsize,
    /// Serve venue phone numbers as JSON numbers.
    numeric_phone: bool,
}

impl StubApi {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MeetupApi for StubApi {
    async fn member(&self, member_id: MemberId) -> Result<Document, ApiError> {
        self.hit();
        if member_id != MemberId(1) {
            return Err(ApiError::Status { status: 404, message: "member not found".into() });
        }
        Ok(doc(json!({ "id": 1, "name": "Ada", "lon": -73.99, "lat": 40.73 })))
    }

    async fn groups(&self, _member_id: MemberId, _fields: &[&str], _page: u32) -> Result<Vec<Document>, ApiError> {
        self.hit();
        Ok(vec![doc(json!({
            "id": 10,
            "name": "Rust NYC",
            "urlname": "rust-nyc",
            "self": { "role": "Organizer" }
        }))])
    }

    async fn venues(&self, _group_ids: &[GroupId], _fields: &[&str], _page: u32) -> Result<Vec<Document>, ApiError> {
        self.hit();
        let mut our_space = doc(json!({ "id": 100, "name": "Our Space", "lon": -73.98, "lat": 40.72 }));
        if self.numeric_phone {
            our_space.insert("phone".into(), json!(5551234));
        }
        Ok(vec![
            our_space,
            doc(json!({ "id": 101, "name": "Big Hall", "lon": -74.2, "lat": 40.9 })),
        ])
    }

    async fn events(
        &self,
        _group_ids: &[GroupId],
        _status: &[&str],
        _fields: &[&str],
        _page: u32,
    ) -> Result<Vec<Document>, ApiError> {
        self.hit();
        Ok(vec![
            doc(json!({
                "id": "e1",
                "name": "Hack Night",
                "status": "upcoming",
                "time": 1325376000000i64,
                "rsvp_limit": 40,
                "group": { "id": 10, "urlname": "rust-nyc" },
                "venue": { "id": 102, "name": "Garage", "lon": -73.95, "lat": 40.7 }
            })),
            doc(json!({
                "id": "e2",
                "name": "Planning",
                "status": "proposed",
                "group": { "id": 10, "urlname": "rust-nyc" }
            })),
        ])
    }
}

/// Keeps every message it is handed.
#[derive(Default)]
struct RecordingMailer {
    outbox: Mutex<Vec<OutboundMessage>>,
}

impl RecordingMailer {
    fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NodeError> {
        self.outbox.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct Harness {
    app: Router,
    api: Arc<StubApi>,
    mailer: Arc<RecordingMailer>,
    store: Arc<MemoryStore>,
}

fn harness(auth_token: Option<String>) -> Harness {
    build_harness(StubApi::default(), auth_token, None)
}

fn build_harness(api: StubApi, auth_token: Option<String>, snapshot_path: Option<PathBuf>) -> Harness {
    let api = Arc::new(api);
    let mailer = Arc::new(RecordingMailer::default());
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        api: api.clone(),
        mailer: mailer.clone(),
        sync_options: SyncOptions::default(),
        snapshot_path,
    };
    Harness {
        app: build_router(state, auth_token),
        api,
        mailer,
        store,
    }
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn ids(list: &Value) -> Vec<Value> {
    list.as_array().unwrap().iter().map(|v| v["_id"].clone()).collect()
}

async fn synced() -> Harness {
    let h = harness(None);
    let (status, body) = call(&h.app, Method::POST, "/v1/members/1/sync", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    h
}

async fn claim_our_space(h: &Harness) {
    let (status, body) = call(
        &h.app,
        Method::POST,
        "/v1/venues/100/claim",
        Some(json!({
            "member_id": 1,
            "contact_name": "Grace",
            "contact_email": "grace@ourspace.org",
            "capacity": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Thank you for claiming Our Space");
}

#[tokio::test]
async fn sync_reports_counts_then_serves_cache() {
    let h = harness(None);

    let (status, body) = call(&h.app, Method::POST, "/v1/members/1/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refreshed"], true);
    assert_eq!(body["groups"], 1);
    assert_eq!(body["venues"], 2);
    assert_eq!(body["events"], 2);
    assert_eq!(body["event_venues"], 1);
    assert_eq!(body["user"]["organizer_of"], json!([10]));
    assert!(body["user"]["last_synced"].is_string());
    assert_eq!(h.api.calls(), 4);

    let (status, body) = call(&h.app, Method::POST, "/v1/members/1/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refreshed"], false);
    assert_eq!(h.api.calls(), 4);
    assert_eq!(h.store.len("venues").unwrap(), 3);
}

#[tokio::test]
async fn sync_of_unknown_member_is_not_found() {
    let h = harness(None);
    let (status, body) = call(&h.app, Method::POST, "/v1/members/2/sync", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn profile_needs_a_synced_member() {
    let h = harness(None);
    let (status, _) = call(&h.app, Method::GET, "/v1/members/1/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_validates_email() {
    let h = synced().await;

    let (status, _) = call(
        &h.app,
        Method::PUT,
        "/v1/members/1/profile",
        Some(json!({ "email": "not-an-address" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &h.app,
        Method::PUT,
        "/v1/members/1/profile",
        Some(json!({ "email": "ada@example.com", "phone": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("phone").is_none());

    let (_, body) = call(&h.app, Method::GET, "/v1/members/1/profile", None).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn organizer_groups_are_listed() {
    let h = synced().await;
    let (status, body) = call(&h.app, Method::GET, "/v1/members/1/groups", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["groups"]), vec![json!(10)]);
}

#[tokio::test]
async fn group_events_put_venueless_first() {
    let h = synced().await;
    let (status, body) = call(&h.app, Method::GET, "/v1/groups/10/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"]["name"], "Rust NYC");
    assert_eq!(ids(&body["events"]), vec![json!("e2"), json!("e1")]);

    let (status, _) = call(&h.app, Method::GET, "/v1/groups/99/events", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unclaimed_search_by_name_and_location() {
    let h = synced().await;

    let (status, body) = call(&h.app, Method::GET, "/v1/venues/unclaimed?name=our", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["venues"]), vec![json!(100)]);

    let (_, body) = call(&h.app, Method::GET, "/v1/venues/unclaimed", None).await;
    assert_eq!(ids(&body["venues"]), vec![json!(101), json!(102), json!(100)]);

    let (status, _) = call(&h.app, Method::GET, "/v1/venues/unclaimed?lon=-73.9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&h.app, Method::GET, "/v1/venues/unclaimed?name=(", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn claiming_moves_venue_to_members_list() {
    let h = synced().await;

    let (status, body) = call(&h.app, Method::GET, "/v1/venues/100/claim?member_id=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["editing"], false);
    assert_eq!(body["contact"]["name"], "Ada");

    claim_our_space(&h).await;

    let (_, body) = call(&h.app, Method::GET, "/v1/members/1/venues", None).await;
    assert_eq!(ids(&body["venues"]), vec![json!(100)]);

    let (_, body) = call(&h.app, Method::GET, "/v1/members/1/venues/nearby", None).await;
    assert_eq!(ids(&body["venues"]), vec![json!(100)]);

    let (_, body) = call(&h.app, Method::GET, "/v1/venues/unclaimed?name=our", None).await;
    assert!(body["venues"].as_array().unwrap().is_empty());

    let (_, body) = call(&h.app, Method::GET, "/v1/venues/100/claim?member_id=1", None).await;
    assert_eq!(body["editing"], true);
    assert_eq!(body["contact"]["name"], "Grace");
}

#[tokio::test]
async fn claim_requires_contact_name() {
    let h = synced().await;
    claim_our_space(&h).await;

    let (status, body) = call(&h.app, Method::POST, "/v1/venues/100/claim", Some(json!({
        "member_id": 1,
        "contact_name": "",
        "contact_email": "grace@ourspace.org"
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, body) = call(&h.app, Method::GET, "/v1/members/1/venues", None).await;
    assert_eq!(body["venues"][0]["claimed"], true);
    assert_eq!(body["venues"][0]["contact"]["email"], "grace@ourspace.org");
}

#[tokio::test]
async fn space_request_notifies_claimed_hosts() {
    let h = synced().await;
    claim_our_space(&h).await;

    let (status, body) = call(
        &h.app,
        Method::GET,
        "/v1/groups/10/events/e1/request?member_id=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["event_size_known"], true);
    assert_eq!(body["event_time_known"], true);
    assert_eq!(ids(&body["venues"]), vec![json!(100)]);
    assert!(body["body"].as_str().unwrap().contains("Rust NYC"));

    let (status, body) = call(
        &h.app,
        Method::POST,
        "/v1/groups/10/events/e1/request",
        Some(json!({
            "member_id": 1,
            "venue_ids": [100, 101],
            "email": "ada@example.com",
            "body": "Hi {{host}}, can we use {{venue_name}}?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sent"], 1);
    assert_eq!(body["message"], "The host has been notified of your request");

    let outbox = h.mailer.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "grace@ourspace.org");
    assert_eq!(outbox[0].from, "ada@example.com");
    assert_eq!(outbox[0].body, "Hi Grace, can we use Our Space?");
}

#[tokio::test]
async fn space_request_rejects_bad_forms() {
    let h = synced().await;

    let form = |venue_ids: Value, email: &str| {
        json!({ "member_id": 1, "venue_ids": venue_ids, "email": email, "body": "Hello" })
    };

    let (status, _) = call(&h.app, Method::POST, "/v1/groups/10/events/e1/request", Some(form(json!([]), "ada@example.com"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&h.app, Method::POST, "/v1/groups/10/events/e1/request", Some(form(json!([100]), "ada"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing claimed yet.
    let (status, _) = call(&h.app, Method::POST, "/v1/groups/10/events/e1/request", Some(form(json!([100]), "ada@example.com"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&h.app, Method::POST, "/v1/groups/10/events/nope/request", Some(form(json!([100]), "ada@example.com"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(h.mailer.outbox().is_empty());
}

#[tokio::test]
async fn auth_guard_requires_bearer_token() {
    let h = harness(Some("secret".to_string()));

    let (status, _) = call(&h.app, Method::GET, "/v1/venues/unclaimed", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/venues/unclaimed")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn snapshot_route_needs_a_path() {
    let h = harness(None);
    let (status, _) = call(&h.app, Method::POST, "/v1/snapshot/save", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn snapshot_route_ignores_client_paths() {
    let dir = tempfile::tempdir().unwrap();
    let configured = dir.path().join("store.snap");
    let elsewhere = dir.path().join("elsewhere.snap");
    let h = build_harness(StubApi::default(), None, Some(configured.clone()));

    let (status, body) = call(
        &h.app,
        Method::POST,
        "/v1/snapshot/save",
        Some(json!({ "path": elsewhere.to_string_lossy() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], configured.to_string_lossy().to_string());
    assert!(configured.exists());
    assert!(!elsewhere.exists());
}

#[tokio::test]
async fn wrongly_typed_meetup_field_is_a_generic_sync_failure() {
    let api = StubApi {
        numeric_phone: true,
        ..StubApi::default()
    };
    let h = build_harness(api, None, None);

    let (status, body) = call(&h.app, Method::POST, "/v1/members/1/sync", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Could not sync with Meetup, please try again");
}

#[tokio::test]
async fn log_mailer_dispatches_every_message() {
    let mailer = LogMailer::new("noreply@test.local");
    let message = OutboundMessage {
        venue_id: VenueId(100),
        to: "grace@ourspace.org".into(),
        from: "ada@example.com".into(),
        subject: "Space".into(),
        body: "Hello".into(),
    };
    let sent = dispatch(&mailer, &[message.clone(), message]).await.unwrap();
    assert_eq!(sent, 2);
}
