mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use polar_kernel::prelude::{ApiConfig, ApiState};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let store = common::seeded_store();
    let slice = polar_registration::init(&ApiConfig::default(), store.clone(), store)
        .expect("slice builds");
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .register_slice(slice)
        .build()
        .expect("state builds");

    let (router, _api) =
        polar_registration::server::router().with_state(state).split_for_parts();
    router
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value =
        if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
    (status, value)
}

#[tokio::test]
async fn search_returns_matching_sections() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/offerings?query=CSE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["sectionId"], "01");

    let (_, empty) = send(&app, "GET", "/api/offerings", None).await;
    assert_eq!(empty, json!([]));
}

#[tokio::test]
async fn prerequisite_conflict_is_409_with_reason() {
    let app = app();
    let uri = "/api/students/S100/prerequisites";

    let expression = json!({"expression": "major BIO;standing U1"});
    let (status, body) = send(&app, "POST", uri, Some(expression)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "major");
    assert_eq!(body["message"], "You do not fit the major prerequisite of this class");

    let (status, body) = send(&app, "POST", uri, Some(json!({"expression": "standing U2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"eligible": true}));

    let (status, body) = send(&app, "POST", uri, Some(json!({"expression": ">Z CSE,114"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "malformed");
}

#[tokio::test]
async fn cart_commit_reports_failed_selections() {
    let app = app();
    let selections = json!({"selections": [
        {"courseKey": "CSE 214", "sectionId": "01"},
        {"courseKey": "CSE 214", "sectionId": "02"},
    ]});

    let (status, body) = send(&app, "PUT", "/api/students/S100/cart", Some(selections)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["failedSelections"], json!(["CSE 214-02"]));
    assert_eq!(body["failures"][0]["cause"], "no-seats");
    assert_eq!(body["message"], "failed to add: CSE 214-02");

    let (status, cart) = send(&app, "GET", "/api/students/S100/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart[0]["course"]["code"], "214");

    let bio = json!({"selections": [{"courseKey": "BIO 101", "sectionId": "01"}]});
    let (status, body) = send(&app, "PUT", "/api/students/S100/cart", Some(bio)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["committed"], json!([{"courseKey": "BIO 101", "sectionId": "01"}]));
}

#[tokio::test]
async fn record_projections() {
    let app = app();

    let (_, transcript) = send(&app, "GET", "/api/students/S100/transcript", None).await;
    assert_eq!(transcript, json!({"grades": {"CSE 114": "B+"}}));

    let (_, gpa) = send(&app, "GET", "/api/students/S100/gpa", None).await;
    assert_eq!(gpa, json!({"gpa": 3.4}));

    let (status, body) = send(&app, "GET", "/api/students/S999/gpa", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send(&app, "GET", "/api/students/S100/dates/graduation", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let date = json!({"date": "2026-04-01T08:00:00Z"});
    let (status, _) = send(&app, "PUT", "/api/students/S100/dates/enrollment", Some(date)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, "GET", "/api/students/S100/dates/enrollment", None).await;
    assert_eq!(body["field"], "enrollment");
    assert_eq!(body["date"], "2026-04-01T08:00:00Z");
}

#[tokio::test]
async fn timesheet_is_validated_and_replaced() {
    let app = app();
    let uri = "/api/students/S100/timesheet";

    let backwards = json!({"entries": [
        {"status": "worked", "timeIn": "2026-03-02T13:00:00Z", "timeOut": "2026-03-02T09:00:00Z"}
    ]});
    let (status, _) = send(&app, "PUT", uri, Some(backwards)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let shift = json!({"entries": [
        {"status": "worked", "timeIn": "2026-03-02T09:00:00Z", "timeOut": "2026-03-02T13:00:00Z"}
    ]});
    let (status, _) = send(&app, "PUT", uri, Some(shift.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, shift);
}
