use axum::body::Body;
use axum::http::{Request, StatusCode};
use polar_server::Server;
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn boots_on_in_memory_database() {
    let server = Server::builder().build().await.expect("server builds on mem://");
    assert_eq!(server.state().slice_names().collect::<Vec<_>>(), vec!["registration"]);

    let response = server
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_student_is_404_through_the_full_stack() {
    let server = Server::builder().build().await.expect("server builds on mem://");

    let response = server
        .router()
        .oneshot(Request::get("/api/students/S404/gpa").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["kind"], "not_found");
}
