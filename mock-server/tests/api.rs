use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- users ---

#[tokio::test]
async fn create_user_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/users",
            r#"{"name":"Ana","email":"ana@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    assert_eq!(user.name, "Ana");
}

#[tokio::test]
async fn get_user_not_found_has_json_body() {
    let resp = app()
        .oneshot(empty_request(
            "GET",
            "/users/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn user_lifecycle() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            r#"{"name":"Ana","email":"ana@example.com"}"#,
        ))
        .await
        .unwrap();
    let created: User = body_json(resp).await;
    let id = created.id;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/users/{id}"),
            r#"{"name":"Ana Maria"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: User = body_json(resp).await;
    assert_eq!(updated.name, "Ana Maria");
    assert_eq!(updated.email, "ana@example.com");

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app
        .oneshot(empty_request("GET", &format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_request() {
    let resp = app()
        .oneshot(json_request("PUT", "/echo?a=1&b=2", r#"{"x":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"x":1}"#);
}

// --- status / text ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app().oneshot(empty_request("GET", "/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["code"], 503);
}

#[tokio::test]
async fn status_route_rejects_non_numeric() {
    let resp = app().oneshot(empty_request("GET", "/status/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn text_route_is_plain_text() {
    let resp = app().oneshot(empty_request("GET", "/text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_bytes(resp).await, "plain text response");
}
