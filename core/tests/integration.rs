//! End-to-end runs against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives `ApiClient` through the
//! default `ReqwestTransport`, so URL building, header merging, body
//! encoding, status mapping and the timeout race are all checked over real
//! HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use fetch_core::{
    ApiClient, ClientConfig, Error, FormData, Locale, Payload, RequestBody, RequestOptions,
};
use mock_server::{Echo, User};
use serde_json::{json, Value};

async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    addr
}

async fn client() -> ApiClient {
    let addr = start_server().await;
    let config = ClientConfig::builder(format!("http://{addr}"))
        .header("X-Client", "integration")
        .build()
        .unwrap();
    ApiClient::new(config)
}

#[tokio::test(flavor = "multi_thread")]
async fn user_lifecycle() {
    let client = client().await;

    // Step 1: create.
    let options = RequestOptions::new()
        .json(&json!({"name": "Ana", "email": "ana@example.com"}))
        .unwrap();
    let created: User = client.post("/users", options).await.unwrap();
    assert_eq!(created.name, "Ana");
    let id = created.id;

    // Step 2: partial update.
    let options = RequestOptions::new().json(&json!({"name": "Ana Maria"})).unwrap();
    let updated: User = client.patch(&format!("/users/{id}"), options).await.unwrap();
    assert_eq!(updated.name, "Ana Maria");
    assert_eq!(updated.email, "ana@example.com");

    // Step 3: delete — 204 yields nothing.
    let deleted: Option<Value> = client
        .delete(&format!("users/{id}"), RequestOptions::new())
        .await
        .unwrap();
    assert!(deleted.is_none());

    // Step 4: get after delete — localized 404 with the server's body.
    let err = client
        .get::<User>(&format!("/users/{id}"), RequestOptions::new())
        .await
        .unwrap_err();
    match err {
        Error::Client(e) => {
            assert_eq!(e.status, 404);
            assert_eq!(e.message, "El recurso solicitado no fue encontrado.");
            assert_eq!(e.body, Some(json!({"error": "not_found"})));
        }
        other => panic!("expected ClientError, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_sees_query_headers_and_body() {
    let client = client().await;

    let options = RequestOptions::new()
        .search_param("tags", json!(["a", "b"]))
        .search_param("active", true)
        .header("x-client", "override")
        .json(&json!({"k": "v"}))
        .unwrap();
    let echo: Echo = client.put("/echo", options).await.unwrap();

    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("active=true&tags=a&tags=b"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.headers.get("x-client").map(String::as_str), Some("override"));
    assert_eq!(echo.body, r#"{"k":"v"}"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_form_is_sent_as_multipart() {
    let client = client().await;

    let form = FormData::new()
        .text("title", "report")
        .file("file", "r.txt", Some("text/plain".to_string()), b"hello".to_vec());
    let options = RequestOptions::new().body(RequestBody::Form(form));
    let echo: Echo = client.post("/echo", options).await.unwrap();

    let content_type = echo.content_type.unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(echo.body.contains("name=\"title\""));
    assert!(echo.body.contains("hello"));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_without_body_has_no_content_type() {
    let client = client().await;

    let echo: Echo = client.get("/echo", RequestOptions::new()).await.unwrap();
    assert!(echo.content_type.is_none());
    assert!(echo.query.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_text_response() {
    let client = client().await;

    let payload = client
        .send(fetch_core::HttpMethod::Get, "/text", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(payload, Payload::Text("plain text response".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_in_english() {
    let client = client().await;

    let options = RequestOptions::new().locale(Locale::En);
    let err = client.get::<Value>("/status/503", options).await.unwrap_err();
    let err = err.as_client_error().expect("expected ClientError");
    assert_eq!(err.status, 503);
    assert_eq!(err.status_text, "Service Unavailable");
    assert_eq!(err.message, "Service unavailable.");
    assert_eq!(err.body.as_ref().unwrap()["code"], 503);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_endpoint_times_out() {
    let client = client().await;

    let options = RequestOptions::new().timeout(Duration::from_millis(50));
    let err = client.get::<Value>("/slow/2000", options).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.as_client_error().unwrap().status, 408);
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = ClientConfig::builder(format!("http://{addr}")).build().unwrap();
    let client = ApiClient::new(config);

    let err = client
        .get::<Value>("/users", RequestOptions::new())
        .await
        .unwrap_err();
    match err {
        Error::Transport(inner) => assert!(inner.downcast_ref::<reqwest::Error>().is_some()),
        other => panic!("expected transport error, got {other:?}"),
    }
}
