//! Contract tests for the HTTP action layer against a stubbed backend.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agora_client::{ApiClient, ApiError};
use agora_types::api::{CreateThreadRequest, LoginRequest};

fn thread_json(id: Uuid, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "author": {
            "id": Uuid::new_v4(),
            "username": "ada",
            "display_name": "Ada"
        },
        "tags": ["rust"],
        "view_count": 3,
        "post_count": 1,
        "pinned": false,
        "locked": false,
        "status": "active",
        "created_at": "2026-08-01T10:00:00Z",
        "updated_at": "2026-08-01T10:00:00Z"
    })
}

#[tokio::test]
async fn bearer_token_is_attached_and_envelope_unwrapped() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/v1/threads"))
        .and(header("Authorization", "Bearer tok-123"))
        .and(body_json(json!({
            "title": "Hello world",
            "content": "first thread body",
            "tags": []
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": thread_json(id, "Hello world")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).with_token("tok-123");
    let thread = client
        .create_thread(&CreateThreadRequest {
            title: "Hello world".into(),
            content: "first thread body".into(),
            tags: vec![],
        })
        .await
        .unwrap();

    assert_eq!(thread.id, id);
    assert_eq!(thread.title, "Hello world");
}

#[tokio::test]
async fn missing_token_short_circuits_without_a_request() {
    let server = MockServer::start().await;
    // No mocks mounted: any request hitting the server would 404 and the
    // expect(0) default would flag it. AuthRequired must fire first.
    let client = ApiClient::new(server.uri());

    let err = client
        .create_thread(&CreateThreadRequest {
            title: "Hello world".into(),
            content: "first thread body".into(),
            tags: vec![],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AuthRequired));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn backend_401_maps_to_auth_required() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).with_token("expired");
    let err = client.list_notifications().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthRequired));
}

#[tokio::test]
async fn backend_404_maps_to_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/threads/{id}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.get_thread(id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn envelope_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "error": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client
        .login(&LoginRequest { email: "a@b.c".into(), password: "pw123456".into() })
        .await
        .unwrap_err();

    match err {
        ApiError::RequestFailed { message, .. } => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_envelope_on_2xx_is_still_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/threads"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "index rebuilding"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.list_threads(1, 20).await.unwrap_err();
    match err {
        ApiError::RequestFailed { message, .. } => assert_eq!(message, "index rebuilding"),
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn search_query_is_percent_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/threads/search"))
        .and(query_param("q", "rust async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "items": [], "page": 1, "per_page": 20, "total": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let page = client.search_threads("rust async", 1).await.unwrap();
    assert!(page.items.is_empty());
}
