use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agora_types::api::Claims;
use agora_types::models::Role;
use agora_web::config::Config;
use agora_web::state::AppState;

fn test_app(api_base_url: String) -> axum::Router {
    let config = Config {
        api_base_url,
        gateway_url: "ws://127.0.0.1:9".into(),
        host: "127.0.0.1".into(),
        port: 0,
    };
    agora_web::app(AppState::new(config))
}

fn session_cookie(role: Role) -> String {
    let claims = Claims {
        sub: Uuid::new_v4(),
        username: "ada".into(),
        display_name: "Ada".into(),
        role,
        email_verified: true,
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };
    let token =
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
    format!("agora_token={token}")
}

fn form_post(path: &str, cookie: Option<String>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn auth_envelope(email_verified: bool) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "user_id": Uuid::new_v4(),
            "username": "ada",
            "display_name": "Ada",
            "role": "member",
            "email_verified": email_verified,
            "token": "backend-issued-token"
        }
    })
}

#[tokio::test]
async fn login_with_unverified_email_routes_to_verification_without_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_envelope(false)))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(server.uri());
    let response = app
        .oneshot(form_post("/login", None, "email=ada%40example.com&password=password1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/verify-email?email=ada%40example.com");
    // No session until the address is confirmed
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn successful_login_sets_the_session_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_envelope(true)))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(server.uri());
    let response = app
        .oneshot(form_post("/login", None, "email=ada%40example.com&password=password1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/dashboard");

    let cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("agora_token=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("agora_role=member")));
}

#[tokio::test]
async fn rejected_login_rerenders_the_form_with_the_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "error": "Invalid credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(server.uri());
    let response = app
        .oneshot(form_post("/login", None, "email=ada%40example.com&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Invalid credentials"));
}

#[tokio::test]
async fn invalid_thread_form_never_reaches_the_backend() {
    let server = MockServer::start().await;

    let app = test_app(server.uri());
    let response = app
        .oneshot(form_post(
            "/threads/new",
            Some(session_cookie(Role::Member)),
            "title=abcd&content=long+enough+content+here&tags=",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Title must be at least 5 characters"));
    // The submitted values survive the round trip
    assert!(html.contains(r#"value="abcd""#));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_thread_renders_the_not_found_page() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/threads/{id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(server.uri());
    let response = app
        .oneshot(Request::builder().uri(format!("/threads/{id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
