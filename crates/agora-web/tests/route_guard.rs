use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use tower::ServiceExt;
use uuid::Uuid;

use agora_types::api::Claims;
use agora_types::models::Role;
use agora_web::config::Config;
use agora_web::state::AppState;

fn test_app() -> axum::Router {
    let config = Config {
        api_base_url: "http://127.0.0.1:9".into(),
        gateway_url: "ws://127.0.0.1:9".into(),
        host: "127.0.0.1".into(),
        port: 0,
    };
    agora_web::app(AppState::new(config))
}

/// The client never validates signatures, so any signing key works here.
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

async fn get(app: axum::Router, path: &str, cookie: Option<String>) -> axum::response::Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn anonymous_dashboard_visit_redirects_to_login_with_origin() {
    let response = get(test_app(), "/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn anonymous_admin_visit_redirects_to_login() {
    let response = get(test_app(), "/admin/users", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=%2Fadmin%2Fusers");
}

#[tokio::test]
async fn member_is_redirected_away_from_the_console() {
    let response = get(test_app(), "/admin", Some(session_cookie(Role::Member))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn staff_dashboard_visit_lands_on_the_console() {
    for role in [Role::Moderator, Role::Admin] {
        let response = get(test_app(), "/dashboard", Some(session_cookie(role))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
    }
}

#[tokio::test]
async fn authenticated_users_skip_the_login_page() {
    let response = get(test_app(), "/login", Some(session_cookie(Role::Member))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let response = get(test_app(), "/register", Some(session_cookie(Role::Admin))).await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn malformed_token_is_treated_as_anonymous() {
    let response =
        get(test_app(), "/dashboard", Some("agora_token=not-a-jwt".to_string())).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}
