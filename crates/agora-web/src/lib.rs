//! Server-rendered web client for the Agora forum backend.
//!
//! Pages fetch their data through the HTTP action layer on navigation and
//! update incrementally from the per-session realtime channel (via the live
//! mirror and the SSE bridges). The route guard runs ahead of every page.

pub mod config;
pub mod error;
pub mod guard;
pub mod live;
pub mod pages;
pub mod registry;
pub mod render;
pub mod session;
pub mod state;
pub mod validate;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home::home))
        // auth
        .route("/login", get(pages::auth::login_form).post(pages::auth::login))
        .route("/register", get(pages::auth::register_form).post(pages::auth::register))
        .route("/verify-email", get(pages::auth::verify_form).post(pages::auth::verify))
        .route("/resend-verification", post(pages::auth::resend_verification))
        .route("/logout", post(pages::auth::logout))
        // threads
        .route("/threads", get(pages::threads::list))
        .route("/threads/new", get(pages::threads::new_form).post(pages::threads::create))
        .route("/threads/{id}", get(pages::threads::detail))
        .route("/threads/{id}/reply", post(pages::threads::reply))
        .route("/search", get(pages::threads::search))
        // realtime bridges
        .route("/events", get(pages::events::global_events))
        .route("/threads/{id}/events", get(pages::events::thread_events))
        // member area
        .route("/dashboard", get(pages::dashboard::dashboard))
        .route("/notifications", get(pages::notifications::list))
        .route("/notifications/{id}/read", post(pages::notifications::mark_read))
        .route("/notifications/read-all", post(pages::notifications::mark_all_read))
        // admin console
        .route("/admin", get(pages::admin::overview))
        .route("/admin/users", get(pages::admin::users))
        .route("/admin/users/{id}/role", post(pages::admin::set_role))
        .route("/admin/threads", get(pages::admin::threads))
        .route("/admin/threads/{id}/pin", post(pages::admin::pin_thread))
        .route("/admin/threads/{id}/lock", post(pages::admin::lock_thread))
        .route("/admin/threads/{id}/remove", post(pages::admin::remove_thread))
        .route("/admin/posts", get(pages::admin::posts))
        .route("/admin/posts/{id}/remove", post(pages::admin::remove_post))
        .route("/admin/reports", get(pages::admin::reports))
        .route("/admin/reports/{id}/resolve", post(pages::admin::resolve_report))
        .route("/admin/moderation", get(pages::admin::moderation))
        .route("/admin/analytics", get(pages::admin::analytics))
        .layer(middleware::from_fn(guard::route_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
