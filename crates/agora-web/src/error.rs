use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::warn;

use agora_client::ApiError;

use crate::render;

/// How page handlers fail. API errors map onto page-level outcomes: an
/// expired session redirects to login, a missing entity renders the 404
/// page, anything else renders an error page with the backend's message.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let PageError::Api(err) = self;
        match err {
            ApiError::AuthRequired => Redirect::to("/login").into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(render::error_page("Not found", "The page you requested does not exist.")),
            )
                .into_response(),
            ApiError::RequestFailed { status, message } => {
                warn!("backend request failed ({:?}): {}", status, message);
                (
                    StatusCode::BAD_GATEWAY,
                    Html(render::error_page("Something went wrong", &message)),
                )
                    .into_response()
            }
        }
    }
}

pub type PageResult<T> = Result<T, PageError>;
