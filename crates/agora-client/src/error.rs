use reqwest::StatusCode;

/// Failures surfaced by the HTTP action layer. Callers see two real buckets:
/// "authentication required" and "request failed"; `NotFound` is split out
/// because the view layer renders it as its own page.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No token present for an authenticated endpoint, or the backend said 401.
    #[error("authentication required")]
    AuthRequired,

    /// The requested entity does not exist.
    #[error("not found")]
    NotFound,

    /// Non-success response or network failure. The message comes from the
    /// backend envelope when available.
    #[error("request failed: {message}")]
    RequestFailed {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ApiError {
    pub fn failed(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self::RequestFailed { status, message: message.into() }
    }

    /// Human-readable text for the inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthRequired => "Please sign in to continue".into(),
            ApiError::NotFound => "Not found".into(),
            ApiError::RequestFailed { message, .. } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            status: err.status(),
            message: format!("request failed: {err}"),
        }
    }
}
