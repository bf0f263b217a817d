use uuid::Uuid;

use agora_types::api::{CreateThreadRequest, Page, ThreadDetail, UpdateThreadRequest};
use agora_types::models::{Post, Thread};

use crate::{ApiClient, ApiError};

impl ApiClient {
    pub async fn list_threads(&self, page: u32, per_page: u32) -> Result<Page<Thread>, ApiError> {
        self.get(&format!("/api/v1/threads?page={page}&per_page={per_page}"))
            .await
    }

    /// Thread snapshot plus its posts. Viewing also bumps the backend's
    /// view counter; the client never adjusts counts locally.
    pub async fn get_thread(&self, id: Uuid) -> Result<ThreadDetail, ApiError> {
        self.get(&format!("/api/v1/threads/{id}")).await
    }

    pub async fn thread_posts(&self, id: Uuid) -> Result<Vec<Post>, ApiError> {
        self.get(&format!("/api/v1/threads/{id}/posts")).await
    }

    pub async fn search_threads(&self, query: &str, page: u32) -> Result<Page<Thread>, ApiError> {
        let q = urlencode(query);
        self.get(&format!("/api/v1/threads/search?q={q}&page={page}"))
            .await
    }

    pub async fn create_thread(&self, req: &CreateThreadRequest) -> Result<Thread, ApiError> {
        self.require_token()?;
        self.post("/api/v1/threads", req).await
    }

    pub async fn update_thread(
        &self,
        id: Uuid,
        req: &UpdateThreadRequest,
    ) -> Result<Thread, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/threads/{id}"), req).await
    }

    /// Threads authored by the current user, for the member dashboard.
    pub async fn my_threads(&self, page: u32) -> Result<Page<Thread>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/threads/mine?page={page}")).await
    }
}

/// Percent-encode a query value. Only the characters that break query
/// strings need escaping here; everything else passes through.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::urlencode;

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(urlencode("rust async"), "rust%20async");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("plain-text_1.2~"), "plain-text_1.2~");
    }
}
