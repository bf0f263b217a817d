use uuid::Uuid;

use agora_types::api::{CreatePostRequest, UpdatePostRequest};
use agora_types::models::Post;

use crate::{ApiClient, ApiError};

impl ApiClient {
    /// Publish a reply in a thread. `parent_id` nests it one level under an
    /// existing post; deeper nesting is rejected by the backend.
    pub async fn create_post(
        &self,
        thread_id: Uuid,
        req: &CreatePostRequest,
    ) -> Result<Post, ApiError> {
        self.require_token()?;
        self.post(&format!("/api/v1/threads/{thread_id}/posts"), req)
            .await
    }

    pub async fn update_post(&self, id: Uuid, req: &UpdatePostRequest) -> Result<Post, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/posts/{id}"), req).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self.delete(&format!("/api/v1/posts/{id}")).await?;
        Ok(())
    }
}
