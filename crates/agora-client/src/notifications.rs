use uuid::Uuid;

use agora_types::api::{NotificationList, UnreadCount};

use crate::{ApiClient, ApiError};

impl ApiClient {
    pub async fn list_notifications(&self) -> Result<NotificationList, ApiError> {
        self.require_token()?;
        self.get("/api/v1/notifications").await
    }

    pub async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
        self.require_token()?;
        self.get("/api/v1/notifications/unread-count").await
    }

    /// Confirm a local mark-read. Callers treat this as fire-and-forget:
    /// the optimistic mutation already happened and a failure only logs.
    pub async fn mark_read(&self, id: Uuid) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .post(&format!("/api/v1/notifications/{id}/read"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .post("/api/v1/notifications/read-all", &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
