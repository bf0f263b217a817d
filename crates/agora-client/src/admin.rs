use uuid::Uuid;

use agora_types::api::{
    AdminUser, AnalyticsSummary, ModerationAction, Page, Report, ResolveReportRequest,
    SetLockedRequest, SetPinnedRequest, SetRoleRequest,
};
use agora_types::models::{Post, Thread};

use crate::{ApiClient, ApiError};

/// Admin console endpoints. Authorization is enforced by the backend; the
/// client-side route guard only keeps members away from the pages.
impl ApiClient {
    pub async fn list_users(&self, page: u32) -> Result<Page<AdminUser>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/admin/users?page={page}")).await
    }

    pub async fn set_user_role(&self, user_id: Uuid, req: &SetRoleRequest) -> Result<AdminUser, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/admin/users/{user_id}/role"), req)
            .await
    }

    pub async fn admin_threads(&self, page: u32) -> Result<Page<Thread>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/admin/threads?page={page}")).await
    }

    pub async fn admin_posts(&self, page: u32) -> Result<Page<Post>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/admin/posts?page={page}")).await
    }

    pub async fn set_thread_pinned(&self, id: Uuid, pinned: bool) -> Result<Thread, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/admin/threads/{id}/pin"), &SetPinnedRequest { pinned })
            .await
    }

    pub async fn set_thread_locked(&self, id: Uuid, locked: bool) -> Result<Thread, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/admin/threads/{id}/lock"), &SetLockedRequest { locked })
            .await
    }

    pub async fn remove_thread(&self, id: Uuid) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self.delete(&format!("/api/v1/admin/threads/{id}")).await?;
        Ok(())
    }

    pub async fn remove_post(&self, id: Uuid) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self.delete(&format!("/api/v1/admin/posts/{id}")).await?;
        Ok(())
    }

    pub async fn list_reports(&self, page: u32) -> Result<Page<Report>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/admin/reports?page={page}")).await
    }

    pub async fn resolve_report(
        &self,
        id: Uuid,
        req: &ResolveReportRequest,
    ) -> Result<Report, ApiError> {
        self.require_token()?;
        self.patch(&format!("/api/v1/admin/reports/{id}"), req).await
    }

    pub async fn moderation_log(&self, page: u32) -> Result<Page<ModerationAction>, ApiError> {
        self.require_token()?;
        self.get(&format!("/api/v1/admin/moderation?page={page}")).await
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        self.require_token()?;
        self.get("/api/v1/admin/analytics").await
    }
}
