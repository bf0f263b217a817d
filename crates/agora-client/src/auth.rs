use agora_types::api::{
    AuthResponse, CurrentUser, LoginRequest, RegisterRequest, ResendVerificationRequest,
    VerifyEmailRequest,
};

use crate::{ApiClient, ApiError};

impl ApiClient {
    /// Create an account. The backend replies with an unverified session;
    /// the caller decides whether to route through email verification.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post("/api/v1/auth/register", req).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post("/api/v1/auth/login", req).await
    }

    /// Confirm the emailed verification code. Succeeding yields a fresh
    /// token with `email_verified` set.
    pub async fn verify_email(&self, req: &VerifyEmailRequest) -> Result<AuthResponse, ApiError> {
        self.post("/api/v1/auth/verify-email", req).await
    }

    pub async fn resend_verification(
        &self,
        req: &ResendVerificationRequest,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post("/api/v1/auth/resend-verification", req).await?;
        Ok(())
    }

    /// Fetch the profile behind the current token.
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.require_token()?;
        self.get("/api/v1/auth/me").await
    }
}
