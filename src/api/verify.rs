use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::api::client::ApiClient;
use crate::api::errors::ApiError;

/// Marks an email record as verified given its one-time token.
pub const VERIFY_EMAIL: &str = "\
mutation VerifyEmail($id: ID!, $token: String!) {
  verifyEmail(input: { userEmailId: $id, token: $token }) {
    success
  }
}";

#[derive(Debug, Deserialize)]
struct VerifyEmailData {
    #[serde(rename = "verifyEmail")]
    verify_email: VerifyEmailPayload,
}

#[derive(Debug, Deserialize)]
struct VerifyEmailPayload {
    success: Option<bool>,
}

/// Remote verification operation consumed by the workflow controller.
///
/// `Ok(false)` means the backend rejected the token; errors are transport
/// or operation faults. Implementations must issue exactly one request per
/// call — replay is the caller's decision.
#[async_trait]
pub trait VerificationService {
    async fn verify_email(&self, identifier: &str, token: &str) -> Result<bool, ApiError>;
}

#[async_trait]
impl VerificationService for ApiClient {
    async fn verify_email(&self, identifier: &str, token: &str) -> Result<bool, ApiError> {
        // Never cached, never auto-retried, and the token is never logged.
        debug!(email.id = identifier, "submitting verification attempt");
        let variables = serde_json::json!({ "id": identifier, "token": token });
        let data: VerifyEmailData = self.execute("VerifyEmail", VERIFY_EMAIL, variables).await?;
        Ok(data.verify_email.success.unwrap_or(false))
    }
}
