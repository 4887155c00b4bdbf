use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::client::ApiClient;
use crate::api::errors::ApiError;

/// Shared query consumed by the surrounding layout of every flow.
pub const SHARED_QUERY: &str = "\
query Shared {
  currentUser {
    id
    username
    name
    isVerified
  }
}";

/// Cache key prefix for the shared query; invalidated after mutations that
/// change what the layout shows.
pub const SHARED_CACHE_PREFIX: &str = "shared";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
struct SharedData {
    #[serde(rename = "currentUser")]
    current_user: Option<CurrentUser>,
}

/// Session context provider. Not consumed by the verification state machine
/// itself; the workflows only pass it through to their presentation.
#[async_trait]
pub trait SessionService {
    async fn current_user(&self) -> Result<Option<CurrentUser>, ApiError>;
}

#[async_trait]
impl SessionService for ApiClient {
    async fn current_user(&self) -> Result<Option<CurrentUser>, ApiError> {
        let data: SharedData = self
            .retry()
            .execute_with_retry(|| {
                self.execute_cached(
                    "shared.currentUser",
                    "Shared",
                    SHARED_QUERY,
                    serde_json::json!({}),
                )
            })
            .await?;
        Ok(data.current_user)
    }
}
