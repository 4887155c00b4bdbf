use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::client::ApiClient;
use crate::api::errors::ApiError;
use crate::api::session::SHARED_CACHE_PREFIX;

pub const ORGANIZATION_BY_SLUG: &str = "\
query OrganizationBySlug($slug: String!) {
  organizationBySlug(slug: $slug) {
    id
    name
    slug
    currentUserIsOwner
  }
}";

pub const DELETE_ORGANIZATION: &str = "\
mutation DeleteOrganization($organizationId: ID!) {
  deleteOrganization(input: { organizationId: $organizationId }) {
    success
  }
}";

/// Cache key prefix for organization lookups
pub const ORGANIZATION_CACHE_PREFIX: &str = "org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(rename = "currentUserIsOwner")]
    pub current_user_is_owner: bool,
}

#[derive(Debug, Deserialize)]
struct OrganizationBySlugData {
    #[serde(rename = "organizationBySlug")]
    organization_by_slug: Option<Organization>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Deserialized for shape validation; errors are authoritative
struct DeleteOrganizationData {
    #[serde(rename = "deleteOrganization")]
    delete_organization: Option<DeleteOrganizationPayload>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DeleteOrganizationPayload {
    success: Option<bool>,
}

/// Organization lookup and deletion. Permission decisions stay on the
/// backend; `current_user_is_owner` only informs what the client shows
/// before asking.
#[async_trait]
pub trait OrganizationService {
    async fn organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, ApiError>;
    async fn delete_organization(&self, organization_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl OrganizationService for ApiClient {
    async fn organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, ApiError> {
        let cache_key = format!("{ORGANIZATION_CACHE_PREFIX}.{slug}");
        let data: OrganizationBySlugData = self
            .retry()
            .execute_with_retry(|| {
                self.execute_cached(
                    &cache_key,
                    "OrganizationBySlug",
                    ORGANIZATION_BY_SLUG,
                    serde_json::json!({ "slug": slug }),
                )
            })
            .await?;
        Ok(data.organization_by_slug)
    }

    async fn delete_organization(&self, organization_id: &str) -> Result<(), ApiError> {
        // Never cached, never auto-retried.
        let variables = serde_json::json!({ "organizationId": organization_id });
        let _: DeleteOrganizationData = self
            .execute("DeleteOrganization", DELETE_ORGANIZATION, variables)
            .await?;

        // The organization is gone; anything fetched about it or about the
        // session's memberships is stale now.
        self.invalidate_prefix(ORGANIZATION_CACHE_PREFIX).await;
        self.invalidate_prefix(SHARED_CACHE_PREFIX).await;

        info!(organization.id = organization_id, "organization deleted");
        Ok(())
    }
}
