use tracing::{error, info, warn};

use crate::api::errors::ApiError;
use crate::api::organizations::OrganizationService;

/// Confirmation guard in front of the destructive mutation. The CLI prompts;
/// tests script an answer.
pub trait ConfirmDelete {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Outcome notifications shown to the user after the flow resolves
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

#[derive(Debug)]
pub enum DeletionOutcome {
    /// The organization is gone; the caller should leave its pages
    Deleted { organization_name: String },
    /// The user declined the confirmation; nothing was issued
    Cancelled,
    /// The signed-in user is not the owner; nothing was issued
    NotPermitted { organization_name: String },
    /// No organization exists for the given slug
    NotFound { slug: String },
    /// The deletion was issued and failed; the user may retry
    Failed { error: ApiError },
}

/// Confirmation-guarded organization deletion.
///
/// Exactly one mutation per confirmed run; refusal and cancellation are
/// observable as the absence of the mutation call.
pub struct DeletionWorkflow<S, C, N> {
    service: S,
    confirm: C,
    notifier: N,
}

impl<S, C, N> DeletionWorkflow<S, C, N>
where
    S: OrganizationService,
    C: ConfirmDelete,
    N: Notifier,
{
    pub fn new(service: S, confirm: C, notifier: N) -> Self {
        Self {
            service,
            confirm,
            notifier,
        }
    }

    pub async fn delete_by_slug(&mut self, slug: &str) -> DeletionOutcome {
        let organization = match self.service.organization_by_slug(slug).await {
            Ok(Some(organization)) => organization,
            Ok(None) => {
                warn!(organization.slug = slug, "organization not found");
                return DeletionOutcome::NotFound {
                    slug: slug.to_string(),
                };
            }
            Err(error) => {
                error!(organization.slug = slug, %error, "organization lookup failed");
                return DeletionOutcome::Failed { error };
            }
        };

        // The backend enforces ownership; this only decides what to show
        // before asking.
        if !organization.current_user_is_owner {
            warn!(
                organization.slug = %organization.slug,
                "deletion refused: current user is not the owner"
            );
            return DeletionOutcome::NotPermitted {
                organization_name: organization.name,
            };
        }

        let prompt = format!("Are you sure you want to delete {}?", organization.name);
        if !self.confirm.confirm(&prompt) {
            info!(organization.slug = %organization.slug, "deletion cancelled");
            return DeletionOutcome::Cancelled;
        }

        match self.service.delete_organization(&organization.id).await {
            Ok(()) => {
                self.notifier.notify(&format!(
                    "Organization '{}' successfully deleted",
                    organization.name
                ));
                info!(organization.slug = %organization.slug, "deletion completed");
                DeletionOutcome::Deleted {
                    organization_name: organization.name,
                }
            }
            Err(error) => {
                error!(organization.slug = %organization.slug, %error, "deletion failed");
                DeletionOutcome::Failed { error }
            }
        }
    }
}
