pub mod client;
pub mod errors;
pub mod organizations;
pub mod retry;
pub mod session;
pub mod verify;

pub use client::ApiClient;
pub use errors::ApiError;
pub use organizations::{Organization, OrganizationService};
pub use retry::{RetryConfig, RetryHandler};
pub use session::{CurrentUser, SessionService};
pub use verify::VerificationService;
