// Verigate Library - Account Flows for Multi-Tenant Deployments
// This exposes the core components for testing and integration

pub mod api;
pub mod config;
pub mod observability;
pub mod org;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use api::{
    ApiClient, ApiError, CurrentUser, Organization, OrganizationService, RetryConfig,
    RetryHandler, SessionService, VerificationService,
};
pub use config::{config, init_config, ApiConfig, CacheConfig, RateLimitConfig, VerigateConfig};
pub use observability::{api_metrics, create_workflow_span, ApiMetrics, OperationTimer};
pub use org::{ConfirmDelete, DeletionOutcome, DeletionWorkflow, Notifier};
pub use telemetry::{
    create_verification_span, generate_correlation_id, init_telemetry, shutdown_telemetry,
};
pub use workflow::{
    EntryContext, EntryError, OperationError, TokenField, TransitionRecord, VerificationMachine,
    VerificationRequest, VerificationWorkflow, WorkflowError, WorkflowEvent, WorkflowState,
};
