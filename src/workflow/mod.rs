pub mod entry;
pub mod form;
pub mod verification;

pub use entry::{EntryContext, EntryError};
pub use form::TokenField;
pub use verification::{
    OperationError, TransitionRecord, VerificationMachine, VerificationRequest,
    VerificationWorkflow, WorkflowError, WorkflowEvent, WorkflowState,
};
