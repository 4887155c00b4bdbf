pub mod deletion;

pub use deletion::{ConfirmDelete, DeletionOutcome, DeletionWorkflow, Notifier};
