use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::verify::VerificationService;
use crate::workflow::entry::EntryContext;

/// Phase of the verification workflow. Exactly one value at any time, owned
/// exclusively by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Waiting for a token; the form is editable
    Pending,
    /// A verification attempt is being issued
    Submitting,
    /// The email address is verified; terminal
    Success,
}

/// The identifier/token pair a verification attempt is made with.
///
/// `identifier` is fixed at initialization; `token` may be replaced any
/// number of times while the workflow is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub identifier: String,
    pub token: String,
}

/// Failure of the most recent attempt. Present only while pending after a
/// failed attempt; always cleared before a new submission is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The backend rejected the token
    #[error("Incorrect token, please check and try again")]
    InvalidToken,
    /// Transport or server fault, message surfaced verbatim
    #[error("{0}")]
    Fault(String),
}

/// Events the machine reacts to. Attempt outcomes arrive as events so every
/// transition is applied explicitly and synchronously; nothing re-fires
/// behind the machine's back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Submit,
    EditToken(String),
    AttemptSucceeded,
    AttemptRejected,
    AttemptFailed(String),
}

impl WorkflowEvent {
    /// Event name safe for logging; payloads may carry secrets.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::EditToken(_) => "edit_token",
            WorkflowEvent::AttemptSucceeded => "attempt_succeeded",
            WorkflowEvent::AttemptRejected => "attempt_rejected",
            WorkflowEvent::AttemptFailed(_) => "attempt_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid transition: {name} not allowed in state {state:?}", name = .event.name())]
    InvalidTransition {
        state: WorkflowState,
        event: WorkflowEvent,
    },
}

/// Audit record of one applied transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub event: WorkflowEvent,
    pub timestamp: DateTime<Utc>,
}

/// Pure transition core of the verification workflow. Holds no service
/// handle; attempt outcomes are fed in as events.
#[derive(Debug, Clone)]
pub struct VerificationMachine {
    state: WorkflowState,
    request: VerificationRequest,
    error: Option<OperationError>,
    history: Vec<TransitionRecord>,
}

impl VerificationMachine {
    /// Seed the machine from the entry context. Both fields present means a
    /// verification link was followed and the first attempt is implied.
    pub fn new(entry: EntryContext) -> Self {
        let state = if entry.is_auto_submit() {
            WorkflowState::Submitting
        } else {
            WorkflowState::Pending
        };

        info!(
            state = ?state,
            email.id = %entry.identifier,
            "verification workflow initialized"
        );

        Self {
            state,
            request: VerificationRequest {
                identifier: entry.identifier,
                token: entry.token,
            },
            error: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    pub fn identifier(&self) -> &str {
        &self.request.identifier
    }

    pub fn token(&self) -> &str {
        &self.request.token
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Apply one event. Events that make no sense in the current state are
    /// rejected without touching it.
    pub fn handle_event(&mut self, event: WorkflowEvent) -> Result<WorkflowState, WorkflowError> {
        let from = self.state;
        let to = match (from, &event) {
            (WorkflowState::Pending, WorkflowEvent::Submit) => {
                // Clearing happens-before the attempt is issued; stale errors
                // never survive into a new submission.
                self.error = None;
                WorkflowState::Submitting
            }
            (WorkflowState::Pending, WorkflowEvent::EditToken(token)) => {
                self.request.token = token.clone();
                WorkflowState::Pending
            }
            (WorkflowState::Submitting, WorkflowEvent::AttemptSucceeded) => WorkflowState::Success,
            (WorkflowState::Submitting, WorkflowEvent::AttemptRejected) => {
                self.error = Some(OperationError::InvalidToken);
                WorkflowState::Pending
            }
            (WorkflowState::Submitting, WorkflowEvent::AttemptFailed(message)) => {
                self.error = Some(OperationError::Fault(message.clone()));
                WorkflowState::Pending
            }
            (state, _) => {
                return Err(WorkflowError::InvalidTransition {
                    state,
                    event: event.clone(),
                })
            }
        };

        self.record_transition(from, to, event);
        Ok(to)
    }

    fn record_transition(&mut self, from: WorkflowState, to: WorkflowState, event: WorkflowEvent) {
        info!(
            from = ?from,
            to = ?to,
            event = event.name(),
            "verification workflow transition"
        );
        self.history.push(TransitionRecord {
            from,
            to,
            event,
            timestamp: Utc::now(),
        });
        self.state = to;
    }
}

/// Mediates between the token form and the remote verification operation:
/// at most one attempt in flight, outcome reflected as a state transition.
#[derive(Debug)]
pub struct VerificationWorkflow<S> {
    machine: VerificationMachine,
    service: S,
}

impl<S: VerificationService> VerificationWorkflow<S> {
    pub fn new(service: S, entry: EntryContext) -> Self {
        Self {
            machine: VerificationMachine::new(entry),
            service,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.state()
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.machine.error()
    }

    pub fn identifier(&self) -> &str {
        self.machine.identifier()
    }

    pub fn token(&self) -> &str {
        self.machine.token()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        self.machine.history()
    }

    /// Replace the editable token. Permitted only while pending.
    pub fn update_token(&mut self, token: impl Into<String>) -> Result<(), WorkflowError> {
        self.machine
            .handle_event(WorkflowEvent::EditToken(token.into()))
            .map(|_| ())
    }

    /// Submit the current request. From `Pending` this issues exactly one
    /// remote attempt; in any other state it is ignored.
    pub async fn submit(&mut self) -> WorkflowState {
        match self.machine.state() {
            WorkflowState::Pending => {
                if let Err(error) = self.machine.handle_event(WorkflowEvent::Submit) {
                    // Unreachable given the state match above.
                    warn!(%error, "submit transition rejected");
                    return self.machine.state();
                }
                self.attempt().await
            }
            state => {
                debug!(state = ?state, "submit ignored");
                state
            }
        }
    }

    /// Execute the attempt implied by an initial `Submitting` state (a
    /// followed verification link). No-op in any other state.
    pub async fn drive(&mut self) -> WorkflowState {
        if self.machine.state() == WorkflowState::Submitting {
            self.attempt().await
        } else {
            self.machine.state()
        }
    }

    /// One remote call, one outcome event. Re-entry into `Submitting` is
    /// only possible after this resolves, so a stale response can never
    /// race a later attempt.
    async fn attempt(&mut self) -> WorkflowState {
        let outcome = self
            .service
            .verify_email(self.machine.identifier(), self.machine.token())
            .await;

        let event = match outcome {
            Ok(true) => WorkflowEvent::AttemptSucceeded,
            Ok(false) => WorkflowEvent::AttemptRejected,
            Err(error) => WorkflowEvent::AttemptFailed(error.to_string()),
        };

        if let Err(error) = self.machine.handle_event(event) {
            warn!(%error, "attempt outcome rejected");
        }
        self.machine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_machine() -> VerificationMachine {
        VerificationMachine::new(EntryContext::default())
    }

    fn auto_machine() -> VerificationMachine {
        VerificationMachine::new(EntryContext::new("u1", "abc123"))
    }

    #[test]
    fn both_entry_fields_present_starts_submitting() {
        assert_eq!(auto_machine().state(), WorkflowState::Submitting);
    }

    #[test]
    fn missing_entry_field_starts_pending() {
        assert_eq!(pending_machine().state(), WorkflowState::Pending);
        assert_eq!(
            VerificationMachine::new(EntryContext::new("u1", "")).state(),
            WorkflowState::Pending
        );
        assert_eq!(
            VerificationMachine::new(EntryContext::new("", "abc123")).state(),
            WorkflowState::Pending
        );
    }

    #[test]
    fn submit_clears_previous_error() {
        let mut machine = auto_machine();
        machine
            .handle_event(WorkflowEvent::AttemptRejected)
            .unwrap();
        assert_eq!(machine.error(), Some(&OperationError::InvalidToken));

        machine.handle_event(WorkflowEvent::Submit).unwrap();
        assert_eq!(machine.state(), WorkflowState::Submitting);
        assert!(machine.error().is_none());
    }

    #[test]
    fn rejected_attempt_returns_to_pending_with_fixed_message() {
        let mut machine = auto_machine();
        machine
            .handle_event(WorkflowEvent::AttemptRejected)
            .unwrap();
        assert_eq!(machine.state(), WorkflowState::Pending);
        assert_eq!(
            machine.error().unwrap().to_string(),
            "Incorrect token, please check and try again"
        );
    }

    #[test]
    fn failed_attempt_surfaces_fault_message_verbatim() {
        let mut machine = auto_machine();
        machine
            .handle_event(WorkflowEvent::AttemptFailed(
                "network unreachable".to_string(),
            ))
            .unwrap();
        assert_eq!(machine.state(), WorkflowState::Pending);
        assert_eq!(machine.error().unwrap().to_string(), "network unreachable");
    }

    #[test]
    fn success_is_terminal() {
        let mut machine = auto_machine();
        machine
            .handle_event(WorkflowEvent::AttemptSucceeded)
            .unwrap();
        assert_eq!(machine.state(), WorkflowState::Success);

        assert!(machine.handle_event(WorkflowEvent::Submit).is_err());
        assert!(machine
            .handle_event(WorkflowEvent::EditToken("x".to_string()))
            .is_err());
        assert!(machine.handle_event(WorkflowEvent::AttemptRejected).is_err());
        assert_eq!(machine.state(), WorkflowState::Success);
    }

    #[test]
    fn token_edits_only_while_pending() {
        let mut machine = pending_machine();
        machine
            .handle_event(WorkflowEvent::EditToken("abc123".to_string()))
            .unwrap();
        assert_eq!(machine.token(), "abc123");

        machine.handle_event(WorkflowEvent::Submit).unwrap();
        let error = machine
            .handle_event(WorkflowEvent::EditToken("late".to_string()))
            .unwrap_err();
        assert!(error.to_string().contains("edit_token"));
        assert_eq!(machine.token(), "abc123");
    }

    #[test]
    fn identifier_never_changes() {
        let mut machine = auto_machine();
        machine
            .handle_event(WorkflowEvent::AttemptFailed("boom".to_string()))
            .unwrap();
        machine
            .handle_event(WorkflowEvent::EditToken("other".to_string()))
            .unwrap();
        machine.handle_event(WorkflowEvent::Submit).unwrap();
        assert_eq!(machine.identifier(), "u1");
    }

    #[test]
    fn history_records_every_applied_transition() {
        let mut machine = pending_machine();
        machine
            .handle_event(WorkflowEvent::EditToken("abc".to_string()))
            .unwrap();
        machine.handle_event(WorkflowEvent::Submit).unwrap();
        machine
            .handle_event(WorkflowEvent::AttemptSucceeded)
            .unwrap();

        let states: Vec<(WorkflowState, WorkflowState)> = machine
            .history()
            .iter()
            .map(|record| (record.from, record.to))
            .collect();
        assert_eq!(
            states,
            vec![
                (WorkflowState::Pending, WorkflowState::Pending),
                (WorkflowState::Pending, WorkflowState::Submitting),
                (WorkflowState::Submitting, WorkflowState::Success),
            ]
        );
    }

    #[test]
    fn rejected_events_leave_no_history() {
        let mut machine = pending_machine();
        assert!(machine.handle_event(WorkflowEvent::AttemptSucceeded).is_err());
        assert!(machine.history().is_empty());
        assert_eq!(machine.state(), WorkflowState::Pending);
    }
}
