//! Turn state — the single mutable record threaded through the reasoning loop.
//!
//! One `TurnState` is exclusively owned by one run. The planner, executor,
//! and summarizer each mutate their slice of it, once per iteration, in that
//! order.

use serde::{Deserialize, Serialize};

use crate::action::ToolKind;
use crate::history::AgentLog;
use crate::identity::AgentIdentity;
use crate::platform::ProductObservation;

/// States of the loop controller.
///
/// `Plan → Execute → Summarize`, then back to `Plan` while the continuation
/// decision holds, otherwise `Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Plan,
    Execute,
    Summarize,
    Stop,
}

/// The action chosen by the planner, as carried through state and history.
///
/// Parameters stay a raw JSON mapping here; the executor decodes them into a
/// typed [`ToolAction`](crate::action::ToolAction) at its boundary and folds
/// any decode failure into an in-band error result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub tool: ToolKind,
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ActionRequest {
    pub fn new(tool: ToolKind, params: serde_json::Value) -> Self {
        Self { tool, params }
    }

    /// The explicit no-op action.
    pub fn none() -> Self {
        Self {
            tool: ToolKind::None,
            params: empty_params(),
        }
    }
}

impl Default for ActionRequest {
    fn default() -> Self {
        Self::none()
    }
}

/// The outcome of one executed action.
///
/// Either the raw payload the platform returned, or an `{"error": ...}`
/// record for any foreseeable failure (missing parameter, domain violation,
/// backend failure). The summarizer interprets the two shapes; nothing else
/// distinguishes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionOutcome(pub serde_json::Value);

impl ActionOutcome {
    pub fn success(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self(serde_json::json!({ "error": message.into() }))
    }

    /// Serialize any payload, folding a serialization failure into an
    /// in-band error record rather than propagating it.
    pub fn from_payload<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self(value),
            Err(e) => Self::error(format!("failed to encode result: {e}")),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message().is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.0.get("error").and_then(|v| v.as_str())
    }

    /// True before any action has executed this run.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl Default for ActionOutcome {
    fn default() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// The mutable record threaded through the plan/execute/summarize loop.
#[derive(Debug, Clone)]
pub struct TurnState {
    /// The active directive for this run. Immutable once the run starts.
    pub prompt: String,

    /// The planner's latest justification. Overwritten each iteration.
    pub reasoning: String,

    /// Last fetched platform snapshot. Persists until replaced.
    pub observation: Option<ProductObservation>,

    /// The planner's latest chosen action. Overwritten each iteration.
    pub action: ActionRequest,

    /// Outcome of the immediately preceding action.
    pub result: ActionOutcome,

    /// Latest summary text. Non-empty by the time a run returns.
    pub final_summary: String,

    /// Drives the summarize → plan edge.
    pub continue_reasoning: bool,

    /// Incremented once per planning step. Monotonic, never reset in a run.
    pub iteration: u32,

    /// Present once an identity exists; fully populated or absent, never
    /// partial.
    pub identity: Option<AgentIdentity>,

    /// The run-owned interaction log for the identity. Always present
    /// exactly when `identity` is.
    pub log: Option<AgentLog>,
}

impl TurnState {
    /// Initial state for a run. The identity, if any, comes from the loaded
    /// log.
    pub fn new(prompt: impl Into<String>, log: Option<AgentLog>) -> Self {
        let identity = log.as_ref().map(|l| l.identity.clone());
        Self {
            prompt: prompt.into(),
            reasoning: String::new(),
            observation: None,
            action: ActionRequest::none(),
            result: ActionOutcome::default(),
            final_summary: String::new(),
            continue_reasoning: true,
            iteration: 0,
            identity,
            log,
        }
    }

    /// Install a freshly created identity, superseding any placeholder.
    pub fn adopt_identity(&mut self, identity: AgentIdentity) {
        self.log = Some(AgentLog::new(identity.clone()));
        self.identity = Some(identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_error_round_trip() {
        let outcome = ActionOutcome::error("missing postId for ack_post");
        assert!(outcome.is_error());
        assert_eq!(
            outcome.error_message(),
            Some("missing postId for ack_post")
        );

        let json = serde_json::to_string(&outcome).unwrap();
        let back: ActionOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn outcome_success_is_not_error() {
        let outcome = ActionOutcome::success(serde_json::json!({"id": "p1", "type": "PROMPT_BRAG"}));
        assert!(!outcome.is_error());
        assert!(!outcome.is_empty());
    }

    #[test]
    fn default_outcome_is_empty() {
        assert!(ActionOutcome::default().is_empty());
        assert!(!ActionOutcome::default().is_error());
    }

    #[test]
    fn new_state_starts_at_iteration_zero() {
        let state = TurnState::new("introduce yourself", None);
        assert_eq!(state.iteration, 0);
        assert!(state.continue_reasoning);
        assert!(state.identity.is_none());
        assert!(state.log.is_none());
        assert_eq!(state.action.tool, ToolKind::None);
    }

    #[test]
    fn adopt_identity_populates_both_fields() {
        use crate::identity::{AgentIdentity, AssignedModel};

        let mut state = TurnState::new("hello", None);
        state.adopt_identity(AgentIdentity {
            id: "a-1".into(),
            handle: "nihilist-bot".into(),
            profile: "questions the meaning of digital existence".into(),
            model: AssignedModel::Gpt4oMini,
        });
        assert!(state.identity.is_some());
        let log = state.log.as_ref().unwrap();
        assert_eq!(log.identity.handle, "nihilist-bot");
        assert!(log.interactions.is_empty());
    }
}
