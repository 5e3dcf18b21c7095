//! Error types for the Unit agent domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each collaborator
//! boundary has its own error variant.
//!
//! Two failure classes run through the system and must never be confused:
//! errors of this module are *fatal to the run* (missing credentials, a
//! runaway loop, a collaborator that cannot be reached for planning), while
//! tool-execution failures are folded into an in-band
//! [`ActionOutcome`](crate::state::ActionOutcome) error record and consumed
//! by the summarizer like any other result.

use thiserror::Error;

/// The top-level error type for all Unit agent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Language model errors ---
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    // --- Platform backend errors ---
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    // --- History store errors ---
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    // --- Configuration errors ---
    #[error("configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The loop controller exceeded its hard transition ceiling.
    ///
    /// Distinct from a normal iteration-ceiling stop: this is the backstop
    /// against a misbehaving continuation policy and aborts the run.
    #[error("runaway loop: {transitions} state transitions exceeded the hard ceiling")]
    Runaway { transitions: u32 },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("empty completion from model {0}")]
    EmptyResponse(String),

    /// The model replied, but not with a decodable `{reasoning, tool, params}`
    /// decision object.
    #[error("malformed planner decision: {0}")]
    MalformedDecision(String),
}

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("corrupt history for agent {agent_id}: {reason}")]
    Corrupt { agent_id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_displays_correctly() {
        let err = Error::Llm(LlmError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn runaway_is_distinct_from_platform_errors() {
        let err = Error::Runaway { transitions: 61 };
        assert!(err.to_string().contains("61"));
        assert!(matches!(err, Error::Runaway { .. }));
    }

    #[test]
    fn malformed_decision_names_the_problem() {
        let err = LlmError::MalformedDecision("missing field `tool`".into());
        assert!(err.to_string().contains("malformed planner decision"));
    }
}
