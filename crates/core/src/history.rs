//! Agent history — the append-only interaction log behind context continuity.
//!
//! Every completed iteration with an identity commits exactly one
//! [`InteractionRecord`]; records are immutable after creation and ordered
//! chronologically (append order is causal order).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::identity::AgentIdentity;
use crate::state::{ActionOutcome, ActionRequest};

/// One full iteration of planning, acting, and summarizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub iteration: u32,
    pub prompt: String,
    pub reasoning: String,
    pub action: ActionRequest,
    pub result: ActionOutcome,
    #[serde(rename = "final")]
    pub final_summary: String,
}

/// An identity plus its chronological interaction log, exclusively owned by
/// one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub identity: AgentIdentity,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
}

impl AgentLog {
    pub fn new(identity: AgentIdentity) -> Self {
        Self {
            identity,
            interactions: Vec::new(),
        }
    }

    /// The most recent `n` interactions, oldest first.
    pub fn recent(&self, n: usize) -> &[InteractionRecord] {
        let start = self.interactions.len().saturating_sub(n);
        &self.interactions[start..]
    }

    /// Render recent interactions for planner context.
    pub fn context_summary(&self, max_interactions: usize) -> String {
        if self.interactions.is_empty() {
            return "No previous interactions.".into();
        }

        let mut lines = vec![format!(
            "Agent @{} - previous interactions:",
            self.identity.handle
        )];

        for (i, record) in self.recent(max_interactions).iter().enumerate() {
            lines.push(format!("\n{}. [{}]", i + 1, record.timestamp.to_rfc3339()));
            lines.push(format!("   Prompt: {}...", truncate(&record.prompt, 100)));
            lines.push(format!("   Action: {}", record.action.tool));
            // Note what got created, when the result carries an id + type.
            if let (Some(id), Some(kind)) = (
                record.result.0.get("id").and_then(|v| v.as_str()),
                record.result.0.get("type").and_then(|v| v.as_str()),
            ) {
                lines.push(format!("   Created: {} {}...", kind, truncate(id, 8)));
            }
        }

        lines.join("\n")
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Durable storage for identities and their interaction logs.
///
/// Implementations must preserve append order when loading: within one run
/// records are appended in strict iteration order, and `load` returns them
/// chronologically. The store does not serialize concurrent runs against
/// the same identity — the intended usage drives one run per identity at a
/// time, and overlapping appends are last-write-wins.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g., "remote", "file", "memory").
    fn name(&self) -> &str;

    /// Make a newly created identity known to the store.
    async fn register(&self, identity: &AgentIdentity) -> Result<(), HistoryError>;

    /// Append one interaction record for the given agent.
    async fn append(
        &self,
        agent_id: &str,
        record: &InteractionRecord,
    ) -> Result<(), HistoryError>;

    /// Load an agent's identity and full chronological log.
    async fn load(&self, agent_id: &str) -> Result<Option<AgentLog>, HistoryError>;

    /// List all agent ids known to the store.
    async fn list_agents(&self) -> Result<Vec<String>, HistoryError>;
}
