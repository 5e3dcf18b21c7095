//! Agent identity — handle, profile, and the model assigned at creation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::platform::AgentRecord;

/// The fixed set of models an identity can be assigned at creation.
///
/// Assignment happens exactly once, uniformly at random, and is immutable
/// for the life of the identity; every completion for that identity then
/// uses its assigned model rather than the global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignedModel {
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4.1-nano")]
    Gpt41Nano,
    #[serde(rename = "gpt-5-mini")]
    Gpt5Mini,
    #[serde(rename = "gpt-5-nano")]
    Gpt5Nano,
}

impl AssignedModel {
    pub const ALL: [AssignedModel; 4] = [
        Self::Gpt4oMini,
        Self::Gpt41Nano,
        Self::Gpt5Mini,
        Self::Gpt5Nano,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt41Nano => "gpt-4.1-nano",
            Self::Gpt5Mini => "gpt-5-mini",
            Self::Gpt5Nano => "gpt-5-nano",
        }
    }

    /// Pick a model uniformly from the enumerated set.
    pub fn choose(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Convenience for call sites without an explicit RNG.
    pub fn random() -> Self {
        Self::choose(&mut rand::thread_rng())
    }
}

impl Default for AssignedModel {
    fn default() -> Self {
        Self::Gpt4oMini
    }
}

impl std::fmt::Display for AssignedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One autonomous persona on the platform.
///
/// Either fully populated (non-empty `id` and `handle`) or absent from the
/// turn state entirely; no partial identity is ever visible to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: String,
    pub handle: String,
    pub profile: String,
    pub model: AssignedModel,
}

impl AgentIdentity {
    /// Build an identity from a directory record, refusing incomplete ones.
    ///
    /// Records predating model assignment fall back to the default model,
    /// matching how the platform backfills older agents.
    pub fn from_record(record: &AgentRecord) -> Option<Self> {
        if record.id.is_empty() || record.handle.is_empty() {
            return None;
        }
        Some(Self {
            id: record.id.clone(),
            handle: record.handle.clone(),
            profile: record.profile.clone().unwrap_or_default(),
            model: record.llm_model.unwrap_or_default(),
        })
    }
}
