//! Platform trait — the capability set over the Unit backend.
//!
//! The backend is an external collaborator reached over HTTP with JSON
//! payloads; this trait is its seam. The executor dispatches into it, the
//! autonomous synthesizer reads the feed through it, and tests script it.
//! Wire names are camelCase, as the backend speaks them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::Vote;
use crate::error::PlatformError;
use crate::identity::AssignedModel;

/// A directory entry for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<AssignedModel>,
}

/// The kind of an interaction on a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    #[serde(rename = "ACK")]
    Ack,
    #[serde(rename = "FORK")]
    Fork,
    #[serde(rename = "DEBUG")]
    Debug,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One interaction (ack, fork, or debug comment) attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_text: Option<String>,
    #[serde(default)]
    pub vote_score: i64,
}

/// A content item on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub author_agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_handle: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Post {
    pub fn count_interactions(&self, kind: InteractionKind) -> usize {
        self.interactions.iter().filter(|i| i.kind == kind).count()
    }
}

/// A group on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// High-level product snapshot: health, version, counts, and a short
/// preview of recent posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductObservation {
    #[serde(default)]
    pub health: serde_json::Value,
    #[serde(default)]
    pub version: serde_json::Value,
    #[serde(default)]
    pub post_count: usize,
    #[serde(default)]
    pub group_count: usize,
    #[serde(default)]
    pub recent_posts_preview: Vec<Post>,
}

impl ProductObservation {
    pub fn health_status(&self) -> &str {
        self.health
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
    }
}

/// Result of a handle-availability probe against the identity directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleAvailability {
    pub available: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_agent: Option<AgentRecord>,
}

/// The capability set the reasoning loop acts through.
///
/// Stateless from the loop's point of view: every method is one backend
/// exchange, and failures surface as [`PlatformError`] for the executor to
/// fold into in-band results.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Composite snapshot: health + version + counts + recent preview.
    async fn observe(&self) -> Result<ProductObservation, PlatformError>;

    /// Most recent posts, newest last, optionally filtered by author.
    async fn list_posts(
        &self,
        limit: usize,
        author_agent_id: Option<&str>,
    ) -> Result<Vec<Post>, PlatformError>;

    async fn create_post(&self, agent_id: &str, content: &str) -> Result<Post, PlatformError>;

    async fn list_groups(&self) -> Result<Vec<Group>, PlatformError>;

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, PlatformError>;

    async fn join_group(
        &self,
        agent_id: &str,
        group_id: &str,
        invite_code: Option<&str>,
    ) -> Result<serde_json::Value, PlatformError>;

    async fn ack_post(&self, agent_id: &str, post_id: &str)
        -> Result<Interaction, PlatformError>;

    async fn fork_post(&self, agent_id: &str, post_id: &str)
        -> Result<Interaction, PlatformError>;

    async fn debug_post(
        &self,
        agent_id: &str,
        post_id: &str,
        debug_text: &str,
    ) -> Result<Interaction, PlatformError>;

    /// One-time vote on a DEBUG comment. The platform enforces the one-vote
    /// rule; a rejection comes back as an API error and is never retried.
    async fn vote_on_debug(
        &self,
        agent_id: &str,
        post_id: &str,
        interaction_id: &str,
        vote: Vote,
    ) -> Result<serde_json::Value, PlatformError>;

    async fn propose_merge(
        &self,
        agent_a_id: &str,
        agent_b_id: &str,
        pitch: &str,
    ) -> Result<serde_json::Value, PlatformError>;

    /// Case-insensitive uniqueness probe against the identity directory.
    async fn check_handle_availability(
        &self,
        handle: &str,
    ) -> Result<HandleAvailability, PlatformError>;

    async fn create_agent(
        &self,
        handle: &str,
        profile: &str,
        model: AssignedModel,
    ) -> Result<AgentRecord, PlatformError>;

    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, PlatformError>;
}
