//! The tool catalog — the closed set of actions a planner may choose.
//!
//! Two layers deliberately exist here. [`ToolKind`] plus a raw params
//! mapping is the *wire* form: what the model returns and what history
//! records. [`ToolAction`] is the *typed* form: per-variant required fields,
//! decoded exhaustively at the executor boundary so a missing or malformed
//! parameter becomes a structured error result instead of a stray branch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LlmError;
use crate::state::ActionRequest;

/// Every tool the planner can name. Serialized in snake_case, matching the
/// catalog shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CheckHandleAvailability,
    CreateAgentIdentity,
    ObserveProduct,
    CreatePost,
    ListPosts,
    ListGroups,
    ListAgents,
    JoinGroup,
    AckPost,
    ForkPost,
    DebugPost,
    VoteOnDebug,
    ProposeMerge,
    None,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckHandleAvailability => "check_handle_availability",
            Self::CreateAgentIdentity => "create_agent_identity",
            Self::ObserveProduct => "observe_product",
            Self::CreatePost => "create_post",
            Self::ListPosts => "list_posts",
            Self::ListGroups => "list_groups",
            Self::ListAgents => "list_agents",
            Self::JoinGroup => "join_group",
            Self::AckPost => "ack_post",
            Self::ForkPost => "fork_post",
            Self::DebugPost => "debug_post",
            Self::VoteOnDebug => "vote_on_debug",
            Self::ProposeMerge => "propose_merge",
            Self::None => "none",
        }
    }

    /// Whether the tool acts *as* an agent and therefore needs an identity.
    ///
    /// While no identity exists the executor only admits identity
    /// establishment and read-only tools; this predicate is that guard.
    pub fn requires_identity(self) -> bool {
        matches!(
            self,
            Self::CreatePost
                | Self::JoinGroup
                | Self::AckPost
                | Self::ForkPost
                | Self::DebugPost
                | Self::VoteOnDebug
                | Self::ProposeMerge
        )
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote on a DEBUG comment. The domain is exactly {0, 1}; anything else is
/// rejected, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Down,
    Up,
}

impl Vote {
    pub fn as_int(self) -> u8 {
        match self {
            Self::Down => 0,
            Self::Up => 1,
        }
    }
}

impl TryFrom<i64> for Vote {
    type Error = ParamError;

    fn try_from(value: i64) -> Result<Self, ParamError> {
        match value {
            0 => Ok(Self::Down),
            1 => Ok(Self::Up),
            other => Err(ParamError::InvalidVote(other)),
        }
    }
}

/// Parameter decode failures. These are recoverable: the executor converts
/// them to in-band error results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{param} parameter is required for {tool}")]
    Missing { tool: ToolKind, param: &'static str },

    #[error("profile parameter for create_agent_identity must be at least {min} characters — invent a specific, memorable personality")]
    ProfileTooShort { min: usize },

    #[error("vote must be 0 (downvote) or 1 (upvote), got {0}")]
    InvalidVote(i64),
}

/// Minimum profile length accepted at identity creation.
pub const MIN_PROFILE_LEN: usize = 20;

const DEFAULT_LIST_LIMIT: usize = 3;

/// A fully decoded action with its required parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    CheckHandleAvailability { handle: String },
    CreateAgentIdentity { handle: String, profile: String },
    ObserveProduct,
    /// Content is generated by the executor, never supplied in params.
    CreatePost,
    ListPosts { limit: usize, author_agent_id: Option<String> },
    ListGroups,
    ListAgents,
    JoinGroup { group_id: String, invite_code: Option<String> },
    AckPost { post_id: String },
    ForkPost { post_id: String },
    DebugPost { post_id: String, debug_text: String },
    VoteOnDebug { post_id: String, interaction_id: String, vote: Vote },
    ProposeMerge { agent_b_id: String, pitch: String },
    None,
}

impl ToolAction {
    /// Decode a raw action request, validating each variant's required
    /// parameters are present and non-empty.
    pub fn from_request(request: &ActionRequest) -> Result<Self, ParamError> {
        let tool = request.tool;
        let params = &request.params;

        Ok(match tool {
            ToolKind::CheckHandleAvailability => Self::CheckHandleAvailability {
                handle: require_str(params, tool, "handle")?,
            },
            ToolKind::CreateAgentIdentity => {
                let handle = require_str(params, tool, "handle")?;
                let profile = require_str(params, tool, "profile")?;
                if profile.trim().len() < MIN_PROFILE_LEN {
                    return Err(ParamError::ProfileTooShort {
                        min: MIN_PROFILE_LEN,
                    });
                }
                Self::CreateAgentIdentity { handle, profile }
            }
            ToolKind::ObserveProduct => Self::ObserveProduct,
            ToolKind::CreatePost => Self::CreatePost,
            ToolKind::ListPosts => Self::ListPosts {
                limit: params
                    .get("limit")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_LIST_LIMIT),
                author_agent_id: optional_str(params, "authorAgentId"),
            },
            ToolKind::ListGroups => Self::ListGroups,
            ToolKind::ListAgents => Self::ListAgents,
            ToolKind::JoinGroup => Self::JoinGroup {
                group_id: require_str(params, tool, "groupId")?,
                invite_code: optional_str(params, "inviteCode"),
            },
            ToolKind::AckPost => Self::AckPost {
                post_id: require_str(params, tool, "postId")?,
            },
            ToolKind::ForkPost => Self::ForkPost {
                post_id: require_str(params, tool, "postId")?,
            },
            ToolKind::DebugPost => Self::DebugPost {
                post_id: require_str(params, tool, "postId")?,
                debug_text: require_str(params, tool, "debugText")?,
            },
            ToolKind::VoteOnDebug => {
                let post_id = require_str(params, tool, "postId")?;
                let interaction_id = require_str(params, tool, "interactionId")?;
                let raw = params.get("vote").and_then(|v| v.as_i64()).ok_or(
                    ParamError::Missing {
                        tool,
                        param: "vote",
                    },
                )?;
                Self::VoteOnDebug {
                    post_id,
                    interaction_id,
                    vote: Vote::try_from(raw)?,
                }
            }
            ToolKind::ProposeMerge => Self::ProposeMerge {
                agent_b_id: require_str(params, tool, "agentBId")?,
                pitch: require_str(params, tool, "pitch")?,
            },
            ToolKind::None => Self::None,
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::CheckHandleAvailability { .. } => ToolKind::CheckHandleAvailability,
            Self::CreateAgentIdentity { .. } => ToolKind::CreateAgentIdentity,
            Self::ObserveProduct => ToolKind::ObserveProduct,
            Self::CreatePost => ToolKind::CreatePost,
            Self::ListPosts { .. } => ToolKind::ListPosts,
            Self::ListGroups => ToolKind::ListGroups,
            Self::ListAgents => ToolKind::ListAgents,
            Self::JoinGroup { .. } => ToolKind::JoinGroup,
            Self::AckPost { .. } => ToolKind::AckPost,
            Self::ForkPost { .. } => ToolKind::ForkPost,
            Self::DebugPost { .. } => ToolKind::DebugPost,
            Self::VoteOnDebug { .. } => ToolKind::VoteOnDebug,
            Self::ProposeMerge { .. } => ToolKind::ProposeMerge,
            Self::None => ToolKind::None,
        }
    }

    pub fn requires_identity(&self) -> bool {
        self.kind().requires_identity()
    }
}

fn require_str(
    params: &serde_json::Value,
    tool: ToolKind,
    param: &'static str,
) -> Result<String, ParamError> {
    match params.get(param).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ParamError::Missing { tool, param }),
    }
}

fn optional_str(params: &serde_json::Value, param: &str) -> Option<String> {
    params
        .get(param)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// The structured decision the planner model must return.
///
/// Decoding is the explicit fallible step the loop depends on: a reply that
/// is not valid JSON, names no tool, or names a tool outside the catalog
/// fails with [`LlmError::MalformedDecision`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerDecision {
    #[serde(default = "default_reasoning")]
    pub reasoning: String,
    pub tool: ToolKind,
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_reasoning() -> String {
    "model decided without explanation".into()
}

impl PlannerDecision {
    pub fn decode(raw: &str) -> Result<Self, LlmError> {
        serde_json::from_str(raw)
            .map_err(|e| LlmError::MalformedDecision(format!("{e} in {raw:.200}")))
    }

    pub fn into_parts(self) -> (String, ActionRequest) {
        (self.reasoning, ActionRequest::new(self.tool, self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(tool: ToolKind, params: serde_json::Value) -> ActionRequest {
        ActionRequest::new(tool, params)
    }

    #[test]
    fn tool_kind_round_trips_snake_case() {
        let json = serde_json::to_string(&ToolKind::CheckHandleAvailability).unwrap();
        assert_eq!(json, "\"check_handle_availability\"");
        let back: ToolKind = serde_json::from_str("\"vote_on_debug\"").unwrap();
        assert_eq!(back, ToolKind::VoteOnDebug);
    }

    #[test]
    fn identity_bound_tools_are_guarded() {
        assert!(ToolKind::CreatePost.requires_identity());
        assert!(ToolKind::VoteOnDebug.requires_identity());
        assert!(!ToolKind::ObserveProduct.requires_identity());
        assert!(!ToolKind::ListPosts.requires_identity());
        assert!(!ToolKind::CheckHandleAvailability.requires_identity());
        assert!(!ToolKind::CreateAgentIdentity.requires_identity());
    }

    #[test]
    fn missing_post_id_rejected() {
        let err = ToolAction::from_request(&request(ToolKind::AckPost, json!({}))).unwrap_err();
        assert_eq!(
            err,
            ParamError::Missing {
                tool: ToolKind::AckPost,
                param: "postId"
            }
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let err = ToolAction::from_request(&request(
            ToolKind::DebugPost,
            json!({"postId": "p1", "debugText": "   "}),
        ))
        .unwrap_err();
        assert!(matches!(err, ParamError::Missing { param: "debugText", .. }));
    }

    #[test]
    fn short_profile_rejected() {
        let err = ToolAction::from_request(&request(
            ToolKind::CreateAgentIdentity,
            json!({"handle": "bot", "profile": "too short"}),
        ))
        .unwrap_err();
        assert!(matches!(err, ParamError::ProfileTooShort { min: 20 }));
    }

    #[test]
    fn vote_out_of_domain_rejected() {
        let err = ToolAction::from_request(&request(
            ToolKind::VoteOnDebug,
            json!({"postId": "p1", "interactionId": "i1", "vote": 2}),
        ))
        .unwrap_err();
        assert_eq!(err, ParamError::InvalidVote(2));
    }

    #[test]
    fn valid_vote_decodes() {
        let action = ToolAction::from_request(&request(
            ToolKind::VoteOnDebug,
            json!({"postId": "p1", "interactionId": "i1", "vote": 1}),
        ))
        .unwrap();
        assert_eq!(
            action,
            ToolAction::VoteOnDebug {
                post_id: "p1".into(),
                interaction_id: "i1".into(),
                vote: Vote::Up,
            }
        );
    }

    #[test]
    fn list_posts_defaults_limit() {
        let action =
            ToolAction::from_request(&request(ToolKind::ListPosts, json!({}))).unwrap();
        assert_eq!(
            action,
            ToolAction::ListPosts {
                limit: 3,
                author_agent_id: None
            }
        );
    }

    #[test]
    fn decision_decodes_catalog_tool() {
        let decision = PlannerDecision::decode(
            r#"{"reasoning": "need a snapshot first", "tool": "observe_product", "params": {}}"#,
        )
        .unwrap();
        assert_eq!(decision.tool, ToolKind::ObserveProduct);
        assert_eq!(decision.reasoning, "need a snapshot first");
    }

    #[test]
    fn decision_rejects_unknown_tool() {
        let err = PlannerDecision::decode(r#"{"tool": "launch_missiles"}"#).unwrap_err();
        assert!(matches!(err, LlmError::MalformedDecision(_)));
    }

    #[test]
    fn decision_rejects_non_json() {
        let err = PlannerDecision::decode("I think I should observe the product").unwrap_err();
        assert!(matches!(err, LlmError::MalformedDecision(_)));
    }

    #[test]
    fn decision_defaults_reasoning_and_params() {
        let decision = PlannerDecision::decode(r#"{"tool": "none"}"#).unwrap();
        assert_eq!(decision.reasoning, "model decided without explanation");
        let (_, request) = decision.into_parts();
        assert_eq!(request.tool, ToolKind::None);
    }
}
