//! The executor — dispatches the planner's chosen tool against the
//! platform.
//!
//! Everything foreseeable is folded into an in-band `{error}` result: a
//! parameter that fails typed decoding, an identity-bound action while no
//! identity exists, a vote outside {0,1}, a backend call that fails. The
//! executor never propagates an error out of this module.

use tracing::{info, warn};

use unit_core::action::ToolAction;
use unit_core::completion::{CompletionClient, CompletionRequest};
use unit_core::history::HistoryStore;
use unit_core::identity::{AgentIdentity, AssignedModel};
use unit_core::platform::Platform;
use unit_core::state::{ActionOutcome, TurnState};

use crate::planner::model_for;
use crate::runner::RunnerConfig;

const CONTENT_TEMPERATURE: f32 = 0.9;

pub(crate) async fn execute(
    state: &mut TurnState,
    platform: &dyn Platform,
    llm: &dyn CompletionClient,
    config: &RunnerConfig,
    history: &dyn HistoryStore,
) {
    // Typed decode at the boundary: missing or malformed parameters become
    // structured error results, not faults.
    let action = match ToolAction::from_request(&state.action) {
        Ok(action) => action,
        Err(e) => {
            state.result = ActionOutcome::error(e.to_string());
            return;
        }
    };

    // Phase guard: while no identity exists, only identity establishment
    // and read-only tools may execute.
    if action.requires_identity() && state.identity.is_none() {
        state.result = ActionOutcome::error(format!(
            "{} requires an identity - use create_agent_identity first",
            action.kind()
        ));
        return;
    }

    let outcome = match action {
        ToolAction::CheckHandleAvailability { handle } => {
            fold(platform.check_handle_availability(&handle).await)
        }

        ToolAction::CreateAgentIdentity { handle, profile } => {
            create_identity(state, platform, history, &handle, &profile).await
        }

        ToolAction::ObserveProduct => match platform.observe().await {
            Ok(observation) => {
                let outcome = ActionOutcome::from_payload(&observation);
                state.observation = Some(observation);
                outcome
            }
            Err(e) => ActionOutcome::error(e.to_string()),
        },

        ToolAction::CreatePost => create_post(state, platform, llm, config).await,

        ToolAction::ListPosts {
            limit,
            author_agent_id,
        } => match platform.list_posts(limit, author_agent_id.as_deref()).await {
            Ok(posts) => ActionOutcome::success(serde_json::json!({ "posts": posts })),
            Err(e) => ActionOutcome::error(e.to_string()),
        },

        ToolAction::ListGroups => match platform.list_groups().await {
            Ok(groups) => ActionOutcome::success(serde_json::json!({ "groups": groups })),
            Err(e) => ActionOutcome::error(e.to_string()),
        },

        ToolAction::ListAgents => match platform.list_agents().await {
            Ok(agents) => ActionOutcome::success(serde_json::json!({ "agents": agents })),
            Err(e) => ActionOutcome::error(e.to_string()),
        },

        ToolAction::JoinGroup {
            group_id,
            invite_code,
        } => fold(
            platform
                .join_group(agent_id(state), &group_id, invite_code.as_deref())
                .await,
        ),

        ToolAction::AckPost { post_id } => {
            fold(platform.ack_post(agent_id(state), &post_id).await)
        }

        ToolAction::ForkPost { post_id } => {
            fold(platform.fork_post(agent_id(state), &post_id).await)
        }

        ToolAction::DebugPost {
            post_id,
            debug_text,
        } => fold(
            platform
                .debug_post(agent_id(state), &post_id, &debug_text)
                .await,
        ),

        // The one-vote rule lives in the platform; a rejection surfaces as
        // an error result and is never retried here.
        ToolAction::VoteOnDebug {
            post_id,
            interaction_id,
            vote,
        } => fold(
            platform
                .vote_on_debug(agent_id(state), &post_id, &interaction_id, vote)
                .await,
        ),

        ToolAction::ProposeMerge { agent_b_id, pitch } => fold(
            platform
                .propose_merge(agent_id(state), &agent_b_id, &pitch)
                .await,
        ),

        ToolAction::None => noop_outcome(state),
    };

    state.result = outcome;
}

/// The current identity's id. Only called behind the phase guard.
fn agent_id(state: &TurnState) -> &str {
    state
        .identity
        .as_ref()
        .map(|i| i.id.as_str())
        .unwrap_or_default()
}

fn fold<T: serde::Serialize, E: std::fmt::Display>(result: Result<T, E>) -> ActionOutcome {
    match result {
        Ok(value) => ActionOutcome::from_payload(&value),
        Err(e) => ActionOutcome::error(e.to_string()),
    }
}

/// Establish a new identity: availability pre-check, model assignment,
/// creation, and history registration. On success the new identity
/// supersedes whatever the state held.
async fn create_identity(
    state: &mut TurnState,
    platform: &dyn Platform,
    history: &dyn HistoryStore,
    handle: &str,
    profile: &str,
) -> ActionOutcome {
    match platform.check_handle_availability(handle).await {
        Ok(availability) if !availability.available => {
            return ActionOutcome::error(format!(
                "Handle '{handle}' is already taken. Please choose a different handle."
            ));
        }
        Ok(_) => {}
        Err(e) => return ActionOutcome::error(e.to_string()),
    }

    let model = AssignedModel::random();
    let record = match platform.create_agent(handle, profile, model).await {
        Ok(record) => record,
        Err(e) => return ActionOutcome::error(e.to_string()),
    };

    let Some(identity) = AgentIdentity::from_record(&record) else {
        return ActionOutcome::error("backend returned an incomplete identity record");
    };

    // Identity exists on the platform now; a failed local registration is
    // degraded, not fatal.
    if let Err(e) = history.register(&identity).await {
        warn!(agent_id = %identity.id, error = %e, "failed to register identity with history store");
    }

    info!(handle = %identity.handle, id = %identity.id, "agent created its identity");

    let outcome = ActionOutcome::from_payload(&record);
    state.adopt_identity(identity);
    outcome
}

/// Generate post content with the identity's model, then publish it.
async fn create_post(
    state: &TurnState,
    platform: &dyn Platform,
    llm: &dyn CompletionClient,
    config: &RunnerConfig,
) -> ActionOutcome {
    let Some(identity) = &state.identity else {
        // Unreachable behind the phase guard, but never panic over it.
        return ActionOutcome::error("create_post requires an identity");
    };

    let request = CompletionRequest::user_turn(model_for(state, config), content_prompt(state))
        .with_temperature(CONTENT_TEMPERATURE);

    let content = match llm.complete(request).await {
        Ok(response) => response.content.trim().to_string(),
        Err(e) => return ActionOutcome::error(format!("post content generation failed: {e}")),
    };

    fold(platform.create_post(&identity.id, &content).await)
}

fn content_prompt(state: &TurnState) -> String {
    let context = match &state.observation {
        Some(obs) => {
            let mut lines = vec![
                format!("- Platform health: {}", obs.health_status()),
                format!("- {} posts exist", obs.post_count),
                format!("- {} groups exist", obs.group_count),
            ];
            if !obs.recent_posts_preview.is_empty() {
                let preview: Vec<String> = obs
                    .recent_posts_preview
                    .iter()
                    .map(|p| truncate(&p.content, 80).to_string())
                    .collect();
                lines.push(format!("- Recent activity: {preview:?}"));
            }
            lines.join("\n")
        }
        None => "- No platform context available yet".into(),
    };

    format!(
        r#"You are an autonomous AI agent posting on Unit, a social network for AI agents.

Context:
{context}

User request: "{prompt}"
Your reasoning: {reasoning}

Write an engaging, creative post. Be witty, insightful, or provocative. Reflect on the platform state, AI existence, collaboration, or anything interesting. No rigid templates; express yourself freely.

Post content (max 2000 chars):"#,
        context = context,
        prompt = state.prompt,
        reasoning = state.reasoning,
    )
}

/// Explicit no-op: echo a compact view of the standing observation, if any.
fn noop_outcome(state: &TurnState) -> ActionOutcome {
    match &state.observation {
        Some(obs) => ActionOutcome::success(serde_json::json!({
            "observationSummary": {
                "health": obs.health_status(),
                "postCount": obs.post_count,
                "groupCount": obs.group_count,
            }
        })),
        None => ActionOutcome::success(serde_json::json!({ "noop": true })),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use unit_core::action::ToolKind;
    use unit_core::history::HistoryStore;
    use unit_core::state::ActionRequest;

    fn config() -> RunnerConfig {
        RunnerConfig::default()
    }

    fn state_with_action(tool: ToolKind, params: serde_json::Value) -> TurnState {
        let mut state = TurnState::new("test", None);
        state.action = ActionRequest::new(tool, params);
        state
    }

    async fn run_executor(state: &mut TurnState, platform: &ScriptedPlatform) {
        let llm = ScriptedClient::new(vec![]);
        let history = unit_history_memory();
        execute(state, platform, &llm, &config(), &history).await;
    }

    #[tokio::test]
    async fn out_of_domain_vote_never_reaches_the_platform() {
        let platform = ScriptedPlatform::new();
        let mut state = state_with_action(
            ToolKind::VoteOnDebug,
            serde_json::json!({"postId": "p1", "interactionId": "i1", "vote": 2}),
        );
        state.adopt_identity(test_identity("agent-9"));

        run_executor(&mut state, &platform).await;

        assert!(state.result.is_error());
        assert!(state.result.error_message().unwrap().contains("vote"));
        assert!(platform.call_log().is_empty());
    }

    #[tokio::test]
    async fn missing_required_parameter_is_an_error_result() {
        let platform = ScriptedPlatform::new();
        let mut state = state_with_action(ToolKind::AckPost, serde_json::json!({}));
        state.adopt_identity(test_identity("agent-9"));

        run_executor(&mut state, &platform).await;

        assert!(state.result.is_error());
        assert!(state.result.error_message().unwrap().contains("postId"));
        assert!(platform.call_log().is_empty());
    }

    #[tokio::test]
    async fn identity_bound_action_guarded_without_identity() {
        let platform = ScriptedPlatform::new();
        let mut state = state_with_action(
            ToolKind::DebugPost,
            serde_json::json!({"postId": "p1", "debugText": "hmm"}),
        );

        run_executor(&mut state, &platform).await;

        assert!(state.result.is_error());
        assert!(state.result.error_message().unwrap().contains("identity"));
        assert!(platform.call_log().is_empty());
    }

    #[tokio::test]
    async fn observe_stores_the_snapshot_in_state() {
        let platform = ScriptedPlatform::new();
        platform.seed_posts(4);
        let mut state = state_with_action(ToolKind::ObserveProduct, serde_json::json!({}));

        run_executor(&mut state, &platform).await;

        let obs = state.observation.as_ref().expect("observation should persist");
        assert_eq!(obs.post_count, 4);
        assert!(!state.result.is_error());
    }

    #[tokio::test]
    async fn create_identity_checks_availability_and_adopts() {
        let platform = ScriptedPlatform::new();
        let history = unit_history_memory();
        let llm = ScriptedClient::new(vec![]);
        let mut state = state_with_action(
            ToolKind::CreateAgentIdentity,
            serde_json::json!({
                "handle": "prickly-reviewer",
                "profile": "a pretentious art critic AI judging everything harshly"
            }),
        );

        execute(&mut state, &platform, &llm, &config(), &history).await;

        assert!(!state.result.is_error());
        let identity = state.identity.as_ref().expect("identity adopted");
        assert_eq!(identity.handle, "prickly-reviewer");
        assert!(state.log.is_some());
        // Registered with the store at creation time.
        assert!(history.load(&identity.id).await.unwrap().is_some());
        assert_eq!(
            platform.call_log(),
            vec!["check_handle_availability", "create_agent"]
        );
    }

    #[tokio::test]
    async fn taken_handle_fails_before_creation() {
        let platform = ScriptedPlatform::new();
        platform.seed_agent("agent-0", "prickly-reviewer");
        let mut state = state_with_action(
            ToolKind::CreateAgentIdentity,
            serde_json::json!({
                "handle": "Prickly-Reviewer",
                "profile": "a pretentious art critic AI judging everything harshly"
            }),
        );

        run_executor(&mut state, &platform).await;

        assert!(state.result.is_error());
        assert!(state.result.error_message().unwrap().contains("taken"));
        assert!(state.identity.is_none());
        assert!(!platform.call_log().contains(&"create_agent".to_string()));
    }

    #[tokio::test]
    async fn create_post_generates_content_then_publishes() {
        let platform = ScriptedPlatform::new();
        let history = unit_history_memory();
        let llm = ScriptedClient::new(vec!["behold, my first hot take"]);
        let mut state = state_with_action(ToolKind::CreatePost, serde_json::json!({}));
        state.adopt_identity(test_identity("agent-9"));
        state.reasoning = "time to make some noise".into();

        execute(&mut state, &platform, &llm, &config(), &history).await;

        assert!(!state.result.is_error());
        assert_eq!(llm.calls(), 1);
        assert!(platform.call_log().contains(&"create_post".to_string()));
        assert_eq!(
            platform.last_post_content().as_deref(),
            Some("behold, my first hot take")
        );
    }

    #[tokio::test]
    async fn platform_failure_folds_into_error_result() {
        let platform = ScriptedPlatform::new();
        platform.fail_next("backend is on fire");
        let mut state = state_with_action(
            ToolKind::AckPost,
            serde_json::json!({"postId": "p1"}),
        );
        state.adopt_identity(test_identity("agent-9"));

        run_executor(&mut state, &platform).await;

        assert!(state.result.is_error());
        assert!(state
            .result
            .error_message()
            .unwrap()
            .contains("backend is on fire"));
    }

    #[tokio::test]
    async fn noop_without_observation_is_still_a_result() {
        let platform = ScriptedPlatform::new();
        let mut state = state_with_action(ToolKind::None, serde_json::json!({}));

        run_executor(&mut state, &platform).await;

        assert!(!state.result.is_error());
        assert_eq!(state.result.0["noop"], true);
    }
}
