//! The summarizer — narrates the turn, decides continuation, commits
//! history.
//!
//! Three paths: offline heuristic (no credential), ceiling wrap-up (one
//! call, continuation forced off), and the normal two-call path
//! (continuation judgement, then a narrative informed by it). Every failure
//! degrades toward termination: a run may end early on a bad summary, but
//! it can never loop an extra turn because of one. Whatever the path, an
//! iteration with an identity commits exactly one interaction record.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use unit_core::completion::{CompletionClient, CompletionRequest};
use unit_core::error::LlmError;
use unit_core::history::{HistoryStore, InteractionRecord};
use unit_core::state::TurnState;

use crate::planner::model_for;
use crate::runner::RunnerConfig;

const JUDGEMENT_TEMPERATURE: f32 = 0.3;
const SUMMARY_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct ContinueDecision {
    #[serde(rename = "continue", default)]
    should_continue: bool,
    #[serde(default = "default_reason")]
    reason: String,
}

fn default_reason() -> String {
    "no reason provided".into()
}

pub(crate) async fn summarize(
    state: &mut TurnState,
    llm: &dyn CompletionClient,
    history: &dyn HistoryStore,
    config: &RunnerConfig,
) {
    if state.iteration >= config.max_iterations {
        // Wrap-up: the ceiling overrides any model opinion on continuing.
        let request = CompletionRequest::user_turn(model_for(state, config), wrapup_prompt(state))
            .with_temperature(SUMMARY_TEMPERATURE);
        state.final_summary = match llm.complete(request).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!(error = %e, "wrap-up summary degraded to heuristic");
                format!("{} | LLM error: {e}", heuristic_summary(state))
            }
        };
        state.continue_reasoning = false;
    } else {
        match judge_and_narrate(state, llm, config).await {
            Ok((final_text, should_continue)) => {
                debug!(should_continue, "continuation judged");
                state.final_summary = final_text;
                state.continue_reasoning = should_continue;
            }
            Err(e) => {
                // Any verdict from a partially-successful pass is discarded:
                // failing toward termination can never loop us an extra turn.
                warn!(error = %e, "summarization degraded to heuristic");
                state.final_summary = format!("{} | LLM error: {e}", heuristic_summary(state));
                state.continue_reasoning = false;
            }
        }
    }

    commit(state, history).await;
}

/// The two-call path: judgement first, then the narrative that cites it.
async fn judge_and_narrate(
    state: &TurnState,
    llm: &dyn CompletionClient,
    config: &RunnerConfig,
) -> Result<(String, bool), LlmError> {
    let model = model_for(state, config);

    let judgement = llm
        .complete(
            CompletionRequest::user_turn(model.clone(), continuation_prompt(state, config))
                .with_temperature(JUDGEMENT_TEMPERATURE)
                .json(),
        )
        .await?;

    let decision: ContinueDecision = serde_json::from_str(&judgement.content)
        .map_err(|e| LlmError::MalformedDecision(format!("continuation judgement: {e}")))?;

    let summary = llm
        .complete(
            CompletionRequest::user_turn(model, summary_prompt(state, &decision.reason))
                .with_temperature(SUMMARY_TEMPERATURE),
        )
        .await?;

    Ok((summary.content, decision.should_continue))
}

/// Append the completed iteration to durable history and the in-run log.
///
/// Mandatory whenever an identity exists, exactly once per iteration. A
/// store failure is logged and survived: the run carries on with its
/// in-memory log.
async fn commit(state: &mut TurnState, history: &dyn HistoryStore) {
    let Some(log) = state.log.as_mut() else {
        return;
    };

    let record = InteractionRecord {
        timestamp: Utc::now(),
        iteration: state.iteration,
        prompt: state.prompt.clone(),
        reasoning: state.reasoning.clone(),
        action: state.action.clone(),
        result: state.result.clone(),
        final_summary: state.final_summary.clone(),
    };

    if let Err(e) = history.append(&log.identity.id, &record).await {
        warn!(agent_id = %log.identity.id, error = %e, "failed to persist interaction");
    }
    log.interactions.push(record);
}

/// Deterministic structural summary from the turn state alone.
pub(crate) fn heuristic_summary(state: &TurnState) -> String {
    let mut parts = vec![format!("Prompt: {}", state.prompt)];

    if !state.reasoning.is_empty() {
        parts.push(format!("Reasoning: {}", state.reasoning));
    }

    if let Some(obs) = &state.observation {
        parts.push(format!(
            "Health={} posts={} groups={}",
            obs.health_status(),
            obs.post_count,
            obs.group_count
        ));
    }

    let result = &state.result;
    if !result.is_empty() {
        if let Some(error) = result.error_message() {
            parts.push(format!("Action error: {error}"));
        } else if let Some(posts) = result.0.get("posts").and_then(|v| v.as_array()) {
            let authors: Vec<&str> = posts
                .iter()
                .take(2)
                .filter_map(|p| p.get("authorAgentId").and_then(|v| v.as_str()))
                .collect();
            parts.push(format!(
                "Listed {} posts. First authors: {authors:?}",
                posts.len()
            ));
        } else if let (Some(id), Some(kind)) = (
            result.0.get("id").and_then(|v| v.as_str()),
            result.0.get("type").and_then(|v| v.as_str()),
        ) {
            parts.push(format!("Created post id={id} type={kind}"));
        } else if result.0.get("observationSummary").is_some() {
            parts.push("Summarized observation only".into());
        }
    }

    parts.join(" | ")
}

/// The offline rendering: heuristic plus a pointer at the missing
/// credential.
pub(crate) fn offline_summary(state: &TurnState) -> String {
    format!(
        "{} | Suggestion: provide an OPENAI_API_KEY for reasoned summaries next time.",
        heuristic_summary(state)
    )
}

fn continuation_prompt(state: &TurnState, config: &RunnerConfig) -> String {
    format!(
        r#"You are evaluating whether an autonomous agent has completed its task.

Original user request: {prompt}
Current iteration: {iteration}/{max}
Latest reasoning: {reasoning}
Latest action result: {result}

Has the agent fully satisfied the user's request? Consider whether the original goal is achieved, whether obvious next steps remain, and whether the agent has explored or created enough.

Respond with a JSON object:
{{"continue": true if more actions are needed or false if the task is complete, "reason": "one sentence"}}"#,
        prompt = state.prompt,
        iteration = state.iteration,
        max = config.max_iterations,
        reasoning = state.reasoning,
        result = state.result.0,
    )
}

fn summary_prompt(state: &TurnState, continue_reason: &str) -> String {
    let observation = match &state.observation {
        Some(obs) => format!(
            "health={} posts={} groups={}",
            obs.health_status(),
            obs.post_count,
            obs.group_count
        ),
        None => "none".into(),
    };
    format!(
        r#"You are an autonomous agent interacting with a product.
User prompt: {prompt}
Iteration {iteration}: {reasoning}
Observation snapshot: {observation}
Action result: {result}
Continue decision: {reason}
Respond concisely summarizing what happened and any next suggestion (one short paragraph)."#,
        prompt = state.prompt,
        iteration = state.iteration,
        reasoning = state.reasoning,
        observation = observation,
        result = state.result.0,
        reason = continue_reason,
    )
}

fn wrapup_prompt(state: &TurnState) -> String {
    format!(
        r#"You are an autonomous agent that has reached its iteration limit.
User prompt: {prompt}
After {iteration} iterations, summarize what was accomplished.
Latest reasoning: {reasoning}
Latest result: {result}
Provide a concise summary of the work done (one short paragraph)."#,
        prompt = state.prompt,
        iteration = state.iteration,
        reasoning = state.reasoning,
        result = state.result.0,
    )
}
