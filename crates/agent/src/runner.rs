//! The loop controller — a bounded state machine over one turn state.
//!
//! `Plan → Execute → Summarize`, looping back to `Plan` while the
//! continuation decision holds. Exactly one planner, executor, and
//! summarizer invocation per iteration, never interleaved. A hard ceiling
//! on total transitions aborts a run whose continuation policy misbehaves,
//! distinct from the normal iteration-ceiling stop.

use std::sync::Arc;
use tracing::{info, warn};

use unit_core::completion::CompletionClient;
use unit_core::error::{Error, LlmError, Result};
use unit_core::history::{AgentLog, HistoryStore};
use unit_core::platform::Platform;
use unit_core::state::{Phase, TurnState};

use crate::{autonomous, executor, planner, summarizer};

/// Loop ceilings and the fallback model, threaded explicitly at
/// construction.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Hard cap on planning iterations per run.
    pub max_iterations: u32,

    /// Hard cap on total state transitions per run. Breaching it is a
    /// fatal [`Error::Runaway`], not a normal stop.
    pub max_transitions: u32,

    /// Model for runs without an identity (identities use their assigned
    /// model).
    pub default_model: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_transitions: 60,
            default_model: "gpt-4o-mini".into(),
        }
    }
}

/// Drives one agent run at a time against the platform.
pub struct AgentRunner {
    llm: Option<Arc<dyn CompletionClient>>,
    platform: Arc<dyn Platform>,
    history: Arc<dyn HistoryStore>,
    config: RunnerConfig,
}

impl AgentRunner {
    pub fn new(platform: Arc<dyn Platform>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            llm: None,
            platform,
            history,
            config: RunnerConfig::default(),
        }
    }

    /// Attach a completion client. Without one, plain runs take the
    /// offline summary path and autonomous runs fail fast.
    pub fn with_llm(mut self, llm: Arc<dyn CompletionClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the loop for a given directive.
    ///
    /// Returns the final turn state; `final_summary` is always non-empty.
    /// Fatal conditions (LLM failure during planning, malformed planner
    /// decisions, the transition ceiling) surface as errors.
    pub async fn run(
        &self,
        prompt: impl Into<String>,
        log: Option<AgentLog>,
    ) -> Result<TurnState> {
        let mut state = TurnState::new(prompt, log);
        info!(
            prompt = %state.prompt,
            has_identity = state.identity.is_some(),
            "agent run starting"
        );

        // The only fully offline path: no credential, no LLM calls, a
        // deterministic structural summary that names what is missing.
        let Some(llm) = self.llm.as_deref() else {
            warn!("no completion client configured; producing offline summary");
            state.final_summary = summarizer::offline_summary(&state);
            state.continue_reasoning = false;
            return Ok(state);
        };

        let mut phase = Phase::Plan;
        let mut transitions: u32 = 0;

        while phase != Phase::Stop {
            transitions += 1;
            if transitions > self.config.max_transitions {
                return Err(Error::Runaway { transitions });
            }

            phase = match phase {
                Phase::Plan => {
                    planner::plan(&mut state, llm, &self.config).await?;
                    Phase::Execute
                }
                Phase::Execute => {
                    executor::execute(
                        &mut state,
                        self.platform.as_ref(),
                        llm,
                        &self.config,
                        self.history.as_ref(),
                    )
                    .await;
                    Phase::Summarize
                }
                Phase::Summarize => {
                    summarizer::summarize(
                        &mut state,
                        llm,
                        self.history.as_ref(),
                        &self.config,
                    )
                    .await;
                    if state.continue_reasoning {
                        Phase::Plan
                    } else {
                        Phase::Stop
                    }
                }
                Phase::Stop => Phase::Stop,
            };
        }

        info!(
            iterations = state.iteration,
            transitions,
            "agent run completed"
        );
        Ok(state)
    }

    /// Autonomous mode: synthesize a directive from the feed, then run.
    ///
    /// The synthesis step runs at most once, strictly before the loop, and
    /// requires a completion client — there is no heuristic fallback for
    /// deciding what to do.
    pub async fn run_autonomous(&self, log: Option<AgentLog>) -> Result<TurnState> {
        let llm = self
            .llm
            .as_deref()
            .ok_or(Error::Llm(LlmError::MissingApiKey))?;

        let directive =
            autonomous::synthesize_prompt(llm, self.platform.as_ref(), log.as_ref(), &self.config)
                .await?;
        info!(directive = %directive, "autonomous directive synthesized");
        self.run(directive, log).await
    }
}
