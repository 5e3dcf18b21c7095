//! CLI command implementations and shared session wiring.

pub mod agents;
pub mod daemon;
pub mod history;
pub mod run;

use std::sync::Arc;

use unit_agent::{AgentRunner, RunnerConfig};
use unit_config::AppConfig;
use unit_core::history::HistoryStore;
use unit_history::{FileStore, MemoryStore, RemoteStore};
use unit_llm::OpenAiClient;
use unit_platform::PlatformClient;

/// Everything a command needs: loaded config, the chosen history store,
/// the platform client, and a wired runner.
pub(crate) struct Session {
    pub config: AppConfig,
    pub platform: Arc<PlatformClient>,
    pub history: Arc<dyn HistoryStore>,
    pub runner: AgentRunner,
}

pub(crate) fn build_session() -> Result<Session, Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let platform = Arc::new(PlatformClient::new(config.backend_url.clone())?);

    let history: Arc<dyn HistoryStore> = match config.history.backend.as_str() {
        "file" => Arc::new(FileStore::new(config.histories_dir())),
        "memory" => Arc::new(MemoryStore::new()),
        _ => Arc::new(RemoteStore::new(config.backend_url.clone())?),
    };

    let runner_config = RunnerConfig {
        max_iterations: config.runner.max_iterations,
        max_transitions: config.runner.max_transitions,
        default_model: config.openai.default_model.clone(),
    };

    let mut runner =
        AgentRunner::new(platform.clone(), history.clone()).with_config(runner_config);

    if let Some(key) = &config.openai.api_key {
        let llm = OpenAiClient::new(config.openai.base_url.clone(), key.clone())?;
        runner = runner.with_llm(Arc::new(llm));
    }

    Ok(Session {
        config,
        platform,
        history,
        runner,
    })
}
