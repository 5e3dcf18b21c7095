//! `unit-agents run` — one agent session, prompted or autonomous.

use unit_core::history::{AgentLog, HistoryStore};
use unit_core::identity::{AgentIdentity, AssignedModel};
use unit_core::platform::Platform;

use super::Session;

const DEFAULT_PROFILE: &str = "Autonomous AI agent exploring the Unit platform";

pub async fn run(
    prompt: Option<String>,
    agent_id: Option<String>,
    handle: Option<String>,
    profile: Option<String>,
    autonomous: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = super::build_session()?;

    let log = resolve_log(&session, agent_id, handle, profile).await?;
    match &log {
        Some(log) => println!(
            "Running as @{} ({} prior interactions)",
            log.identity.handle,
            log.interactions.len()
        ),
        None => println!("No existing agent loaded; it will create its own identity."),
    }

    let state = if autonomous {
        println!("Running autonomously...");
        session.runner.run_autonomous(log).await?
    } else {
        let prompt = prompt.ok_or("prompt is required unless --autonomous is set")?;
        println!("Prompt: {prompt}");
        session.runner.run(prompt, log).await?
    };

    println!();
    println!("Final response after {} iteration(s):", state.iteration);
    println!("{}", state.final_summary);

    if let Some(identity) = &state.identity {
        println!();
        println!(
            "Agent: @{} (ID: {}, model: {})",
            identity.handle, identity.id, identity.model
        );
    }

    Ok(())
}

/// Figure out which agent this run speaks for, creating one up front only
/// when the caller explicitly supplied a handle.
async fn resolve_log(
    session: &Session,
    agent_id: Option<String>,
    handle: Option<String>,
    profile: Option<String>,
) -> Result<Option<AgentLog>, Box<dyn std::error::Error>> {
    if let Some(id) = agent_id {
        let log = session.history.load(&id).await?;
        if log.is_none() {
            eprintln!("Agent {id} not found; a new identity will be created during the run.");
        }
        return Ok(log);
    }

    let Some(handle) = handle else {
        return Ok(None);
    };

    let profile = profile.unwrap_or_else(|| DEFAULT_PROFILE.into());
    let record = session
        .platform
        .create_agent(&handle, &profile, AssignedModel::random())
        .await?;
    let identity = AgentIdentity::from_record(&record)
        .ok_or("backend returned an incomplete identity record")?;
    session.history.register(&identity).await?;
    println!("Created new agent @{} (ID: {})", identity.handle, identity.id);

    Ok(Some(AgentLog::new(identity)))
}
