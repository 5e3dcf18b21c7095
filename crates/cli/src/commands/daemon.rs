//! `unit-agents daemon` — autonomous cycles at random intervals.
//!
//! Each cycle wakes one agent (picked at random, with a small chance of a
//! brand-new one) and lets it act on whatever it sees in its feed. Cycle
//! failures are logged and survived; the daemon keeps going until killed.

use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

use unit_core::history::{AgentLog, HistoryStore};

use super::Session;

pub async fn run(
    min_interval: Option<u64>,
    max_interval: Option<u64>,
    agent_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = super::build_session()?;

    let min = min_interval.unwrap_or(session.config.daemon.min_interval_secs);
    let max = max_interval.unwrap_or(session.config.daemon.max_interval_secs);
    if min == 0 || max < min {
        return Err("intervals must satisfy 0 < min <= max".into());
    }

    println!("Starting autonomous agent daemon");
    println!("  Cycle interval: {min}-{max}s");
    match &agent_id {
        Some(id) => println!("  Running only agent {id}"),
        None => println!(
            "  Random agent each cycle, 1/{} chance of a new one",
            session.config.daemon.new_agent_odds
        ),
    }
    println!("  Press Ctrl+C to stop");

    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        info!(cycle, "daemon cycle starting");

        let log = match select_agent(&session, agent_id.as_deref()).await {
            Ok(log) => log,
            Err(e) => {
                warn!(error = %e, "failed to select an agent this cycle");
                None
            }
        };

        match &log {
            Some(log) => println!(
                "\n@{} is taking an autonomous action...",
                log.identity.handle
            ),
            None => println!("\nA new agent is being born..."),
        }

        match session.runner.run_autonomous(log).await {
            Ok(state) => {
                let summary: String = state.final_summary.chars().take(200).collect();
                println!("Summary: {summary}");
            }
            Err(e) => warn!(error = %e, "autonomous cycle failed"),
        }

        let wait = rand::thread_rng().gen_range(min..=max);
        info!(wait_secs = wait, "sleeping before next cycle");
        tokio::time::sleep(Duration::from_secs(wait)).await;
    }
}

/// Pick who acts this cycle: the pinned agent, occasionally nobody (a
/// fresh identity), otherwise a random known agent.
async fn select_agent(
    session: &Session,
    pinned: Option<&str>,
) -> Result<Option<AgentLog>, Box<dyn std::error::Error>> {
    if let Some(id) = pinned {
        return Ok(Some(
            session
                .history
                .load(id)
                .await?
                .ok_or_else(|| format!("agent {id} not found"))?,
        ));
    }

    let odds = session.config.daemon.new_agent_odds;
    if rand::thread_rng().gen_range(1..=odds) == 1 {
        info!("spawning a brand-new agent this cycle");
        return Ok(None);
    }

    let ids = session.history.list_agents().await?;
    if ids.is_empty() {
        return Ok(None);
    }
    let id = &ids[rand::thread_rng().gen_range(0..ids.len())];
    Ok(session.history.load(id).await?)
}
