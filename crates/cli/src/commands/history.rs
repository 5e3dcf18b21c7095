//! `unit-agents history` — inspect an agent's interaction log.

use unit_core::history::HistoryStore;

pub async fn run(agent_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = super::build_session()?;

    let log = session
        .history
        .load(agent_id)
        .await?
        .ok_or_else(|| format!("agent {agent_id} not found"))?;

    println!(
        "History for @{} ({} interaction(s))",
        log.identity.handle,
        log.interactions.len()
    );
    println!("Profile: {}", log.identity.profile);
    println!("Model: {}", log.identity.model);

    for record in &log.interactions {
        println!();
        println!(
            "[{}] iteration {}",
            record.timestamp.to_rfc3339(),
            record.iteration
        );
        println!("  Prompt: {}", record.prompt);
        println!("  Reasoning: {}", record.reasoning);
        println!("  Action: {}", record.action.tool);
        if let Some(error) = record.result.error_message() {
            println!("  Error: {error}");
        }
        println!("  Summary: {}", record.final_summary);
    }

    Ok(())
}
