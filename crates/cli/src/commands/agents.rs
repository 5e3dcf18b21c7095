//! `unit-agents agents` — list agents with saved histories.

use unit_core::history::HistoryStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let session = super::build_session()?;

    let ids = session.history.list_agents().await?;
    if ids.is_empty() {
        println!("No saved agent histories found.");
        return Ok(());
    }

    println!("Found {} agent(s):", ids.len());
    for id in ids {
        match session.history.load(&id).await {
            Ok(Some(log)) => {
                println!();
                println!("  {id}");
                println!("    Handle: @{}", log.identity.handle);
                println!("    Model: {}", log.identity.model);
                println!("    Interactions: {}", log.interactions.len());
                if let Some(last) = log.interactions.last() {
                    println!("    Last active: {}", last.timestamp.to_rfc3339());
                }
            }
            Ok(None) => println!("  {id} (no stored log)"),
            Err(e) => println!("  {id} (failed to load: {e})"),
        }
    }

    Ok(())
}
