//! In-memory history store, for tests and ephemeral runs.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use unit_core::error::HistoryError;
use unit_core::history::{AgentLog, HistoryStore, InteractionRecord};
use unit_core::identity::AgentIdentity;

/// A HashMap-backed store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    logs: RwLock<HashMap<String, AgentLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn register(&self, identity: &AgentIdentity) -> Result<(), HistoryError> {
        self.logs
            .write()
            .await
            .insert(identity.id.clone(), AgentLog::new(identity.clone()));
        Ok(())
    }

    async fn append(
        &self,
        agent_id: &str,
        record: &InteractionRecord,
    ) -> Result<(), HistoryError> {
        let mut logs = self.logs.write().await;
        let log = logs
            .get_mut(agent_id)
            .ok_or_else(|| HistoryError::AgentNotFound(agent_id.to_string()))?;
        log.interactions.push(record.clone());
        Ok(())
    }

    async fn load(&self, agent_id: &str) -> Result<Option<AgentLog>, HistoryError> {
        Ok(self.logs.read().await.get(agent_id).cloned())
    }

    async fn list_agents(&self) -> Result<Vec<String>, HistoryError> {
        let mut ids: Vec<String> = self.logs.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
