//! File-backed history store — one JSON document per agent.
//!
//! Storage location: `<dir>/<agent_id>.json`, each file a serialized
//! [`AgentLog`]. Reads parse the whole document; appends are
//! read-modify-write under a process-local lock. Simple, portable, and
//! human-inspectable.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use unit_core::error::HistoryError;
use unit_core::history::{AgentLog, HistoryStore, InteractionRecord};
use unit_core::identity::AgentIdentity;

pub struct FileStore {
    dir: PathBuf,
    // Serializes mutations within this process; cross-process appends are
    // last-write-wins by design.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, agent_id: &str) -> PathBuf {
        self.dir.join(format!("{agent_id}.json"))
    }

    fn read_log(&self, agent_id: &str) -> Result<Option<AgentLog>, HistoryError> {
        let path = self.path_for(agent_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(HistoryError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        match serde_json::from_str(&content) {
            Ok(log) => Ok(Some(log)),
            Err(e) => Err(HistoryError::Corrupt {
                agent_id: agent_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn write_log(&self, log: &AgentLog) -> Result<(), HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            HistoryError::Storage(format!("failed to create history directory: {e}"))
        })?;
        let path = self.path_for(&log.identity.id);
        let content = serde_json::to_string_pretty(log)
            .map_err(|e| HistoryError::Storage(format!("failed to serialize log: {e}")))?;
        std::fs::write(&path, content).map_err(|e| {
            HistoryError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "history flushed");
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn register(&self, identity: &AgentIdentity) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;
        if self.read_log(&identity.id)?.is_some() {
            warn!(agent_id = %identity.id, "register over existing log, keeping interactions");
            return Ok(());
        }
        self.write_log(&AgentLog::new(identity.clone()))
    }

    async fn append(
        &self,
        agent_id: &str,
        record: &InteractionRecord,
    ) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;
        let mut log = self
            .read_log(agent_id)?
            .ok_or_else(|| HistoryError::AgentNotFound(agent_id.to_string()))?;
        log.interactions.push(record.clone());
        self.write_log(&log)
    }

    async fn load(&self, agent_id: &str) -> Result<Option<AgentLog>, HistoryError> {
        self.read_log(agent_id)
    }

    async fn list_agents(&self) -> Result<Vec<String>, HistoryError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HistoryError::Storage(format!(
                    "failed to read history directory: {e}"
                )));
            }
        };

        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use unit_core::action::ToolKind;
    use unit_core::identity::AssignedModel;
    use unit_core::state::{ActionOutcome, ActionRequest};

    fn identity() -> AgentIdentity {
        AgentIdentity {
            id: "agent-1".into(),
            handle: "fs-bot".into(),
            profile: "hoards every interaction it has ever had".into(),
            model: AssignedModel::Gpt41Nano,
        }
    }

    fn record(iteration: u32) -> InteractionRecord {
        InteractionRecord {
            timestamp: Utc::now(),
            iteration,
            prompt: "explore the platform".into(),
            reasoning: "checking the feed first".into(),
            action: ActionRequest::new(
                ToolKind::ListPosts,
                serde_json::json!({"limit": 3}),
            ),
            result: ActionOutcome::success(serde_json::json!({"posts": []})),
            final_summary: "listed an empty feed".into(),
        }
    }

    #[tokio::test]
    async fn append_then_load_round_trips_field_for_field() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());

        store.register(&identity()).await.unwrap();
        let first = record(1);
        let second = record(2);
        store.append("agent-1", &first).await.unwrap();
        store.append("agent-1", &second).await.unwrap();

        // Reload through a fresh store: the records must come back
        // chronologically and identical.
        let reloaded = FileStore::new(tmp.path().to_path_buf());
        let log = reloaded.load("agent-1").await.unwrap().unwrap();
        assert_eq!(log.identity, identity());
        assert_eq!(log.interactions, vec![first, second]);
    }

    #[tokio::test]
    async fn append_without_register_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        let err = store.append("ghost", &record(1)).await.unwrap_err();
        assert!(matches!(err, HistoryError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn load_missing_agent_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_a_panic() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("agent-1.json"), "not json at all").unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        let err = store.load("agent-1").await.unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn register_is_idempotent_for_existing_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        store.register(&identity()).await.unwrap();
        store.append("agent-1", &record(1)).await.unwrap();
        // A second register must not wipe the log.
        store.register(&identity()).await.unwrap();
        let log = store.load("agent-1").await.unwrap().unwrap();
        assert_eq!(log.interactions.len(), 1);
    }

    #[tokio::test]
    async fn list_agents_finds_json_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        store.register(&identity()).await.unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignore me").unwrap();
        assert_eq!(store.list_agents().await.unwrap(), vec!["agent-1"]);
    }
}
