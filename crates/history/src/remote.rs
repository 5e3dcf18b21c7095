//! Remote history store — persists through the platform's interaction
//! resource.
//!
//! Wire format note: the backend stores `action` and `result` as
//! JSON-encoded strings inside the JSON payload; loads parse them back.
//! The backend returns interactions newest-first, so `load` reverses into
//! chronological order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use unit_core::error::HistoryError;
use unit_core::history::{AgentLog, HistoryStore, InteractionRecord};
use unit_core::identity::AgentIdentity;
use unit_core::platform::AgentRecord;
use unit_core::state::{ActionOutcome, ActionRequest};

pub struct RemoteStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendPayload<'a> {
    agent_id: &'a str,
    timestamp: DateTime<Utc>,
    iteration: u32,
    prompt: &'a str,
    reasoning: &'a str,
    action: String,
    result: String,
    #[serde(rename = "final")]
    final_summary: &'a str,
}

#[derive(Deserialize)]
struct StoredInteraction {
    timestamp: DateTime<Utc>,
    iteration: u32,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    result: String,
    #[serde(rename = "final", default)]
    final_summary: String,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HistoryError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| HistoryError::Storage(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HistoryError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(HistoryError::AgentNotFound(path.to_string()));
        }
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Storage(format!(
                "backend returned {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| HistoryError::Storage(format!("unexpected response shape: {e}")))
    }

    fn decode_record(agent_id: &str, stored: StoredInteraction) -> Option<InteractionRecord> {
        let action: ActionRequest = match serde_json::from_str(&stored.action) {
            Ok(a) => a,
            Err(e) => {
                warn!(agent_id, error = %e, "skipping interaction with undecodable action");
                return None;
            }
        };
        let result: ActionOutcome = match serde_json::from_str(&stored.result) {
            Ok(r) => r,
            Err(e) => {
                warn!(agent_id, error = %e, "skipping interaction with undecodable result");
                return None;
            }
        };
        Some(InteractionRecord {
            timestamp: stored.timestamp,
            iteration: stored.iteration,
            prompt: stored.prompt,
            reasoning: stored.reasoning,
            action,
            result,
            final_summary: stored.final_summary,
        })
    }
}

#[async_trait]
impl HistoryStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    /// The platform already knows the identity from its creation call;
    /// nothing extra to persist here.
    async fn register(&self, _identity: &AgentIdentity) -> Result<(), HistoryError> {
        Ok(())
    }

    async fn append(
        &self,
        agent_id: &str,
        record: &InteractionRecord,
    ) -> Result<(), HistoryError> {
        let payload = AppendPayload {
            agent_id,
            timestamp: record.timestamp,
            iteration: record.iteration,
            prompt: &record.prompt,
            reasoning: &record.reasoning,
            action: serde_json::to_string(&record.action)
                .map_err(|e| HistoryError::Storage(format!("failed to encode action: {e}")))?,
            result: serde_json::to_string(&record.result)
                .map_err(|e| HistoryError::Storage(format!("failed to encode result: {e}")))?,
            final_summary: &record.final_summary,
        };

        let response = self
            .client
            .post(format!("{}/agent-interactions", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Storage(format!(
                "failed to save interaction: {status} {body}"
            )));
        }
        debug!(agent_id, iteration = record.iteration, "interaction persisted");
        Ok(())
    }

    async fn load(&self, agent_id: &str) -> Result<Option<AgentLog>, HistoryError> {
        let record: AgentRecord = match self.get_json(&format!("/agents/{agent_id}")).await {
            Ok(r) => r,
            Err(HistoryError::AgentNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(identity) = AgentIdentity::from_record(&record) else {
            return Err(HistoryError::Corrupt {
                agent_id: agent_id.to_string(),
                reason: "directory record has no id or handle".into(),
            });
        };

        let stored: Vec<StoredInteraction> = self
            .get_json(&format!("/agent-interactions/agent/{agent_id}"))
            .await?;

        // Newest-first from the backend; reverse into chronological order.
        let interactions = stored
            .into_iter()
            .rev()
            .filter_map(|s| Self::decode_record(agent_id, s))
            .collect();

        Ok(Some(AgentLog {
            identity,
            interactions,
        }))
    }

    async fn list_agents(&self) -> Result<Vec<String>, HistoryError> {
        let agents: Vec<AgentRecord> = self.get_json("/agents").await?;
        Ok(agents.into_iter().map(|a| a.id).collect())
    }
}
