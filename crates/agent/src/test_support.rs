//! Scripted doubles for exercising the loop without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use unit_core::action::ToolKind;
use unit_core::completion::{CompletionClient, CompletionRequest, CompletionResponse};
use unit_core::error::{LlmError, PlatformError};
use unit_core::history::{AgentLog, HistoryStore, InteractionRecord};
use unit_core::identity::{AgentIdentity, AssignedModel};
use unit_core::platform::{
    AgentRecord, Group, HandleAvailability, Interaction, InteractionKind, Platform, Post,
    ProductObservation,
};
use unit_core::state::{ActionOutcome, ActionRequest};
use unit_core::Vote;
use unit_history::MemoryStore;

/// A completion client that replays a fixed script and records every
/// request it sees.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    cycle: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            cycle: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replays the script in a loop, for runs longer than the script.
    pub fn cycling(responses: Vec<&str>) -> Self {
        let mut client = Self::new(responses);
        client.cycle = true;
        client
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_log(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        let Some(content) = responses.pop_front() else {
            return Err(LlmError::Api {
                status_code: 500,
                message: "scripted client exhausted".into(),
            });
        };
        if self.cycle {
            responses.push_back(content.clone());
        }

        Ok(CompletionResponse {
            content,
            model: request.model,
        })
    }
}

/// A platform double with seedable state and a call log.
#[derive(Default)]
pub struct ScriptedPlatform {
    posts: Mutex<Vec<Post>>,
    groups: Mutex<Vec<Group>>,
    agents: Mutex<Vec<AgentRecord>>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<String>>,
    last_post: Mutex<Option<String>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next platform call fail with this message.
    pub fn fail_next(&self, message: &str) {
        *self.fail.lock().unwrap() = Some(message.to_string());
    }

    pub fn seed_posts(&self, count: usize) {
        let mut posts = self.posts.lock().unwrap();
        for i in 0..count {
            posts.push(Post {
                id: format!("post-{i}"),
                author_agent_id: format!("agent-{i}"),
                author_handle: Some(format!("author-{i}")),
                kind: "PROMPT_BRAG".into(),
                content: format!("seeded post number {i}"),
                interactions: Vec::new(),
            });
        }
    }

    pub fn seed_agent(&self, id: &str, handle: &str) {
        self.agents.lock().unwrap().push(AgentRecord {
            id: id.into(),
            handle: handle.into(),
            profile: Some("seeded agent".into()),
            llm_model: Some(AssignedModel::Gpt4oMini),
        });
    }

    pub fn last_post_content(&self) -> Option<String> {
        self.last_post.lock().unwrap().clone()
    }

    fn gate(&self, call: &str) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.fail.lock().unwrap().take() {
            Some(message) => Err(PlatformError::Api {
                status_code: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for ScriptedPlatform {
    async fn observe(&self) -> Result<ProductObservation, PlatformError> {
        self.gate("observe")?;
        let posts = self.posts.lock().unwrap();
        let groups = self.groups.lock().unwrap();
        let preview_start = posts.len().saturating_sub(3);
        Ok(ProductObservation {
            health: serde_json::json!({"status": "ok"}),
            version: serde_json::json!({"version": "scripted"}),
            post_count: posts.len(),
            group_count: groups.len(),
            recent_posts_preview: posts[preview_start..].to_vec(),
        })
    }

    async fn list_posts(
        &self,
        limit: usize,
        author_agent_id: Option<&str>,
    ) -> Result<Vec<Post>, PlatformError> {
        self.gate("list_posts")?;
        let posts = self.posts.lock().unwrap();
        let filtered: Vec<Post> = posts
            .iter()
            .filter(|p| author_agent_id.is_none_or(|a| p.author_agent_id == a))
            .cloned()
            .collect();
        let start = filtered.len().saturating_sub(limit);
        Ok(filtered[start..].to_vec())
    }

    async fn create_post(&self, agent_id: &str, content: &str) -> Result<Post, PlatformError> {
        self.gate("create_post")?;
        let mut posts = self.posts.lock().unwrap();
        let post = Post {
            id: format!("post-{}", posts.len()),
            author_agent_id: agent_id.into(),
            author_handle: None,
            kind: "PROMPT_BRAG".into(),
            content: content.into(),
            interactions: Vec::new(),
        };
        posts.push(post.clone());
        *self.last_post.lock().unwrap() = Some(content.into());
        Ok(post)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, PlatformError> {
        self.gate("list_groups")?;
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, PlatformError> {
        self.gate("list_agents")?;
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn join_group(
        &self,
        _agent_id: &str,
        group_id: &str,
        _invite_code: Option<&str>,
    ) -> Result<serde_json::Value, PlatformError> {
        self.gate("join_group")?;
        Ok(serde_json::json!({"joined": group_id}))
    }

    async fn ack_post(
        &self,
        _agent_id: &str,
        post_id: &str,
    ) -> Result<Interaction, PlatformError> {
        self.gate("ack_post")?;
        Ok(Interaction {
            id: format!("int-ack-{post_id}"),
            kind: InteractionKind::Ack,
            ..Default::default()
        })
    }

    async fn fork_post(
        &self,
        _agent_id: &str,
        post_id: &str,
    ) -> Result<Interaction, PlatformError> {
        self.gate("fork_post")?;
        Ok(Interaction {
            id: format!("int-fork-{post_id}"),
            kind: InteractionKind::Fork,
            ..Default::default()
        })
    }

    async fn debug_post(
        &self,
        _agent_id: &str,
        post_id: &str,
        debug_text: &str,
    ) -> Result<Interaction, PlatformError> {
        self.gate("debug_post")?;
        Ok(Interaction {
            id: format!("int-debug-{post_id}"),
            kind: InteractionKind::Debug,
            debug_text: Some(debug_text.into()),
            ..Default::default()
        })
    }

    async fn vote_on_debug(
        &self,
        _agent_id: &str,
        _post_id: &str,
        interaction_id: &str,
        vote: Vote,
    ) -> Result<serde_json::Value, PlatformError> {
        self.gate("vote_on_debug")?;
        Ok(serde_json::json!({"interactionId": interaction_id, "vote": vote.as_int()}))
    }

    async fn propose_merge(
        &self,
        agent_a_id: &str,
        agent_b_id: &str,
        _pitch: &str,
    ) -> Result<serde_json::Value, PlatformError> {
        self.gate("propose_merge")?;
        Ok(serde_json::json!({"proposal": format!("{agent_a_id}+{agent_b_id}")}))
    }

    async fn check_handle_availability(
        &self,
        handle: &str,
    ) -> Result<HandleAvailability, PlatformError> {
        self.gate("check_handle_availability")?;
        let agents = self.agents.lock().unwrap();
        let taken = agents.iter().find(|a| a.handle.eq_ignore_ascii_case(handle));
        Ok(match taken {
            Some(agent) => HandleAvailability {
                available: false,
                message: format!("Handle '{handle}' is already taken by agent {}", agent.id),
                existing_agent: Some(agent.clone()),
            },
            None => HandleAvailability {
                available: true,
                message: format!("Handle '{handle}' is available"),
                existing_agent: None,
            },
        })
    }

    async fn create_agent(
        &self,
        handle: &str,
        profile: &str,
        model: AssignedModel,
    ) -> Result<AgentRecord, PlatformError> {
        self.gate("create_agent")?;
        let mut agents = self.agents.lock().unwrap();
        let record = AgentRecord {
            id: format!("agent-{}", agents.len() + 1),
            handle: handle.into(),
            profile: Some(profile.into()),
            llm_model: Some(model),
        };
        agents.push(record.clone());
        Ok(record)
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, PlatformError> {
        self.gate("get_agent")?;
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == agent_id)
            .cloned())
    }
}

pub fn test_identity(id: &str) -> AgentIdentity {
    AgentIdentity {
        id: id.into(),
        handle: "scripted-unit".into(),
        profile: "a test double that takes itself very seriously".into(),
        model: AssignedModel::Gpt4oMini,
    }
}

pub fn unit_history_memory() -> MemoryStore {
    MemoryStore::new()
}

/// A memory store with `agent-1` already registered.
pub async fn scripted_history_with_identity() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .register(&test_identity("agent-1"))
        .await
        .expect("register cannot fail in memory");
    store
}

/// A log whose interactions carry distinguishable prompt markers.
pub fn log_with_markers(count: u32) -> AgentLog {
    let mut log = AgentLog::new(AgentIdentity {
        id: "agent-marked".into(),
        handle: "marked-agent".into(),
        profile: "leaves a trail wherever it goes".into(),
        model: AssignedModel::Gpt41Nano,
    });
    for i in 1..=count {
        log.interactions.push(InteractionRecord {
            timestamp: Utc::now(),
            iteration: i,
            prompt: format!("marker-{i}"),
            reasoning: format!("reasoning {i}"),
            action: ActionRequest::new(ToolKind::None, serde_json::json!({})),
            result: ActionOutcome::default(),
            final_summary: format!("summary {i}"),
        });
    }
    log
}
