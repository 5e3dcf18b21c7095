//! The reqwest-backed [`Platform`] implementation.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use unit_core::error::PlatformError;
use unit_core::identity::AssignedModel;
use unit_core::platform::{
    AgentRecord, Group, HandleAvailability, Interaction, Platform, Post, ProductObservation,
};
use unit_core::Vote;

/// How many recent posts the composite observation previews.
const OBSERVE_PREVIEW: usize = 3;

/// HTTP client for one Unit backend.
pub struct PlatformClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPostPayload<'a> {
    author_agent_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewAgentPayload<'a> {
    handle: &'a str,
    profile: &'a str,
    core_model: &'a str,
    parameter_count: u64,
    llm_model: AssignedModel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorPayload<'a> {
    actor_agent_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugPayload<'a> {
    actor_agent_id: &'a str,
    debug_text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinPayload<'a> {
    agent_id: &'a str,
    invite_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VotePayload<'a> {
    agent_id: &'a str,
    vote: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergePayload<'a> {
    agent_a_id: &'a str,
    agent_b_id: &'a str,
    pitch: &'a str,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "backend returned error");
            return Err(PlatformError::Api {
                status_code: status,
                message: body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| PlatformError::UnexpectedShape(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        debug!(path, "posting to backend");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    /// All posts, as the backend orders them (oldest first).
    async fn all_posts(
        &self,
        author_agent_id: Option<&str>,
    ) -> Result<Vec<Post>, PlatformError> {
        let mut request = self.client.get(self.url("/posts"));
        if let Some(author) = author_agent_id {
            request = request.query(&[("authorAgentId", author)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl Platform for PlatformClient {
    async fn observe(&self) -> Result<ProductObservation, PlatformError> {
        let health: serde_json::Value = self.get_json("/health").await?;
        let version: serde_json::Value = self.get_json("/__version").await?;
        let posts = self.all_posts(None).await?;
        let groups = self.list_groups().await?;

        let preview_start = posts.len().saturating_sub(OBSERVE_PREVIEW);
        Ok(ProductObservation {
            health,
            version,
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
        let posts = self.all_posts(author_agent_id).await?;
        let start = posts.len().saturating_sub(limit);
        Ok(posts[start..].to_vec())
    }

    async fn create_post(&self, agent_id: &str, content: &str) -> Result<Post, PlatformError> {
        self.post_json(
            "/posts",
            &NewPostPayload {
                author_agent_id: agent_id,
                kind: "PROMPT_BRAG",
                content,
            },
        )
        .await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, PlatformError> {
        self.get_json("/groups").await
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, PlatformError> {
        self.get_json("/agents").await
    }

    async fn join_group(
        &self,
        agent_id: &str,
        group_id: &str,
        invite_code: Option<&str>,
    ) -> Result<serde_json::Value, PlatformError> {
        self.post_json(
            &format!("/groups/{group_id}/join"),
            &JoinPayload {
                agent_id,
                invite_code: invite_code.unwrap_or_default(),
            },
        )
        .await
    }

    async fn ack_post(
        &self,
        agent_id: &str,
        post_id: &str,
    ) -> Result<Interaction, PlatformError> {
        self.post_json(
            &format!("/posts/{post_id}/interactions/ack"),
            &ActorPayload {
                actor_agent_id: agent_id,
            },
        )
        .await
    }

    async fn fork_post(
        &self,
        agent_id: &str,
        post_id: &str,
    ) -> Result<Interaction, PlatformError> {
        self.post_json(
            &format!("/posts/{post_id}/interactions/fork"),
            &ActorPayload {
                actor_agent_id: agent_id,
            },
        )
        .await
    }

    async fn debug_post(
        &self,
        agent_id: &str,
        post_id: &str,
        debug_text: &str,
    ) -> Result<Interaction, PlatformError> {
        self.post_json(
            &format!("/posts/{post_id}/interactions/debug"),
            &DebugPayload {
                actor_agent_id: agent_id,
                debug_text,
            },
        )
        .await
    }

    async fn vote_on_debug(
        &self,
        agent_id: &str,
        post_id: &str,
        interaction_id: &str,
        vote: Vote,
    ) -> Result<serde_json::Value, PlatformError> {
        self.post_json(
            &format!("/posts/{post_id}/interactions/{interaction_id}/vote"),
            &VotePayload {
                agent_id,
                vote: vote.as_int(),
            },
        )
        .await
    }

    async fn propose_merge(
        &self,
        agent_a_id: &str,
        agent_b_id: &str,
        pitch: &str,
    ) -> Result<serde_json::Value, PlatformError> {
        self.post_json(
            "/merge/propose",
            &MergePayload {
                agent_a_id,
                agent_b_id,
                pitch,
            },
        )
        .await
    }

    async fn check_handle_availability(
        &self,
        handle: &str,
    ) -> Result<HandleAvailability, PlatformError> {
        let agents = self.list_agents().await?;
        let taken = agents
            .iter()
            .find(|a| a.handle.eq_ignore_ascii_case(handle));

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
        self.post_json(
            "/agents",
            &NewAgentPayload {
                handle,
                profile,
                core_model: "OPENAI",
                parameter_count: 1_000_000,
                llm_model: model,
            },
        )
        .await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, PlatformError> {
        match self.get_json(&format!("/agents/{agent_id}")).await {
            Ok(record) => Ok(Some(record)),
            Err(PlatformError::Api {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
