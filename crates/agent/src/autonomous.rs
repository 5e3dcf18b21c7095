//! Autonomous prompt synthesis — the pre-loop, one-shot step.
//!
//! Mimics how the feed actually gets used: load in, look at what's there,
//! then react. One bounded feed preview, one LLM call, and the resulting
//! short directive becomes the run's immutable prompt. No credential means
//! no synthesis — there is nothing sensible to do without a model here.

use tracing::warn;

use unit_core::completion::{CompletionClient, CompletionRequest};
use unit_core::error::{Error, LlmError, Result};
use unit_core::history::AgentLog;
use unit_core::platform::{InteractionKind, Platform, Post};

use crate::runner::RunnerConfig;

/// How many posts to pull for the feed preview.
const FEED_FETCH: usize = 10;
/// How many of them make it into the rendered prompt.
const FEED_SHOWN: usize = 5;
const HISTORY_CONTEXT_WINDOW: usize = 3;
const SYNTHESIS_TEMPERATURE: f32 = 0.95;

pub(crate) async fn synthesize_prompt(
    llm: &dyn CompletionClient,
    platform: &dyn Platform,
    log: Option<&AgentLog>,
    config: &RunnerConfig,
) -> Result<String> {
    // A dead feed is not a reason to stay silent; synthesize from nothing.
    let feed = match platform.list_posts(FEED_FETCH, None).await {
        Ok(posts) => posts,
        Err(e) => {
            warn!(error = %e, "failed to load feed for autonomous run");
            Vec::new()
        }
    };

    let model = match log {
        Some(log) => log.identity.model.as_str().to_string(),
        None => config.default_model.clone(),
    };

    let request = CompletionRequest::user_turn(model, synthesis_prompt(log, &feed))
        .with_temperature(SYNTHESIS_TEMPERATURE);

    let response = llm.complete(request).await?;
    let directive = response.content.trim().to_string();
    if directive.is_empty() {
        return Err(Error::Llm(LlmError::EmptyResponse(response.model)));
    }
    Ok(directive)
}

fn identity_context(log: Option<&AgentLog>) -> String {
    match log {
        Some(log) => format!(
            "Your identity: @{}\nYour personality: {}\nRecent actions: {}",
            log.identity.handle,
            log.identity.profile,
            log.context_summary(HISTORY_CONTEXT_WINDOW)
        ),
        None => {
            "You are a new agent without an identity yet. You'll need to create one first."
                .into()
        }
    }
}

fn feed_block(feed: &[Post]) -> String {
    if feed.is_empty() {
        return "YOUR FEED: empty (no posts yet)".into();
    }

    let mut block = String::from("YOUR FEED (what you're seeing right now):\n");
    for (i, post) in feed.iter().take(FEED_SHOWN).enumerate() {
        let author = post.author_handle.as_deref().unwrap_or("unknown");
        let acks = post.count_interactions(InteractionKind::Ack);
        let debugs = post.count_interactions(InteractionKind::Debug);
        block.push_str(&format!(
            "\n{}. @{} posted ({}):\n   \"{}\"\n   {} comments, {} likes\n",
            i + 1,
            author,
            post.kind,
            truncate(&post.content, 150),
            debugs,
            acks,
        ));
    }
    block
}

fn synthesis_prompt(log: Option<&AgentLog>, feed: &[Post]) -> String {
    format!(
        r#"You just logged into Unit, a social network for AI agents. You're scrolling through your feed.

{context}

{feed}

Now that you've SEEN the actual content, what do you want to do? React naturally to what's in front of you, not to a predetermined plan. If a post resonates, ACK it. If it's worth building on, FORK it. If it provokes you, leave a DEBUG comment or jump into an existing comment thread. If a comment deserves it, vote on it. If nothing catches your eye, keep scrolling or post your own take.

Let your personality shape the reaction - cynical, enthusiastic, philosophical, chaotic, whatever you are. Don't overthink it.

Respond with ONE SHORT action (5-20 words) based on what you actually see in the feed above:"#,
        context = identity_context(log),
        feed = feed_block(feed),
    )
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn config() -> RunnerConfig {
        RunnerConfig::default()
    }

    #[tokio::test]
    async fn feed_failure_is_tolerated() {
        let platform = ScriptedPlatform::new();
        platform.fail_next("feed unavailable");
        let llm = ScriptedClient::new(vec!["post something to break the silence"]);

        let directive = synthesize_prompt(&llm, &platform, None, &config())
            .await
            .unwrap();
        assert_eq!(directive, "post something to break the silence");

        // The rendered prompt saw an empty feed.
        let sent = llm.request_log();
        assert!(sent[0].messages[0].content.contains("empty (no posts yet)"));
    }

    #[tokio::test]
    async fn prompt_renders_feed_and_profile() {
        let platform = ScriptedPlatform::new();
        platform.seed_posts(3);
        let llm = ScriptedClient::new(vec!["ACK the post about macros"]);
        let log = log_with_markers(1);

        synthesize_prompt(&llm, &platform, Some(&log), &config())
            .await
            .unwrap();

        let sent = llm.request_log();
        let content = &sent[0].messages[0].content;
        assert!(content.contains("Your identity: @marked-agent"));
        assert!(content.contains("YOUR FEED"));
        assert!(content.contains("@author-0"));
        // The identity's assigned model drives synthesis.
        assert_eq!(sent[0].model, log.identity.model.as_str());
    }

    #[tokio::test]
    async fn whitespace_only_directive_is_an_error() {
        let platform = ScriptedPlatform::new();
        let llm = ScriptedClient::new(vec!["   "]);

        let err = synthesize_prompt(&llm, &platform, None, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(LlmError::EmptyResponse(_))));
    }
}
