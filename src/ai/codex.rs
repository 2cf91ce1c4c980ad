//! OpenAI Codex CLI provider.
//!
//! Runs `codex exec --json`, which prints one JSON event per line. The
//! response text arrives in `item.completed` events whose item is an
//! `agent_message`; older releases used flat `output`/`text`/`content`/`delta`
//! fields, which are still recognized.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AiConfig, ProviderKind};

use super::invoke::{drive_chat, drive_stream, probe, EventText};
use super::{
    compose_prompt, AiError, AiProvider, BackendCommand, ChunkCallback, ProviderTimeouts,
    PROBE_PROMPT,
};

const BACKEND: &str = "Codex";

/// Codex CLI provider.
#[derive(Debug, Clone)]
pub struct CodexCli {
    command: BackendCommand,
    model: Option<String>,
    timeouts: ProviderTimeouts,
}

impl CodexCli {
    /// Create a provider running `codex` from PATH.
    #[must_use]
    pub fn new() -> Self {
        Self::with_command(BackendCommand::new(ProviderKind::Codex.default_binary()))
    }

    /// Create a provider with a custom command (wrappers, test stubs).
    #[must_use]
    pub fn with_command(command: BackendCommand) -> Self {
        Self {
            command,
            model: None,
            timeouts: ProviderTimeouts::default(),
        }
    }

    /// Create a provider from configuration.
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            command: BackendCommand::from_config(config),
            model: config.model.clone(),
            timeouts: ProviderTimeouts::from(config),
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn timeouts(mut self, timeouts: ProviderTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the command-line arguments for one prompt.
    #[must_use]
    pub fn build_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec!["exec".to_string(), "--json".to_string()];
        if let Some(model) = &self.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        args.push(prompt.to_string());
        args.push("--skip-git-repo-check".to_string());
        args
    }
}

impl Default for CodexCli {
    fn default() -> Self {
        Self::new()
    }
}

fn string_field(event: &Value, key: &str) -> Option<String> {
    event.get(key)?.as_str().map(String::from)
}

fn agent_message(event: &Value) -> Option<String> {
    let item = event.get("item")?;
    if item.get("type")?.as_str()? != "agent_message" {
        return None;
    }
    string_field(item, "text")
}

/// Text of a complete response line.
fn final_text(event: &Value) -> Option<String> {
    agent_message(event)
        .or_else(|| string_field(event, "output"))
        .or_else(|| string_field(event, "result"))
        .or_else(|| string_field(event, "text"))
}

/// Text carried by one streamed event.
fn stream_text(event: &Value) -> Option<EventText> {
    // Started/updated items are partial snapshots of the completed one.
    if matches!(
        event.get("type").and_then(Value::as_str),
        Some("item.started" | "item.updated")
    ) {
        return None;
    }

    agent_message(event)
        .or_else(|| string_field(event, "content"))
        .or_else(|| string_field(event, "text"))
        .or_else(|| string_field(event, "delta"))
        .map(EventText::Delta)
}

#[async_trait]
impl AiProvider for CodexCli {
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        let prompt = compose_prompt(system, user);
        let invocation = self
            .command
            .invocation(self.build_args(&prompt), self.timeouts.chat);
        drive_chat(BACKEND, &invocation, final_text).await
    }

    async fn chat_stream(
        &self,
        system: &str,
        user: &str,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, AiError> {
        let prompt = compose_prompt(system, user);
        let invocation = self
            .command
            .invocation(self.build_args(&prompt), self.timeouts.chat);
        drive_stream(BACKEND, &invocation, stream_text, final_text, on_chunk).await
    }

    async fn test_connection(&self) -> bool {
        let invocation = self
            .command
            .invocation(self.build_args(PROBE_PROMPT), self.timeouts.probe);
        probe(BACKEND, &invocation).await
    }
}
