//! Claude Code CLI provider.
//!
//! Uses `claude -p` with `--output-format json` for single responses and
//! `--output-format stream-json` for streaming.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{AiConfig, ProviderKind};

use super::invoke::{drive_chat, drive_stream, probe, EventText};
use super::{
    compose_prompt, AiError, AiProvider, BackendCommand, ChunkCallback, ProviderTimeouts,
    PROBE_PROMPT,
};

const BACKEND: &str = "Claude";

/// Stream-json events that can carry response text.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    /// Streaming content delta.
    ContentBlockDelta { delta: Delta },
    /// Raw API event wrapped by newer CLI releases.
    StreamEvent { event: Box<StreamEvent> },
    /// Final result event.
    Result {
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
}

impl StreamEvent {
    fn into_text(self) -> Option<EventText> {
        match self {
            Self::ContentBlockDelta { delta } => delta.text.map(EventText::Delta),
            Self::StreamEvent { event } => event.into_text(),
            Self::Result { result } => result.map(EventText::Final),
            Self::Unknown => None,
        }
    }
}

/// Output format for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    StreamJson,
}

/// Claude Code CLI provider.
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    command: BackendCommand,
    model: Option<String>,
    timeouts: ProviderTimeouts,
}

impl ClaudeCli {
    /// Create a provider running `claude` from PATH.
    #[must_use]
    pub fn new() -> Self {
        Self::with_command(BackendCommand::new(ProviderKind::Claude.default_binary()))
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

    /// Build the command-line arguments.
    #[must_use]
    pub fn build_args(&self, prompt: &str, format: OutputFormat) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--output-format".to_string(),
        ];

        match format {
            OutputFormat::Json => args.push("json".to_string()),
            OutputFormat::StreamJson => {
                args.push("stream-json".to_string());
                // Print mode refuses stream-json without it.
                args.push("--verbose".to_string());
            }
        }

        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        args
    }
}

impl Default for ClaudeCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of a complete `--output-format json` envelope.
fn final_text(event: &Value) -> Option<String> {
    event.get("result")?.as_str().map(String::from)
}

/// Text carried by one stream-json event.
fn stream_text(event: &Value) -> Option<EventText> {
    StreamEvent::deserialize(event).ok()?.into_text()
}

#[async_trait]
impl AiProvider for ClaudeCli {
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        let prompt = compose_prompt(system, user);
        let invocation = self
            .command
            .invocation(self.build_args(&prompt, OutputFormat::Json), self.timeouts.chat);
        drive_chat(BACKEND, &invocation, final_text).await
    }

    async fn chat_stream(
        &self,
        system: &str,
        user: &str,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, AiError> {
        let prompt = compose_prompt(system, user);
        let invocation = self.command.invocation(
            self.build_args(&prompt, OutputFormat::StreamJson),
            self.timeouts.chat,
        );
        drive_stream(BACKEND, &invocation, stream_text, final_text, on_chunk).await
    }

    async fn test_connection(&self) -> bool {
        let invocation = self
            .command
            .invocation(self.build_args(PROBE_PROMPT, OutputFormat::Json), self.timeouts.probe);
        probe(BACKEND, &invocation).await
    }
}
