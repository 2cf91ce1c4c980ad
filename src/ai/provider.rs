//! Provider abstraction over AI command-line agents.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::cli::{ProcessError, ProcessInvocation};
use crate::config::{AiConfig, ProviderKind};

use super::{ClaudeCli, CodexCli, ExtractError};

/// Prompt used by connectivity probes.
pub const PROBE_PROMPT: &str = "respond ok";

/// Errors from AI provider operations.
#[derive(Error, Debug)]
pub enum AiError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    /// The agent exited non-zero without producing usable output.
    #[error("{backend} CLI failed (exit {exit_code}): {stderr}")]
    Invocation {
        backend: &'static str,
        exit_code: i32,
        stderr: String,
    },
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error("Failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Callback receiving each streamed chunk of response text.
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Trait for AI providers backed by a command-line agent.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Send one prompt and return the agent's final text.
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError>;

    /// Send one prompt, delivering text to `on_chunk` as the agent produces
    /// it, and return the full response.
    async fn chat_stream(
        &self,
        system: &str,
        user: &str,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, AiError>;

    /// Check that the agent answers at all. Never fails.
    async fn test_connection(&self) -> bool;
}

/// Combine system and user content into the single prompt argument the
/// agents accept.
#[must_use]
pub fn compose_prompt(system: &str, user: &str) -> String {
    format!("{system}\n\n{user}")
}

/// How to launch a backend binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    program: String,
    leading_args: Vec<String>,
    shell: bool,
}

impl BackendCommand {
    /// Run `program` through the platform shell with no leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            shell: true,
        }
    }

    /// Build the command described by an `AiConfig`.
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config.program())
            .with_leading_args(config.command_args.iter().cloned())
            .through_shell(config.use_shell)
    }

    /// Arguments inserted before every backend argument list.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn through_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build an invocation with `args` appended to the leading arguments.
    #[must_use]
    pub fn invocation(&self, args: Vec<String>, timeout: Duration) -> ProcessInvocation {
        let all_args = self.leading_args.iter().cloned().chain(args);
        ProcessInvocation::new(self.program.clone(), all_args)
            .timeout(timeout)
            .through_shell(self.shell)
    }
}

/// Deadlines applied by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimeouts {
    pub chat: Duration,
    pub probe: Duration,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self::from(&AiConfig::default())
    }
}

impl From<&AiConfig> for ProviderTimeouts {
    fn from(config: &AiConfig) -> Self {
        Self {
            chat: config.chat_timeout(),
            probe: config.probe_timeout(),
        }
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Codex(CodexCli),
    Claude(ClaudeCli),
}

impl Provider {
    /// Create the provider selected by `config`.
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        match config.provider {
            ProviderKind::Codex => Self::Codex(CodexCli::from_config(config)),
            ProviderKind::Claude => Self::Claude(ClaudeCli::from_config(config)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Codex(_) => ProviderKind::Codex,
            Self::Claude(_) => ProviderKind::Claude,
        }
    }
}

#[async_trait]
impl AiProvider for Provider {
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        match self {
            Self::Codex(p) => p.chat(system, user).await,
            Self::Claude(p) => p.chat(system, user).await,
        }
    }

    async fn chat_stream(
        &self,
        system: &str,
        user: &str,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, AiError> {
        match self {
            Self::Codex(p) => p.chat_stream(system, user, on_chunk).await,
            Self::Claude(p) => p.chat_stream(system, user, on_chunk).await,
        }
    }

    async fn test_connection(&self) -> bool {
        match self {
            Self::Codex(p) => p.test_connection().await,
            Self::Claude(p) => p.test_connection().await,
        }
    }
}
