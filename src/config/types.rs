//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// AI backend kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Codex,
    Claude,
}

impl ProviderKind {
    /// Binary name looked up on PATH when no command override is set.
    #[must_use]
    pub fn default_binary(self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Claude => "claude",
        }
    }

    /// Human-readable backend name used in messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Codex => "Codex",
            Self::Claude => "Claude",
        }
    }

    /// npm package that provides the backend CLI.
    #[must_use]
    pub fn npm_package(self) -> &'static str {
        match self {
            Self::Codex => "@openai/codex",
            Self::Claude => "@anthropic-ai/claude-code",
        }
    }
}

/// Configuration for the AI backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    /// Backend to use (codex or claude).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Override for the backend binary.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the backend arguments (e.g. `["codex"]` with
    /// `command = "npx"`).
    #[serde(default)]
    pub command_args: Vec<String>,
    /// Model passed to the backend, if any.
    #[serde(default)]
    pub model: Option<String>,
    /// Run the backend through the platform shell.
    #[serde(default = "default_use_shell")]
    pub use_shell: bool,
    /// Deadline for chat and streaming calls.
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    /// Deadline for the connectivity probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_use_shell() -> bool {
    true
}

fn default_chat_timeout_secs() -> u64 {
    300
}

fn default_probe_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            command: None,
            command_args: Vec::new(),
            model: None,
            use_shell: default_use_shell(),
            chat_timeout_secs: default_chat_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// The binary to run, falling back to the provider's default.
    #[must_use]
    pub fn program(&self) -> &str {
        self.command
            .as_deref()
            .unwrap_or_else(|| self.provider.default_binary())
    }

    #[must_use]
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Configuration for installing and authenticating the backend CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetupConfig {
    /// npm binary used for installation.
    #[serde(default = "default_npm_command")]
    pub npm_command: String,
    #[serde(default = "default_install_timeout_secs")]
    pub install_timeout_secs: u64,
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

fn default_npm_command() -> String {
    "npm".to_string()
}

fn default_install_timeout_secs() -> u64 {
    300
}

fn default_login_timeout_secs() -> u64 {
    120
}

fn default_auth_timeout_secs() -> u64 {
    15
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            npm_command: default_npm_command(),
            install_timeout_secs: default_install_timeout_secs(),
            login_timeout_secs: default_login_timeout_secs(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TailorConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub setup: SetupConfig,
}
