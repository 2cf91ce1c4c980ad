//! Installing and authenticating the backend CLI.

use std::time::Duration;

use serde::Serialize;

use crate::cli::{run_process, OutputCallback, OutputSinks, ProcessError, ProcessInvocation, ProcessResult};
use crate::config::{ProviderKind, TailorConfig};

use super::BackendCommand;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(unix)]
const LOOKUP_PROGRAM: &str = "which";
#[cfg(not(unix))]
const LOOKUP_PROGRAM: &str = "where";

/// Result of an install or login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupOutcome {
    pub success: bool,
    pub message: String,
}

impl SetupOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Map a finished run: exit 0 succeeds, otherwise stderr or a
    /// description of the exit code becomes the message.
    fn from_run(label: &str, success_message: &str, run: Result<ProcessResult, ProcessError>) -> Self {
        match run {
            Ok(result) if result.success() => Self::ok(success_message),
            Ok(result) => {
                let stderr = result.stderr.trim();
                if stderr.is_empty() {
                    Self::failed(format!("{label} failed with code {}", result.exit_code))
                } else {
                    Self::failed(stderr)
                }
            }
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Whether the backend CLI has a stored login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}

/// Setup operations for one backend.
#[derive(Debug, Clone)]
pub struct CliSetup {
    kind: ProviderKind,
    command: BackendCommand,
    npm_command: String,
    install_timeout: Duration,
    login_timeout: Duration,
    auth_timeout: Duration,
}

impl CliSetup {
    /// Setup for `kind` with default commands and deadlines.
    #[must_use]
    pub fn new(kind: ProviderKind) -> Self {
        let mut config = TailorConfig::default();
        config.ai.provider = kind;
        Self::from_config(&config)
    }

    #[must_use]
    pub fn from_config(config: &TailorConfig) -> Self {
        Self {
            kind: config.ai.provider,
            command: BackendCommand::from_config(&config.ai),
            npm_command: config.setup.npm_command.clone(),
            install_timeout: Duration::from_secs(config.setup.install_timeout_secs),
            login_timeout: Duration::from_secs(config.setup.login_timeout_secs),
            auth_timeout: Duration::from_secs(config.setup.auth_timeout_secs),
        }
    }

    /// Replace the command used to run the backend.
    #[must_use]
    pub fn with_command(mut self, command: BackendCommand) -> Self {
        self.command = command;
        self
    }

    #[must_use]
    pub fn with_npm_command(mut self, npm_command: impl Into<String>) -> Self {
        self.npm_command = npm_command.into();
        self
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Look the backend program up on PATH.
    pub async fn is_installed(&self) -> bool {
        let invocation =
            ProcessInvocation::new(LOOKUP_PROGRAM, [self.command.program()]).timeout(LOOKUP_TIMEOUT);
        match run_process(&invocation, OutputSinks::none()).await {
            Ok(result) => result.success(),
            Err(e) => {
                tracing::debug!(program = self.command.program(), error = %e, "PATH lookup failed");
                false
            }
        }
    }

    /// Install the backend globally with npm, streaming its output to
    /// `on_progress`.
    pub async fn install(&self, on_progress: OutputCallback<'_>) -> SetupOutcome {
        let package = self.kind.npm_package();
        let invocation = ProcessInvocation::new(self.npm_command.clone(), ["install", "-g", package])
            .timeout(self.install_timeout)
            .through_shell(true);

        tracing::info!(package, "Installing backend CLI");
        let run = run_process(&invocation, OutputSinks::merged(on_progress)).await;
        SetupOutcome::from_run(
            "npm install",
            &format!("{} CLI installed successfully.", self.kind.display_name()),
            run,
        )
    }

    /// Run the backend's login flow.
    pub async fn login(&self) -> SetupOutcome {
        if self.kind == ProviderKind::Claude {
            return SetupOutcome::failed(
                "Claude CLI has no non-interactive login; run `claude` once to sign in.",
            );
        }

        let invocation = self.command.invocation(vec!["login".to_string()], self.login_timeout);
        let run = run_process(&invocation, OutputSinks::none()).await;
        SetupOutcome::from_run(
            &format!("{} login", self.command.program()),
            "Login succeeded.",
            run,
        )
    }

    /// Ask the backend whether a login is stored.
    pub async fn auth_status(&self) -> AuthStatus {
        if self.kind == ProviderKind::Claude {
            return AuthStatus {
                authenticated: false,
            };
        }

        let invocation = self
            .command
            .invocation(vec!["login".to_string(), "status".to_string()], self.auth_timeout);
        let authenticated = match run_process(&invocation, OutputSinks::none()).await {
            Ok(result) => result.success(),
            Err(e) => {
                tracing::debug!(error = %e, "Auth status check failed");
                false
            }
        };
        AuthStatus { authenticated }
    }
}
