//! CLI setup tests against stub commands.
#![cfg(unix)]

use resume_tailor::ai::{BackendCommand, CliSetup};
use resume_tailor::config::ProviderKind;

use crate::support::StubBackend;

#[tokio::test]
async fn is_installed_looks_up_path() {
    let present = CliSetup::new(ProviderKind::Codex).with_command(BackendCommand::new("sh"));
    assert!(present.is_installed().await);

    let absent = CliSetup::new(ProviderKind::Codex)
        .with_command(BackendCommand::new("resume-tailor-no-such-agent"));
    assert!(!absent.is_installed().await);
}

#[tokio::test]
async fn install_streams_npm_output() {
    // `echo` stands in for npm and prints the arguments it was given.
    let setup = CliSetup::new(ProviderKind::Codex).with_npm_command("echo");
    let mut progress = String::new();
    let mut on_progress = |text: &str| progress.push_str(text);

    let outcome = setup.install(&mut on_progress).await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "Codex CLI installed successfully.");
    assert_eq!(progress, "install -g @openai/codex\n");
}

#[tokio::test]
async fn install_uses_claude_package() {
    let setup = CliSetup::new(ProviderKind::Claude).with_npm_command("echo");
    let mut progress = String::new();
    let mut on_progress = |text: &str| progress.push_str(text);

    assert!(setup.install(&mut on_progress).await.success);
    assert_eq!(progress, "install -g @anthropic-ai/claude-code\n");
}

#[tokio::test]
async fn install_failure_without_stderr_reports_exit_code() {
    let setup = CliSetup::new(ProviderKind::Codex).with_npm_command("false");
    let mut on_progress = |_: &str| {};

    let outcome = setup.install(&mut on_progress).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "npm install failed with code 1");
}

#[tokio::test]
async fn install_with_missing_npm_reports_shell_error() {
    let setup = CliSetup::new(ProviderKind::Codex).with_npm_command("resume-tailor-no-such-npm");
    let mut on_progress = |_: &str| {};

    let outcome = setup.install(&mut on_progress).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("resume-tailor-no-such-npm"));
}

#[tokio::test]
async fn login_runs_backend_login() {
    let stub = StubBackend::new("Logged in\n", "", 0);
    let setup = CliSetup::new(ProviderKind::Codex).with_command(stub.command());

    let outcome = setup.login().await;

    assert!(outcome.success);
    assert_eq!(stub.recorded_args(), vec!["login"]);
}

#[tokio::test]
async fn login_failure_prefers_stderr() {
    let stub = StubBackend::new("", "browser flow cancelled\n", 1);
    let setup = CliSetup::new(ProviderKind::Codex).with_command(stub.command());

    let outcome = setup.login().await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "browser flow cancelled");
}

#[tokio::test]
async fn login_failure_without_stderr_reports_exit_code() {
    let stub = StubBackend::new("", "", 4);
    let setup = CliSetup::new(ProviderKind::Codex).with_command(stub.command());

    let outcome = setup.login().await;

    assert!(!outcome.success);
    assert!(outcome.message.ends_with("login failed with code 4"));
}

#[tokio::test]
async fn auth_status_follows_exit_code() {
    let logged_in = StubBackend::new("Logged in using ChatGPT\n", "", 0);
    let setup = CliSetup::new(ProviderKind::Codex).with_command(logged_in.command());
    assert!(setup.auth_status().await.authenticated);
    assert_eq!(logged_in.recorded_args(), vec!["login", "status"]);

    let logged_out = StubBackend::new("Not logged in\n", "", 1);
    let setup = CliSetup::new(ProviderKind::Codex).with_command(logged_out.command());
    assert!(!setup.auth_status().await.authenticated);

    let missing = CliSetup::new(ProviderKind::Codex).with_command(
        BackendCommand::new("resume-tailor-no-such-agent").through_shell(false),
    );
    assert!(!missing.auth_status().await.authenticated);
}

#[tokio::test]
async fn claude_login_is_unsupported_without_spawning() {
    let stub = StubBackend::new("", "", 0);
    let setup = CliSetup::new(ProviderKind::Claude).with_command(stub.command());

    assert!(!setup.login().await.success);
    assert!(!setup.auth_status().await.authenticated);
    assert!(!stub.dir().join("args.bin").exists());
}
