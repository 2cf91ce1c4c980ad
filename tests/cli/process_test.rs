//! Tests for running child processes.
#![cfg(unix)]

use std::time::{Duration, Instant};

use resume_tailor::cli::{run_process, OutputSinks, ProcessError, ProcessInvocation, SpawnError};
use tokio_test::{assert_err, assert_ok};

fn sh(script: &str) -> ProcessInvocation {
    ProcessInvocation::new("sh", ["-c", script]).timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn collects_stdout_stderr_and_exit_code() {
    let result = assert_ok!(
        run_process(&sh("echo out; echo err >&2; exit 3"), OutputSinks::none()).await
    );

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert!(!result.success());
}

#[tokio::test]
async fn forwards_each_pipe_to_its_callback() {
    let mut out = String::new();
    let mut err = String::new();
    let mut on_out = |text: &str| out.push_str(text);
    let mut on_err = |text: &str| err.push_str(text);

    let result = run_process(
        &sh("echo one; echo two >&2; echo three"),
        OutputSinks::none().stdout(&mut on_out).stderr(&mut on_err),
    )
    .await
    .unwrap();

    assert!(result.success());
    assert_eq!(out, "one\nthree\n");
    assert_eq!(err, "two\n");
}

#[tokio::test]
async fn merged_callback_receives_both_pipes() {
    let mut merged = String::new();
    let mut on_text = |text: &str| merged.push_str(text);

    let result = run_process(&sh("echo a; echo b >&2"), OutputSinks::merged(&mut on_text))
        .await
        .unwrap();

    assert_eq!(result.stdout, "a\n");
    assert_eq!(result.stderr, "b\n");
    assert!(merged.contains("a\n"));
    assert!(merged.contains("b\n"));
    assert_eq!(merged.len(), 4);
}

#[tokio::test]
async fn decodes_multibyte_output() {
    let result = run_process(&sh("printf 'résumé ✓ naïve'"), OutputSinks::none())
        .await
        .unwrap();
    assert_eq!(result.stdout, "résumé ✓ naïve");
}

#[tokio::test]
async fn shell_mode_preserves_awkward_arguments() {
    let invocation = ProcessInvocation::new(
        "printf",
        ["%s|", "two words", "it's \"quoted\"", "line\nbreak", "$HOME"],
    )
    .through_shell(true)
    .timeout(Duration::from_secs(10));

    let result = run_process(&invocation, OutputSinks::none()).await.unwrap();
    assert_eq!(result.stdout, "two words|it's \"quoted\"|line\nbreak|$HOME|");
}

#[tokio::test]
async fn runs_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = ProcessInvocation::new("pwd", Vec::<String>::new())
        .working_dir(dir.path())
        .timeout(Duration::from_secs(10));

    let result = run_process(&invocation, OutputSinks::none()).await.unwrap();
    let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
    assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let invocation = ProcessInvocation::new("resume-tailor-no-such-binary", ["x"]);
    let err = assert_err!(run_process(&invocation, OutputSinks::none()).await);
    assert!(matches!(
        err,
        ProcessError::Spawn(SpawnError::NotFound(ref program)) if program == "resume-tailor-no-such-binary"
    ));
}

#[tokio::test]
async fn missing_program_through_shell_exits_non_zero() {
    let invocation = ProcessInvocation::new("resume-tailor-no-such-binary", ["x"])
        .through_shell(true)
        .timeout(Duration::from_secs(10));
    let result = run_process(&invocation, OutputSinks::none()).await.unwrap();
    assert_eq!(result.exit_code, 127);
    assert!(!result.stderr.is_empty());
}

#[tokio::test]
async fn timeout_kills_the_process() {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
    let invocation = sh(&script).timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = run_process(&invocation, OutputSinks::none())
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::TimedOut(t) if t == Duration::from_millis(300)));
    assert_eq!(err.to_string(), "CLI process timed out after 300ms");
    assert!(started.elapsed() < Duration::from_secs(10));

    let pid: i32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(kill(Pid::from_raw(pid), None).is_err(), "process {pid} still alive");
}
