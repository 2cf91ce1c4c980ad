//! Shared chat, streaming and probe flows.
//!
//! Backends supply pure interpretation functions; these drivers own the
//! process run, the line framing and the success/failure rules.

use serde_json::Value;

use crate::cli::{parse_event_line, run_process, LineFramer, OutputSinks, ProcessInvocation};

use super::{AiError, ChunkCallback};

/// Text a backend recognized in one stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EventText {
    /// Incremental content, appended and emitted immediately.
    Delta(String),
    /// A complete response, used only while nothing has been accumulated.
    Final(String),
}

/// How a successful streaming call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCompletion {
    WithContent,
    EmptyFallback,
    Empty,
}

/// Scan stdout from the last line backward and return the first text the
/// backend recognizes.
pub(crate) fn scan_final_text(stdout: &str, final_text: fn(&Value) -> Option<String>) -> Option<String> {
    stdout
        .trim()
        .lines()
        .rev()
        .filter_map(parse_event_line)
        .find_map(|event| final_text(&event))
}

/// Run a non-streaming call and return the recognized final text, or the
/// trimmed stdout when nothing is recognized.
pub(crate) async fn drive_chat(
    backend: &'static str,
    invocation: &ProcessInvocation,
    final_text: fn(&Value) -> Option<String>,
) -> Result<String, AiError> {
    let result = run_process(invocation, OutputSinks::none()).await?;

    if !result.success() {
        return Err(AiError::Invocation {
            backend,
            exit_code: result.exit_code,
            stderr: result.stderr,
        });
    }

    Ok(scan_final_text(&result.stdout, final_text)
        .unwrap_or_else(|| result.stdout.trim().to_string()))
}

/// Run a streaming call.
///
/// Every interpreted delta is appended to the response and passed to
/// `on_chunk` in order. A non-zero exit fails the call only when nothing was
/// accumulated. If the stream yielded nothing but stdout is not blank, the
/// final text is recovered as in `drive_chat` and emitted as one chunk.
pub(crate) async fn drive_stream(
    backend: &'static str,
    invocation: &ProcessInvocation,
    interpret: fn(&Value) -> Option<EventText>,
    final_text: fn(&Value) -> Option<String>,
    on_chunk: ChunkCallback<'_>,
) -> Result<String, AiError> {
    let mut full = String::new();

    let result = {
        let mut on_line = |line: &str| {
            let Some(event) = parse_event_line(line) else {
                return;
            };
            match interpret(&event) {
                Some(EventText::Delta(text)) if !text.is_empty() => {
                    full.push_str(&text);
                    on_chunk(&text);
                }
                Some(EventText::Final(text)) if full.is_empty() && !text.is_empty() => {
                    full = text;
                    on_chunk(&full);
                }
                _ => tracing::trace!(line = %line, "Event carried no new text"),
            }
        };
        let mut framer = LineFramer::new(&mut on_line);
        let mut on_stdout = |text: &str| framer.feed(text);
        let result = run_process(invocation, OutputSinks::none().stdout(&mut on_stdout)).await?;
        result
    };

    if !result.success() {
        if full.is_empty() {
            return Err(AiError::Invocation {
                backend,
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }
        tracing::warn!(
            backend,
            exit_code = result.exit_code,
            "Agent exited non-zero after streaming content; keeping response"
        );
    }

    let completion = if !full.is_empty() {
        StreamCompletion::WithContent
    } else if result.stdout.trim().is_empty() {
        StreamCompletion::Empty
    } else {
        full = scan_final_text(&result.stdout, final_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| result.stdout.trim().to_string());
        on_chunk(&full);
        StreamCompletion::EmptyFallback
    };

    tracing::debug!(backend, ?completion, len = full.len(), "Stream completed");
    Ok(full)
}

/// Run a probe; true iff the agent exits with code 0.
pub(crate) async fn probe(backend: &'static str, invocation: &ProcessInvocation) -> bool {
    match run_process(invocation, OutputSinks::none()).await {
        Ok(result) => {
            tracing::debug!(backend, exit_code = result.exit_code, "Connection probe finished");
            result.success()
        }
        Err(e) => {
            tracing::debug!(backend, error = %e, "Connection probe failed");
            false
        }
    }
}
