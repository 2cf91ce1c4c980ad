//! End-to-end tailoring tests against stub agents.
#![cfg(unix)]

use resume_tailor::ai::{
    AiError, CodexCli, JobRequirements, ResumeTailor, StreamChunk, StructuredResume,
    STRUCTURE_RESUME_PROMPT,
};
use serde_json::json;
use tokio::sync::mpsc;

use crate::support::StubBackend;

fn agent_message(text: &str) -> serde_json::Value {
    json!({"type": "item.completed", "item": {"type": "agent_message", "text": text}})
}

fn tailor(stub: &StubBackend) -> ResumeTailor<CodexCli> {
    ResumeTailor::new(CodexCli::with_command(stub.command()))
}

#[tokio::test]
async fn structure_resume_parses_fenced_reply() {
    let reply = "Here is the parsed résumé:\n```json\n{\"contactInfo\": {\"name\": \"Ana Souza\", \"email\": \"ana@example.com\"}, \"skills\": [\"Rust\", \"SQL\"], \"experience\": [{\"title\": \"Engineer\", \"company\": \"Acme\", \"highlights\": [\"Cut latency 40%\"]}]}\n```";
    let stub = StubBackend::events(&[agent_message(reply)], 0);

    let resume = tailor(&stub).structure_resume("Ana Souza\nEngineer at Acme").await.unwrap();

    assert_eq!(resume.contact_info.name, "Ana Souza");
    assert_eq!(resume.skills, vec!["Rust", "SQL"]);
    assert_eq!(resume.experience[0].highlights, vec!["Cut latency 40%"]);

    let prompt = &stub.recorded_args()[2];
    assert!(prompt.starts_with(STRUCTURE_RESUME_PROMPT));
    assert!(prompt.ends_with("\n\nAna Souza\nEngineer at Acme"));
}

#[tokio::test]
async fn extract_job_reports_unparseable_reply() {
    let stub = StubBackend::events(&[agent_message("Sorry, I could not read that posting.")], 0);

    let err = tailor(&stub).extract_job("???").await.unwrap_err();

    assert!(matches!(err, AiError::Extraction(_)));
    assert_eq!(err.to_string(), "Could not extract valid JSON from AI response");
}

#[tokio::test]
async fn optimize_streams_progress_and_parses_result() {
    let first = "{\"overallScore\": 71, \"sectionScores\": [{\"section\": \"Skills\", \"score\": 60, ";
    let second = "\"suggestions\": [\"Lead with Kubernetes\"]}], \"keywordAnalysis\": [{\"keyword\": \"Kubernetes\", \"found\": false}], \"changesSummary\": [\"Reordered skills\"]}";
    let stub = StubBackend::events(&[agent_message(first), agent_message(second)], 0);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let job = JobRequirements {
        title: "Platform Engineer".to_string(),
        keywords: vec!["Kubernetes".to_string()],
        ..Default::default()
    };
    let result = tailor(&stub)
        .optimize(&StructuredResume::default(), &job, &tx)
        .await
        .unwrap();

    assert!((result.overall_score - 71.0).abs() < f64::EPSILON);
    assert_eq!(result.section_scores[0].suggestions, vec!["Lead with Kubernetes"]);
    assert!(!result.keyword_analysis[0].found);

    drop(tx);
    let mut received = Vec::new();
    while let Some(chunk) = rx.recv().await {
        received.push(chunk);
    }
    assert_eq!(
        received,
        vec![
            StreamChunk::Content {
                content: first.to_string()
            },
            StreamChunk::Content {
                content: second.to_string()
            },
            StreamChunk::Done,
        ]
    );

    let request: serde_json::Value =
        serde_json::from_str(stub.recorded_args()[2].rsplit("\n\n").next().unwrap()).unwrap();
    assert_eq!(request["jobRequirements"]["title"], "Platform Engineer");
    assert_eq!(request["jobRequirements"]["keywords"][0], "Kubernetes");
}

#[tokio::test]
async fn optimize_failure_sends_error_chunk() {
    let stub = StubBackend::new("", "session expired", 1);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let err = tailor(&stub)
        .optimize(&StructuredResume::default(), &JobRequirements::default(), &tx)
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Invocation { exit_code: 1, .. }));
    assert_eq!(
        rx.recv().await,
        Some(StreamChunk::Error {
            error: "Codex CLI failed (exit 1): session expired".to_string()
        })
    );
}
