//! Résumé tailoring operations on top of an AI provider.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{
    extract_json, format_optimize_request, AiError, AiProvider, JobRequirements,
    OptimizationResult, Provider, StructuredResume, EXTRACT_JOB_PROMPT, OPTIMIZE_RESUME_PROMPT,
    STRUCTURE_RESUME_PROMPT,
};

/// Progress notification sent while an optimization streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamChunk {
    Content { content: String },
    Done,
    Error { error: String },
}

/// Runs the résumé operations against one provider.
#[derive(Debug, Clone)]
pub struct ResumeTailor<P = Provider> {
    provider: P,
}

impl<P: AiProvider> ResumeTailor<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Turn raw résumé text into structured data.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or no `StructuredResume`
    /// can be extracted from the response.
    pub async fn structure_resume(&self, raw_text: &str) -> Result<StructuredResume, AiError> {
        let response = self.provider.chat(STRUCTURE_RESUME_PROMPT, raw_text).await?;
        Ok(extract_json(&response)?)
    }

    /// Pull the requirements out of a job description.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or no `JobRequirements`
    /// can be extracted from the response.
    pub async fn extract_job(&self, description: &str) -> Result<JobRequirements, AiError> {
        let response = self.provider.chat(EXTRACT_JOB_PROMPT, description).await?;
        Ok(extract_json(&response)?)
    }

    /// Score and rewrite a résumé for a job, streaming progress to `sink`.
    ///
    /// Each response chunk is sent as `StreamChunk::Content`, followed by
    /// `StreamChunk::Done` once the agent finishes. If the stream fails,
    /// `StreamChunk::Error` is sent instead. A closed receiver is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be serialized, the provider
    /// call fails, or no `OptimizationResult` can be extracted.
    pub async fn optimize(
        &self,
        resume: &StructuredResume,
        job: &JobRequirements,
        sink: &mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<OptimizationResult, AiError> {
        let message = format_optimize_request(resume, job)?;

        let mut forward = |chunk: &str| {
            let _ = sink.send(StreamChunk::Content {
                content: chunk.to_string(),
            });
        };

        let response = match self
            .provider
            .chat_stream(OPTIMIZE_RESUME_PROMPT, &message, &mut forward)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let _ = sink.send(StreamChunk::Error {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let _ = sink.send(StreamChunk::Done);
        tracing::debug!(len = response.len(), "Optimization response received");
        Ok(extract_json(&response)?)
    }

    /// Check that the provider answers. Never fails.
    pub async fn test_connection(&self) -> bool {
        self.provider.test_connection().await
    }
}
