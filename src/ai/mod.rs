//! AI backends and the résumé operations built on them.

mod claude;
mod codex;
mod extract;
mod invoke;
mod prompts;
mod provider;
mod setup;
mod tailor;
mod types;

pub use claude::{ClaudeCli, OutputFormat};
pub use codex::CodexCli;
pub use extract::{extract_json, ExtractError};
pub use prompts::{
    format_optimize_request, EXTRACT_JOB_PROMPT, OPTIMIZE_RESUME_PROMPT, STRUCTURE_RESUME_PROMPT,
};
pub use provider::*;
pub use setup::{AuthStatus, CliSetup, SetupOutcome};
pub use tailor::{ResumeTailor, StreamChunk};
pub use types::*;
