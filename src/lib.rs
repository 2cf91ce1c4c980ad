//! Resume Tailor - résumé structuring and optimization through AI command-line agents.

pub mod ai;
pub mod cli;
pub mod config;
pub mod display;
