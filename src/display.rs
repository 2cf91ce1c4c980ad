//! Colored terminal output for the `resume-tailor` binary.
//!
//! Status lines go to stderr so stdout carries only the JSON results.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::ai::{AuthStatus, OptimizationResult, SetupOutcome};

/// Truncate to at most `max_chars` characters, ending in "..." if cut.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

/// Color for a 0-100 score.
fn score_label(score: f64) -> String {
    let text = format!("{score:.0}");
    if score >= 75.0 {
        text.green().bold().to_string()
    } else if score >= 50.0 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

/// Print one streamed chunk as it arrives.
pub fn print_chunk(text: &str) {
    eprint!("{}", text.dimmed());
    let _ = io::stderr().flush();
}

/// Print raw installer output.
pub fn print_progress(text: &str) {
    eprint!("{text}");
    let _ = io::stderr().flush();
}

/// Print a connection probe result.
pub fn print_connection_test(provider: &str, success: bool) {
    let status = if success {
        "connected".green().to_string()
    } else {
        "failed".red().to_string()
    };
    eprintln!("{} {} - {}", "[AI]".magenta().bold(), provider.cyan(), status);
}

/// Print whether the backend binary is on PATH.
pub fn print_install_status(program: &str, installed: bool) {
    if installed {
        eprintln!("{} {} found on PATH", "[SETUP]".blue().bold(), program.cyan());
    } else {
        eprintln!(
            "{} {} {}",
            "[SETUP]".blue().bold(),
            program.cyan(),
            "not installed".yellow()
        );
    }
}

/// Print the outcome of an install or login.
pub fn print_setup_outcome(outcome: &SetupOutcome) {
    if outcome.success {
        eprintln!("{} {}", "[OK]".green().bold(), outcome.message);
    } else {
        eprintln!("{} {}", "[FAILED]".red().bold(), outcome.message);
    }
}

pub fn print_auth_status(status: AuthStatus) {
    if status.authenticated {
        eprintln!("{} {}", "[AUTH]".blue().bold(), "logged in".green());
    } else {
        eprintln!("{} {}", "[AUTH]".blue().bold(), "not logged in".yellow());
    }
}

/// Print the score summary of an optimization.
pub fn print_optimization_summary(result: &OptimizationResult) {
    eprintln!();
    eprintln!("{} overall {}", "[SCORE]".magenta().bold(), score_label(result.overall_score));

    for section in &result.section_scores {
        eprintln!("  {:<16} {}", section.section, score_label(section.score));
        for suggestion in &section.suggestions {
            eprintln!("    {} {}", "-".dimmed(), truncate(suggestion, 120));
        }
    }

    let missing: Vec<&str> = result
        .keyword_analysis
        .iter()
        .filter(|k| !k.found)
        .map(|k| k.keyword.as_str())
        .collect();
    if !missing.is_empty() {
        eprintln!("{} {}", "[MISSING]".yellow().bold(), missing.join(", "));
    }
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
