//! Colored status lines for the CLI.
//!
//! Log payload owns stdout, so everything here goes to stderr.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::logstream::SessionOutcome;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Short description of how a session ended.
#[must_use]
pub fn describe_outcome(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::EndMarker => "log complete".to_string(),
        SessionOutcome::Completed => "job finished".to_string(),
        SessionOutcome::ConsumerGone => "reader closed".to_string(),
        SessionOutcome::Failed(e) => format!("failed: {e}"),
    }
}

/// Print the log being streamed.
pub fn print_session_start(target: &str) {
    eprintln!(
        "{} {} streaming {}",
        timestamp().dimmed(),
        "[LOG]".blue().bold(),
        truncate(target, 120).cyan()
    );
    let _ = io::stderr().flush();
}

/// Print how the session ended.
pub fn print_session_end(outcome: &SessionOutcome) {
    let label = if matches!(outcome, SessionOutcome::Failed(_)) {
        "[LOG]".red().bold().to_string()
    } else {
        "[LOG]".green().bold().to_string()
    };
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        label,
        describe_outcome(outcome)
    );
    let _ = io::stderr().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
