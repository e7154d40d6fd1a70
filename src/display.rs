//! Colored terminal output for the chat REPL and feedback commands.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::conversation::{truncate_chars, Phase};
use crate::feedback::{FeedbackRecord, FeedbackType, ModuleAnalytics};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Render a 1-5 rating as filled and empty stars.
#[must_use]
pub fn format_rating(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Print the chat banner.
pub fn print_banner(provider: &str, model: &str) {
    println!(
        "{} {} {} ({})",
        timestamp().dimmed(),
        "[SDLC]".blue().bold(),
        provider.cyan(),
        model.dimmed()
    );
    println!(
        "{}",
        "Commands: /phase <name>, /clear, /export [path], /quit".dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the input prompt without a newline.
pub fn print_prompt() {
    print!("{} ", "you>".green().bold());
    let _ = io::stdout().flush();
}

/// Print an assistant reply, tagged with the session's phase when known.
pub fn print_reply(reply: &str, phase: Option<Phase>) {
    let tag = phase.map_or_else(|| "[ASSISTANT]".to_string(), |p| format!("[{}]", p.title()));
    println!("{} {}", tag.magenta().bold(), reply);
    let _ = io::stdout().flush();
}

/// Print a phase suggestion list.
pub fn print_suggestions(text: &str) {
    println!("{}", text.cyan());
    let _ = io::stdout().flush();
}

/// Print an informational line.
pub fn print_info(message: &str) {
    println!("{} {}", "[INFO]".blue().bold(), message);
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Print one stored feedback record.
pub fn print_feedback_record(record: &FeedbackRecord) {
    let kind = match record.feedback_type {
        FeedbackType::Positive => record.feedback_type.as_str().green().to_string(),
        FeedbackType::Negative => record.feedback_type.as_str().red().to_string(),
        FeedbackType::Suggestion => record.feedback_type.as_str().yellow().to_string(),
    };
    println!(
        "{} {} {} {} {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S").dimmed(),
        format_rating(record.rating).yellow(),
        kind,
        record.user_id.cyan(),
        truncate_chars(&record.comment, 80)
    );
    if let Some(suggestion) = &record.improvement_suggestion {
        println!("    {} {}", "suggestion:".dimmed(), truncate_chars(suggestion, 100));
    }
}

/// Print a module analytics summary.
pub fn print_analytics(analytics: &ModuleAnalytics) {
    println!(
        "{} avg {:.2} over {} ({} {} / {} {} / {} {})",
        analytics.module_name.bold(),
        analytics.avg_rating,
        analytics.total_feedback,
        analytics.positive_count,
        "positive".green(),
        analytics.negative_count,
        "negative".red(),
        analytics.suggestion_count,
        "suggestion".yellow()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(1), "★☆☆☆☆");
        assert_eq!(format_rating(5), "★★★★★");
        assert_eq!(format_rating(9), "★★★★★");
    }
}
