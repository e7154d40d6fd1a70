//! Prompt construction and completion post-processing.

use super::{ConversationContext, Phase};

/// Marker preceding the user's message in a completion request.
pub const USER_MARKER: &str = "User:";

/// Marker after which the model's answer begins.
pub const ASSISTANT_MARKER: &str = "Assistant:";

/// Base role description for every system prompt.
pub const BASE_SYSTEM_PROMPT: &str = "You are an expert SDLC (Software Development Life Cycle) assistant. \
You help software teams with requirements gathering, system design, development, testing, \
deployment, and maintenance. Give clear, practical, and actionable guidance.";

/// Build the system instruction for a turn.
///
/// Clauses are appended in a fixed order, each only when its data is present:
/// the base role, the focused phase, then the project context.
#[must_use]
pub fn build_system_prompt(phase: Option<Phase>, context: &ConversationContext) -> String {
    let mut prompt = String::from(BASE_SYSTEM_PROMPT);

    if let Some(phase) = phase {
        prompt.push_str(" The user is currently focusing on the ");
        prompt.push_str(phase.as_str());
        prompt.push_str(" phase.");
    }

    if !context.project_info.is_empty() {
        let pairs: Vec<String> = context
            .project_info
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        prompt.push_str(" Project context: {");
        prompt.push_str(&pairs.join(", "));
        prompt.push_str("}.");
    }

    prompt
}

/// Join the system prompt and user message into one completion request.
#[must_use]
pub fn build_completion_prompt(system_prompt: &str, message: &str) -> String {
    format!("{system_prompt}\n\n{USER_MARKER} {message}\n{ASSISTANT_MARKER}")
}

/// Keep only the text after the final assistant marker, trimmed.
///
/// Providers that return just the continuation have no marker; the whole
/// text is used then.
#[must_use]
pub fn extract_response(generated: &str) -> &str {
    generated
        .rfind(ASSISTANT_MARKER)
        .map_or(generated, |idx| &generated[idx + ASSISTANT_MARKER.len()..])
        .trim()
}

/// Truncate to at most `max_chars` characters, appending an ellipsis.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
