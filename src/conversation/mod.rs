//! Conversation engine: phase detection, prompting, and rolling history.

mod context;
mod engine;
mod history;
mod phase;
mod prompt;

pub use context::ConversationContext;
pub use engine::{
    ChatSession, ChatUpdate, ConversationEngine, APOLOGY_MESSAGE, SHORT_RESPONSE_CHARS,
    SUGGESTION_MARKER,
};
pub use history::{ConversationHistory, ConversationTurn, HistoryExportError, MAX_HISTORY};
pub use phase::{Phase, PhaseCatalog, PhaseInfo, UnknownPhase};
pub use prompt::{
    build_completion_prompt, build_system_prompt, extract_response, truncate_chars,
    ASSISTANT_MARKER, BASE_SYSTEM_PROMPT, USER_MARKER,
};
