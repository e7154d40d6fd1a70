//! Integration tests for the conversation engine.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sdlc_assistant::ai::{AiError, CompletionService};
use sdlc_assistant::config::GenerationParams;
use sdlc_assistant::conversation::{
    ChatSession, ConversationEngine, Phase, APOLOGY_MESSAGE, ASSISTANT_MARKER, MAX_HISTORY,
    SUGGESTION_MARKER,
};

/// Echoes the prompt back followed by a fixed reply, like a raw text model.
struct EchoModel {
    reply: String,
    calls: Mutex<Vec<String>>,
}

impl EchoModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for EchoModel {
    async fn complete(&self, prompt: &str, _: &GenerationParams) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        Ok(format!("{prompt} {}", self.reply))
    }
}

struct BrokenModel;

#[async_trait]
impl CompletionService for BrokenModel {
    async fn complete(&self, _: &str, _: &GenerationParams) -> Result<String, AiError> {
        Err(AiError::RequestFailed("HTTP 503".to_string()))
    }
}

const LONG_REPLY: &str = "Start by listing the behaviours you need, then write one focused unit test per behaviour and grow coverage from there.";

#[tokio::test]
async fn test_full_conversation_flow() {
    let model = EchoModel::new(LONG_REPLY);
    let engine = ConversationEngine::new(model.clone(), GenerationParams::default());
    let mut session = ChatSession::new();
    session.context.set_project_info("language", "Rust");

    let update = engine
        .submit(&mut session, "  How do I improve test coverage?  ")
        .await;

    assert!(update.input.is_empty());
    assert_eq!(update.response.as_deref(), Some(LONG_REPLY));
    assert_eq!(update.history.len(), 1);
    assert_eq!(update.history[0].user_message, "How do I improve test coverage?");
    assert_eq!(session.context.current_phase, Some(Phase::Testing));

    let prompt = &model.calls()[0];
    assert!(prompt.contains("testing phase"));
    assert!(prompt.contains("language: Rust"));
    assert!(prompt.trim_end().ends_with(ASSISTANT_MARKER));
}

#[tokio::test]
async fn test_phase_is_sticky_across_turns() {
    let engine = ConversationEngine::new(EchoModel::new(LONG_REPLY), GenerationParams::default());
    let mut session = ChatSession::new();

    engine.submit(&mut session, "Let's deploy with docker").await;
    engine.submit(&mut session, "thanks, anything else?").await;

    assert_eq!(session.context.current_phase, Some(Phase::Deployment));
    let history = session.export_history();
    assert_eq!(history[1].context.current_phase, Some(Phase::Deployment));
}

#[tokio::test]
async fn test_short_reply_gets_suggestion() {
    let engine = ConversationEngine::new(EchoModel::new("Use UML."), GenerationParams::default());
    let mut session = ChatSession::new();

    let reply = engine
        .respond(&mut session, "Which diagram fits the architecture?")
        .await;

    assert!(reply.starts_with("Use UML."));
    assert!(reply.contains(SUGGESTION_MARKER));
}

#[tokio::test]
async fn test_failing_model_yields_apology() {
    let engine = ConversationEngine::new(Arc::new(BrokenModel), GenerationParams::default());
    let mut session = ChatSession::new();

    let update = engine.submit(&mut session, "implement a parser").await;

    assert_eq!(update.response.as_deref(), Some(APOLOGY_MESSAGE));
    assert_eq!(update.history.len(), 1);
    assert_eq!(update.history[0].ai_response, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn test_history_is_bounded() {
    let engine = ConversationEngine::new(EchoModel::new(LONG_REPLY), GenerationParams::default());
    let mut session = ChatSession::new();

    for i in 1..=MAX_HISTORY + 1 {
        engine.submit(&mut session, &format!("message {i}")).await;
    }

    let history = session.export_history();
    assert_eq!(history.len(), MAX_HISTORY);
    assert_eq!(history[0].user_message, "message 2");
    assert_eq!(
        history[MAX_HISTORY - 1].user_message,
        format!("message {}", MAX_HISTORY + 1)
    );
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let engine = ConversationEngine::new(EchoModel::new(LONG_REPLY), GenerationParams::default());
    let mut first = ChatSession::new();
    let mut second = ChatSession::new();

    engine.submit(&mut first, "write the requirements").await;
    engine.submit(&mut second, "monitor production").await;

    assert_eq!(first.context.current_phase, Some(Phase::Requirements));
    assert_eq!(second.context.current_phase, Some(Phase::Deployment));
    assert_eq!(first.history.len(), 1);
    assert_eq!(second.history.len(), 1);
}

#[tokio::test]
async fn test_clear_then_blank_submit() {
    let model = EchoModel::new(LONG_REPLY);
    let engine = ConversationEngine::new(model.clone(), GenerationParams::default());
    let mut session = ChatSession::new();

    engine.submit(&mut session, "design the interface").await;
    session.clear();
    let update = engine.submit(&mut session, "   ").await;

    assert!(update.history.is_empty());
    assert!(update.response.is_none());
    assert!(session.context.current_phase.is_none());
    assert_eq!(model.calls().len(), 1);
}

#[test]
fn test_history_export_is_json() {
    let engine = ConversationEngine::new(EchoModel::new(LONG_REPLY), GenerationParams::default());
    let mut session = ChatSession::new();
    tokio_test::block_on(engine.submit(&mut session, "refactor this function"));

    let json = serde_json::to_value(session.export_history()).unwrap();
    let turn = &json[0];
    assert_eq!(turn["user_message"], "refactor this function");
    assert_eq!(turn["context"]["current_phase"], "development");
    assert!(turn["timestamp"].is_string());
}
