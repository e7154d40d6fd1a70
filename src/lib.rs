//! SDLC Assistant - phase-aware development chatbot with feedback analytics.

pub mod ai;
pub mod config;
pub mod conversation;
pub mod display;
pub mod feedback;
pub mod server;
