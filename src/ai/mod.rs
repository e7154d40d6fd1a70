//! Text-completion client module.

mod client;

pub use client::*;
