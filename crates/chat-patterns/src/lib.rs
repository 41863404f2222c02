//! chat-patterns - Single-turn, templated, multi-turn and structured-output
//! interactions with hosted chat-completion providers.

pub mod analysis;
pub mod config;
pub mod conversation;
pub mod demo;
pub mod llm;
pub mod template;
