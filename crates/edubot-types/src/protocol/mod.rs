//! Protocol definitions for the downstream LLM API.
//!
//! - OpenAI-compatible ChatCompletions (served by OpenRouter)

pub mod openai;

pub use openai::{ChatCompletionRequest, ChatCompletionResponse, OpenAIMessage, OpenAIRole};
