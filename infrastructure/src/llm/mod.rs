//! LLM gateway adapters

mod openai;

pub use openai::{OpenAiConfig, OpenAiGateway};
