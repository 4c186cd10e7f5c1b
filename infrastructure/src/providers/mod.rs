//! Model backend adapters implementing [`LlmGateway`](council_application::LlmGateway)

pub mod chat_completions;

pub use chat_completions::{ChatCompletionsGateway, DEFAULT_API_URL};
