//! Prompt domain
//!
//! Templates for the ranking and synthesis stages of a council turn.

mod template;

pub use template::PromptTemplate;
