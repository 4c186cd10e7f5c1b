//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod check_backends;
pub mod query_council;
pub mod rank_responses;
pub mod run_council;
pub mod synthesize_answer;
