//! Council domain
//!
//! A council is the set of models queried in parallel for one user turn.
//! Each turn produces three stages:
//!
//! 1. **Responses**: every member answers independently ([`CouncilResponseSet`])
//! 2. **Rankings**: members rank each other's anonymized answers ([`RankingOutcome`])
//! 3. **Synthesis**: the chairman writes the final answer ([`Synthesis`])
//!
//! [`CouncilResponseSet`]: value_objects::CouncilResponseSet
//! [`RankingOutcome`]: stages::RankingOutcome
//! [`Synthesis`]: stages::Synthesis

pub mod ranking;
pub mod stages;
pub mod value_objects;
