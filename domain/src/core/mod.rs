//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: opaque backend model identifier
//! - [`question::Question`]: a validated question to pose to the council
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
