//! Progress display for council turns

pub mod reporter;
