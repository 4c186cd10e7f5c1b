//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileConfig, FileCouncilConfig,
    FileOutputConfig, FileStorageConfig,
};
pub use providers::{ChatCompletionsGateway, DEFAULT_API_URL};
pub use storage::{ConnectionPool, PooledConnection, SqliteConversationStore};
