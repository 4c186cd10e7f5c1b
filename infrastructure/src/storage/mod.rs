//! SQLite persistence for conversations

mod pool;
mod schema;
mod sqlite_store;

pub use pool::{ConnectionPool, PooledConnection};
pub use sqlite_store::SqliteConversationStore;
