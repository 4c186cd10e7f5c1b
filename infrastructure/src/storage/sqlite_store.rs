//! SQLite-backed [`ConversationStore`]
//!
//! Each operation checks a connection out of the [`ConnectionPool`] and runs
//! on the blocking thread pool.

use super::pool::ConnectionPool;
use super::schema;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use council_application::{ConversationStore, StoreError};
use council_domain::{Conversation, ConversationSummary, DEFAULT_TITLE, Message, Role};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// RFC 3339 with microseconds, so lexical order is time order
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(format!("invalid timestamp '{}': {}", raw, e)))
}

fn parse_stage(raw: Option<String>) -> Result<Option<Value>, StoreError> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(StoreError::from)
}

/// Durable conversation history in a single SQLite file
#[derive(Clone)]
pub struct SqliteConversationStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteConversationStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file with a pool of `pool_size`
    pub fn open(path: impl AsRef<Path>, pool_size: usize) -> Result<Self, StoreError> {
        Ok(Self::new(ConnectionPool::open(path, pool_size)?))
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Run `f` with a pooled connection on a blocking thread
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let mut guard = self.pool.acquire().await?;
        tokio::task::spawn_blocking(move || {
            let conn = guard.connection()?;
            f(conn)
        })
        .await
        .map_err(|e| StoreError::TaskJoin(e.to_string()))?
    }

    /// Insert one message at the next order key.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock before counting, so two writers
    /// on the same conversation can never read the same count.
    fn append_message(
        conn: &mut Connection,
        conversation_id: &str,
        role: Role,
        content: Option<&str>,
        stages: Option<[String; 3]>,
    ) -> Result<i64, StoreError> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM conversations WHERE id = ?1",
                params![conversation_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound(conversation_id.to_string()));
        }

        let order: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        let [stage1, stage2, stage3] = match stages {
            Some([a, b, c]) => [Some(a), Some(b), Some(c)],
            None => [None, None, None],
        };

        tx.execute(
            r#"
            INSERT INTO messages
                (conversation_id, role, content, stage1, stage2, stage3, created_at, message_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                conversation_id,
                role.as_str(),
                content,
                stage1,
                stage2,
                stage3,
                timestamp(Utc::now()),
                order,
            ],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        Ok(order)
    }

    fn load_conversation(
        conn: &Connection,
        id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = conn
            .query_row(
                "SELECT id, created_at, title FROM conversations WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((id, created_at, title)) = row else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                r#"
                SELECT role, content, stage1, stage2, stage3
                FROM messages
                WHERE conversation_id = ?1
                ORDER BY message_order ASC, id ASC
                "#,
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok(MessageRow {
                    role: row.get(0)?,
                    content: row.get(1)?,
                    stage1: row.get(2)?,
                    stage2: row.get(3)?,
                    stage3: row.get(4)?,
                })
            })
            .map_err(db_err)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(db_err)?.into_message()?);
        }

        Ok(Some(Conversation {
            id,
            created_at: parse_timestamp(&created_at)?,
            title,
            messages,
        }))
    }
}

struct MessageRow {
    role: String,
    content: Option<String>,
    stage1: Option<String>,
    stage2: Option<String>,
    stage3: Option<String>,
}

impl MessageRow {
    fn into_message(self) -> Result<Message, StoreError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: council_domain::DomainError| StoreError::Database(e.to_string()))?;

        Ok(match role {
            Role::User => Message::User {
                content: self.content.unwrap_or_default(),
            },
            Role::Assistant => Message::Assistant {
                stage1: parse_stage(self.stage1)?,
                stage2: parse_stage(self.stage2)?,
                stage3: parse_stage(self.stage3)?,
            },
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn init(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| schema::init(conn).map_err(db_err))
            .await?;
        debug!("Schema ready at {}", self.pool.path().display());
        Ok(())
    }

    async fn create_conversation(&self, id: &str) -> Result<Conversation, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let now = timestamp(Utc::now());
            conn.execute(
                r#"
                INSERT INTO conversations (id, created_at, title, updated_at)
                VALUES (?1, ?2, ?3, ?2)
                ON CONFLICT(id) DO NOTHING
                "#,
                params![id, now, DEFAULT_TITLE],
            )
            .map_err(db_err)?;

            let (created_at, title): (String, String) = conn
                .query_row(
                    "SELECT created_at, title FROM conversations WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(db_err)?;

            Ok(Conversation {
                id,
                created_at: parse_timestamp(&created_at)?,
                title,
                messages: Vec::new(),
            })
        })
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| Self::load_conversation(conn, &id))
            .await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT c.id, c.created_at, c.title, COUNT(m.id) AS message_count
                    FROM conversations c
                    LEFT JOIN messages m ON c.id = m.conversation_id
                    GROUP BY c.id, c.created_at, c.title
                    ORDER BY c.created_at DESC, c.rowid DESC
                    "#,
                )
                .map_err(db_err)?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(db_err)?;

            let mut summaries = Vec::new();
            for row in rows {
                let (id, created_at, title, count) = row.map_err(db_err)?;
                summaries.push(ConversationSummary {
                    id,
                    created_at: parse_timestamp(&created_at)?,
                    title,
                    message_count: usize::try_from(count).unwrap_or(0),
                });
            }
            Ok(summaries)
        })
        .await
    }

    async fn add_user_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let conversation_id = conversation_id.to_string();
        let content = content.to_string();
        let order = self
            .with_conn(move |conn| {
                Self::append_message(conn, &conversation_id, Role::User, Some(&content), None)
            })
            .await?;
        debug!("Stored user message at position {}", order);
        Ok(())
    }

    async fn add_assistant_message(
        &self,
        conversation_id: &str,
        stage1: &Value,
        stage2: &Value,
        stage3: &Value,
    ) -> Result<(), StoreError> {
        let conversation_id = conversation_id.to_string();
        let stages = [
            serde_json::to_string(stage1)?,
            serde_json::to_string(stage2)?,
            serde_json::to_string(stage3)?,
        ];
        let order = self
            .with_conn(move |conn| {
                Self::append_message(conn, &conversation_id, Role::Assistant, None, Some(stages))
            })
            .await?;
        debug!("Stored assistant message at position {}", order);
        Ok(())
    }

    async fn update_conversation_title(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StoreError> {
        let conversation_id = conversation_id.to_string();
        let title = title.to_string();
        self.with_conn(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE conversations SET title = ?1, updated_at = ?2 WHERE id = ?3",
                    params![title, timestamp(Utc::now()), conversation_id],
                )
                .map_err(db_err)?;
            if updated == 0 {
                return Err(StoreError::NotFound(conversation_id));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteConversationStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteConversationStore::open(dir.path().join("council.db"), 4).unwrap();
        store.init().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let (_dir, store) = store().await;

        let first = store.create_conversation("c1").await.unwrap();
        let second = store.create_conversation("c1").await.unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.title, DEFAULT_TITLE);
        assert!(second.messages.is_empty());
        assert_eq!(store.list_conversations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_round_trip_in_order() {
        let (_dir, store) = store().await;
        store.create_conversation("c1").await.unwrap();

        let stage1 = json!([{ "model": "a", "status": "success", "content": "hi" }]);
        let stage2 = json!({ "rankings": [] });
        let stage3 = json!({ "model": "chair", "status": "success", "content": "final" });

        store.add_user_message("c1", "first").await.unwrap();
        store
            .add_assistant_message("c1", &stage1, &stage2, &stage3)
            .await
            .unwrap();
        store.add_user_message("c1", "second").await.unwrap();

        let conv = store.get_conversation("c1").await.unwrap().unwrap();
        assert_eq!(
            conv.messages,
            vec![
                Message::user("first"),
                Message::assistant(stage1, stage2, stage3),
                Message::user("second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_newest_first_with_counts() {
        let (_dir, store) = store().await;
        store.create_conversation("old").await.unwrap();
        store.create_conversation("new").await.unwrap();
        store.add_user_message("old", "q").await.unwrap();
        store
            .add_assistant_message("old", &json!([]), &json!({}), &json!({}))
            .await
            .unwrap();

        let list = store.list_conversations().await.unwrap();
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(list[0].message_count, 0);
        assert_eq!(list[1].message_count, 2);
    }

    #[tokio::test]
    async fn test_missing_conversation() {
        let (_dir, store) = store().await;

        assert!(store.get_conversation("does-not-exist").await.unwrap().is_none());
        assert!(matches!(
            store.update_conversation_title("does-not-exist", "t").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.add_user_message("does-not-exist", "hello").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let (_dir, store) = store().await;
        store.create_conversation("c1").await.unwrap();
        store.update_conversation_title("c1", "Renamed").await.unwrap();

        let conv = store.get_conversation("c1").await.unwrap().unwrap();
        assert_eq!(conv.title, "Renamed");
        assert!(!conv.has_default_title());
    }

    #[tokio::test]
    async fn test_init_twice() {
        let (_dir, store) = store().await;
        store.create_conversation("c1").await.unwrap();
        store.init().await.unwrap();
        assert!(store.get_conversation("c1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_null_stages_read_as_none() {
        let (_dir, store) = store().await;
        store.create_conversation("c1").await.unwrap();

        let mut guard = store.pool().acquire().await.unwrap();
        guard
            .connection()
            .unwrap()
            .execute(
                r#"INSERT INTO messages (conversation_id, role, stage1, created_at, message_order)
                   VALUES ('c1', 'assistant', '[1]', '2024-01-01T00:00:00.000000Z', 0)"#,
                [],
            )
            .unwrap();
        drop(guard);

        let conv = store.get_conversation("c1").await.unwrap().unwrap();
        assert_eq!(
            conv.messages,
            vec![Message::Assistant {
                stage1: Some(json!([1])),
                stage2: None,
                stage3: None,
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_distinct_order_keys() {
        let (_dir, store) = store().await;
        store.create_conversation("c1").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_user_message("c1", &format!("m{}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut guard = store.pool().acquire().await.unwrap();
        let conn = guard.connection().unwrap();
        let (total, distinct): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT message_order) FROM messages WHERE conversation_id = 'c1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(total, 16);
        assert_eq!(distinct, 16);
    }
}
