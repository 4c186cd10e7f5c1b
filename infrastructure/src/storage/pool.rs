//! Bounded pool of SQLite connections
//!
//! Connections are opened lazily up to `size` and reused afterwards. A
//! [`PooledConnection`] holds one permit; dropping it puts the connection
//! back, whether the work succeeded, failed or was abandoned.

use council_application::StoreError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// How long a writer waits on SQLite's lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConnectionPool {
    path: PathBuf,
    size: usize,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

impl ConnectionPool {
    /// Create a pool for the database at `path`.
    ///
    /// The parent directory is created if needed and one connection is
    /// opened up front so a bad path fails here rather than on first use.
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<Arc<Self>, StoreError> {
        if size == 0 {
            return Err(StoreError::Pool("pool size must be at least 1".to_string()));
        }

        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let first = Self::connect(&path)?;
        debug!("Opened SQLite pool at {} (size {})", path.display(), size);

        Ok(Arc::new(Self {
            path,
            size,
            idle: Mutex::new(vec![first]),
            permits: Arc::new(Semaphore::new(size)),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of connections currently checked out
    pub fn in_use(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    /// Wait for a free slot.
    ///
    /// The connection itself is taken from the idle list (or opened) by
    /// [`PooledConnection::connection`], which is meant to run on a blocking
    /// thread.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledConnection, StoreError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let conn = self
            .idle
            .lock()
            .map_err(|e| StoreError::Pool(e.to_string()))?
            .pop();

        Ok(PooledConnection {
            conn,
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    fn connect(path: &Path) -> Result<Connection, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Database(format!("failed to open database: {}", e)))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )
        .map_err(|e| StoreError::Database(format!("failed to configure database: {}", e)))?;

        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(conn);
        }
    }
}

/// A checked-out connection slot
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// The underlying connection, opened on first use
    pub fn connection(&mut self) -> Result<&mut Connection, StoreError> {
        if self.conn.is_none() {
            self.conn = Some(ConnectionPool::connect(&self.pool.path)?);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Pool("connection unavailable".to_string()))
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pool(size: usize) -> (TempDir, Arc<ConnectionPool>) {
        let dir = TempDir::new().unwrap();
        let pool = ConnectionPool::open(dir.path().join("pool.db"), size).unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_acquire_is_bounded() {
        let (_dir, pool) = pool(2);

        let a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 2);

        let blocked = tokio::time::timeout(Duration::from_millis(100), pool.acquire()).await;
        assert!(blocked.is_err());

        drop(a);
        let c = tokio::time::timeout(Duration::from_secs(1), pool.acquire()).await;
        assert!(c.is_ok());
    }

    #[tokio::test]
    async fn test_connection_returns_to_pool() {
        let (_dir, pool) = pool(1);

        {
            let mut guard = pool.acquire().await.unwrap();
            guard
                .connection()
                .unwrap()
                .execute_batch("CREATE TABLE t (x INTEGER)")
                .unwrap();
        }
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle.lock().unwrap().len(), 1);

        let mut guard = pool.acquire().await.unwrap();
        let count: i64 = guard
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_on_new_connections() {
        let (_dir, pool) = pool(2);

        let _first = pool.acquire().await.unwrap();
        let mut second = pool.acquire().await.unwrap();
        let enabled: i64 = second
            .connection()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_zero_size_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ConnectionPool::open(dir.path().join("x.db"), 0),
            Err(StoreError::Pool(_))
        ));
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("db.sqlite");
        let pool = ConnectionPool::open(&path, 1).unwrap();
        assert!(path.exists());
        assert_eq!(pool.path(), path.as_path());
    }
}
