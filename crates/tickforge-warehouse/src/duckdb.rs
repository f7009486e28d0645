//! `DuckDB` connection pooling.
//!
//! Every connection is cloned from one database instance per file, so
//! connections handed out by a pool see each other's commits. Released
//! connections go back to an idle list per [`AccessMode`].

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ::duckdb::Connection;

/// Whether a connection may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    const fn slot(self) -> usize {
        match self {
            Self::ReadOnly => 0,
            Self::ReadWrite => 1,
        }
    }
}

struct Shared {
    db_path: PathBuf,
    max_idle: usize,
    root: Mutex<Option<Connection>>,
    idle: Mutex<[Vec<Connection>; 2]>,
}

impl Shared {
    fn idle(&self) -> MutexGuard<'_, [Vec<Connection>; 2]> {
        // a panic while holding the lock cannot leave a half-updated Vec
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open(&self) -> Result<Connection, ::duckdb::Error> {
        let mut root = self
            .root
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let connection = match root.as_ref() {
            Some(root) => root.try_clone()?,
            None => {
                let opened = Connection::open(&self.db_path)?;
                let connection = opened.try_clone()?;
                *root = Some(opened);
                connection
            }
        };
        connection.execute_batch("PRAGMA disable_progress_bar;")?;
        Ok(connection)
    }
}

/// Pool of connections to a single database file.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

impl ConnectionPool {
    /// Create a pool keeping at most `max_idle` idle connections per mode.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_idle: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                db_path: path.into(),
                max_idle: max_idle.max(1),
                root: Mutex::new(None),
                idle: Mutex::new([Vec::new(), Vec::new()]),
            }),
        }
    }

    /// Take an idle connection or open a new one.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened.
    pub fn acquire(&self, mode: AccessMode) -> Result<PooledConnection, ::duckdb::Error> {
        let reused = self.shared.idle()[mode.slot()].pop();
        let connection = match reused {
            Some(connection) => connection,
            None => self.shared.open()?,
        };

        Ok(PooledConnection {
            mode,
            shared: Arc::clone(&self.shared),
            connection: Some(connection),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.shared.db_path
    }
}

/// A connection that returns to its pool when dropped.
pub struct PooledConnection {
    mode: AccessMode,
    shared: Arc<Shared>,
    connection: Option<Connection>,
}

impl PooledConnection {
    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("connection is only taken in drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let mut idle = self.shared.idle();
        let slot = &mut idle[self.mode.slot()];
        if slot.len() < self.shared.max_idle {
            slot.push(connection);
        }
    }
}
