// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` wraps one `tokio_rusqlite::Connection`, every query
//! module accepts `&Database` and calls through `connection().call()`.
//! Do NOT create additional Connection instances for writes; the single
//! writer is what eliminates SQLITE_BUSY under concurrent access.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use dunner_core::DunnerError;

use crate::migrations;

/// Handle to the Dunner SQLite database.
///
/// Opening runs all pending migrations. Cloning the inner connection is
/// cheap; all clones share the single background writer thread.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// Parent directories are created. WAL mode, foreign keys, and a busy
    /// timeout are configured before migrations run.
    pub async fn open(path: &str) -> Result<Self, DunnerError> {
        Self::open_with_journal(path, true).await
    }

    /// Open with an explicit journal mode (`wal = false` keeps rollback
    /// journaling, for network filesystems where WAL is unsafe).
    pub async fn open_with_journal(path: &str, wal: bool) -> Result<Self, DunnerError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DunnerError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let connection = Connection::open(path)
            .await
            .map_err(|e| DunnerError::Storage {
                source: Box::new(e),
            })?;

        connection
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch(
                    "PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        connection
            .call(|conn| {
                migrations::run_migrations(conn)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            })
            .await
            .map_err(map_tr_err)?;

        debug!(path, "database opened, migrations applied");
        Ok(Self { connection })
    }

    /// Access the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), DunnerError> {
        self.connection
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> DunnerError {
    DunnerError::Storage {
        source: Box::new(err),
    }
}
