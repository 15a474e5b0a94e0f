//! Word autocomplete over a read-only SQLite index
//!
//! The index lives at `<dir>/<index_file>` and holds a table
//! `ecdict_wfd(word TEXT, ...)`. It is opened on the first non-empty query,
//! at most once per [`AutocompleteIndex`], and closed at shutdown.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use rusqlite::{params, Connection, OpenFlags};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::{Config, ConfigError};

/// Case-insensitive (ASCII) substring match, user input bound as a parameter
const SUGGEST_SQL: &str = "SELECT word FROM ecdict_wfd WHERE word LIKE ?1 ESCAPE '\\' LIMIT ?2";

/// Errors from the autocomplete index
#[derive(Error, Debug)]
pub enum AutocompleteError {
    #[error("Failed to open index {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Index query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Index is closed")]
    Closed,

    #[error("Index connection lock poisoned")]
    Poisoned,

    #[error("Index task failed: {0}")]
    Task(String),
}

type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Lazily opened, read-only word index
pub struct AutocompleteIndex {
    path: PathBuf,
    max_results: usize,
    conn: OnceCell<SharedConnection>,
    opened: AtomicUsize,
}

impl AutocompleteIndex {
    pub fn new(path: impl Into<PathBuf>, max_results: usize) -> Self {
        Self {
            path: path.into(),
            max_results,
            conn: OnceCell::new(),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.index_path()?,
            config.autocomplete.max_suggestions,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a connection is currently open.
    ///
    /// Never waits: a connection busy with a query counts as open.
    pub fn is_open(&self) -> bool {
        let Some(shared) = self.conn.get() else {
            return false;
        };
        match shared.try_lock() {
            Ok(guard) => guard.is_some(),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        }
    }

    /// Number of connections opened over the lifetime of this index (0 or 1)
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Words containing `term`, at most `max_results`, in index order.
    ///
    /// An empty term returns nothing without opening the index.
    pub async fn query(&self, term: &str) -> Result<Vec<String>, AutocompleteError> {
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection().await?.clone();
        let pattern = like_pattern(term);
        let limit = i64::try_from(self.max_results).unwrap_or(i64::MAX);

        tokio::task::spawn_blocking(move || -> Result<Vec<String>, AutocompleteError> {
            let guard = conn.lock().map_err(|_| AutocompleteError::Poisoned)?;
            let conn = guard.as_ref().ok_or(AutocompleteError::Closed)?;

            let mut stmt = conn.prepare_cached(SUGGEST_SQL)?;
            let words = stmt
                .query_map(params![pattern, limit], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(words)
        })
        .await
        .map_err(|e| AutocompleteError::Task(e.to_string()))?
    }

    /// Close the connection if one was opened. Returns whether one was closed.
    ///
    /// Waiting for an in-flight query happens on the blocking pool, so callers
    /// can bound this with a timeout; the close still completes afterwards.
    pub async fn close(&self) -> Result<bool, AutocompleteError> {
        let Some(shared) = self.conn.get().cloned() else {
            return Ok(false);
        };

        let closed = tokio::task::spawn_blocking(move || -> Result<bool, AutocompleteError> {
            let taken = shared
                .lock()
                .map_err(|_| AutocompleteError::Poisoned)?
                .take();
            match taken {
                Some(conn) => {
                    conn.close().map_err(|(_, e)| e)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
        .await
        .map_err(|e| AutocompleteError::Task(e.to_string()))??;

        if closed {
            tracing::info!(path = %self.path.display(), "Autocomplete index closed");
        }
        Ok(closed)
    }

    async fn connection(&self) -> Result<&SharedConnection, AutocompleteError> {
        self.conn
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let conn = tokio::task::spawn_blocking(move || {
                    Connection::open_with_flags(
                        &path,
                        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                    )
                    .map_err(|source| AutocompleteError::Open { path, source })
                })
                .await
                .map_err(|e| AutocompleteError::Task(e.to_string()))??;

                self.opened.fetch_add(1, Ordering::SeqCst);
                tracing::info!(path = %self.path.display(), "Autocomplete index opened");
                Ok::<_, AutocompleteError>(Arc::new(Mutex::new(Some(conn))))
            })
            .await
    }
}

/// `%term%` with LIKE wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
