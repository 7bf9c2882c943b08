//! SQLite-backed hash store.
//!
//! The store keeps two connections:
//!
//! * a **working copy** in memory, where every query and mutation runs;
//! * the **durable** file on disk, which only changes at [`HashStore::checkpoint`].
//!
//! On open the durable file is validated and loaded into memory with the
//! SQLite online backup API. A checkpoint runs the backup the other way in
//! a single step, so the durable file is replaced inside one SQLite write
//! transaction and an interrupted checkpoint leaves the previous durable
//! contents intact.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use rusqlite::backup::{Backup, StepResult};
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};

use super::filter::PathFilter;
use super::record::{format_timestamp, is_valid_digest, parse_timestamp, HashRecord};

/// Columns every durable store must carry.
const REQUIRED_COLUMNS: [&str; 8] = [
    "id",
    "filename",
    "sha256",
    "filesize",
    "creation_date",
    "modified_date",
    "timestamp",
    "session",
];

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS hashes(
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    filesize INTEGER,
    creation_date TEXT,
    modified_date TEXT,
    timestamp TEXT,
    session INTEGER
)";

/// Backup attempts while the destination is busy or locked.
const BACKUP_RETRIES: u32 = 50;
const BACKUP_RETRY_DELAY: Duration = Duration::from_millis(20);

const RECORD_COLUMNS: &str =
    "filename, sha256, filesize, creation_date, modified_date, timestamp, session";

/// Errors raised by the hash store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The durable file could not be opened or read as SQLite.
    #[error("Invalid store file {path}: {source}")]
    InvalidDatabase {
        /// Durable store path
        path: PathBuf,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// The durable file is SQLite but the `hashes` table has the wrong shape.
    #[error("Invalid store file {path}: {detail}")]
    InvalidSchema {
        /// Durable store path
        path: PathBuf,
        /// What was wrong
        detail: String,
    },

    /// Insert of a path that is already tracked.
    #[error("Path already tracked: {0}")]
    AlreadyExists(String),

    /// Update of a path that is not tracked.
    #[error("Path not tracked: {0}")]
    NotFound(String),

    /// Record carries a digest that is not 64 hex characters.
    #[error("Malformed digest for {path}: {digest:?}")]
    MalformedDigest {
        /// Record path
        path: String,
        /// Offending digest
        digest: String,
    },

    /// Any other SQLite failure.
    #[error("Store error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl StoreError {
    /// Whether this error means the durable file is not a usable store.
    #[must_use]
    pub fn is_invalid_database(&self) -> bool {
        matches!(self, Self::InvalidDatabase { .. } | Self::InvalidSchema { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record set with an in-memory working copy.
pub struct HashStore {
    working: Connection,
    durable: Connection,
    durable_path: PathBuf,
}

impl std::fmt::Debug for HashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashStore")
            .field("durable_path", &self.durable_path)
            .finish_non_exhaustive()
    }
}

impl HashStore {
    /// Open (or create) the durable store and load it into memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDatabase`] or [`StoreError::InvalidSchema`]
    /// when the file exists but is not a recognizable store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let invalid = |source: rusqlite::Error| StoreError::InvalidDatabase {
            path: path.to_path_buf(),
            source,
        };

        let durable = Connection::open(path).map_err(invalid)?;
        durable.execute_batch(SCHEMA).map_err(invalid)?;
        validate_columns(&durable, path)?;

        let page_size: i64 = durable
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .map_err(invalid)?;

        let mut working = Connection::open_in_memory()?;
        working.execute_batch(&format!("PRAGMA page_size = {page_size}"))?;
        copy_database(&durable, &mut working)?;
        working.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_hashes_filename ON hashes(filename)",
        )?;

        let store = Self {
            working,
            durable,
            durable_path: path.to_path_buf(),
        };
        log::debug!(
            "Opened store {} with {} records",
            path.display(),
            store.len()?
        );
        Ok(store)
    }

    /// Path of the durable backing file.
    #[must_use]
    pub fn durable_path(&self) -> &Path {
        &self.durable_path
    }

    /// All records matching `filter`, sorted by path.
    pub fn query(&self, filter: &PathFilter) -> StoreResult<Vec<HashRecord>> {
        let (predicate, args) = filter.sql();
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM hashes WHERE {predicate} ORDER BY filename"
        );
        let mut stmt = self.working.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), record_from_row)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug_assert!(records.iter().all(|r| filter.matches(&r.path)));
        Ok(records)
    }

    /// Paths of all records matching `filter`, sorted.
    pub fn query_paths(&self, filter: &PathFilter) -> StoreResult<Vec<String>> {
        let (predicate, args) = filter.sql();
        let sql = format!("SELECT filename FROM hashes WHERE {predicate} ORDER BY filename");
        let mut stmt = self.working.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| row.get(0))?;
        let paths = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        debug_assert!(paths.iter().all(|p| filter.matches(p)));
        Ok(paths)
    }

    /// Every stored path, sorted.
    pub fn all_paths(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .working
            .prepare("SELECT filename FROM hashes ORDER BY filename")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    /// Look up one record by exact path.
    pub fn get(&self, path: &str) -> StoreResult<Option<HashRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM hashes WHERE filename = ?1 LIMIT 1");
        Ok(self
            .working
            .query_row(&sql, params![path], record_from_row)
            .optional()?)
    }

    /// Whether a record exists for `path`.
    pub fn contains(&self, path: &str) -> StoreResult<bool> {
        Ok(self
            .working
            .query_row(
                "SELECT 1 FROM hashes WHERE filename = ?1 LIMIT 1",
                params![path],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    /// Number of records in the working copy.
    pub fn len(&self) -> StoreResult<usize> {
        let count: i64 = self
            .working
            .query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the working copy holds no records.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Add a record for an untracked path.
    pub fn insert(&self, record: &HashRecord) -> StoreResult<()> {
        check_digest(record)?;
        if self.contains(&record.path)? {
            return Err(StoreError::AlreadyExists(record.path.clone()));
        }
        self.working.execute(
            "INSERT INTO hashes (filename, sha256, filesize, creation_date, modified_date, timestamp, session)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.path,
                record.content_hash,
                size_to_sql(record.size_bytes),
                format_timestamp(&record.created_at),
                format_timestamp(&record.modified_at),
                format_timestamp(&record.observed_at.naive_utc()),
                record.session_id,
            ],
        )?;
        Ok(())
    }

    /// Rewrite every metadata column of a tracked path.
    pub fn update(&self, record: &HashRecord) -> StoreResult<()> {
        check_digest(record)?;
        let changed = self.working.execute(
            "UPDATE hashes SET sha256 = ?1, filesize = ?2, creation_date = ?3,
             modified_date = ?4, timestamp = ?5, session = ?6 WHERE filename = ?7",
            params![
                record.content_hash,
                size_to_sql(record.size_bytes),
                format_timestamp(&record.created_at),
                format_timestamp(&record.modified_at),
                format_timestamp(&record.observed_at.naive_utc()),
                record.session_id,
                record.path,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.path.clone()));
        }
        Ok(())
    }

    /// Remove the record for `path`. Returns whether anything was removed.
    pub fn delete(&self, path: &str) -> StoreResult<bool> {
        let removed = self
            .working
            .execute("DELETE FROM hashes WHERE filename = ?1", params![path])?;
        Ok(removed > 0)
    }

    /// Replace every occurrence of `from` with `to` in stored paths.
    ///
    /// Returns the number of rewritten records.
    pub fn rewrite_prefix(&self, from: &str, to: &str) -> StoreResult<usize> {
        Ok(self.working.execute(
            "UPDATE hashes SET filename = replace(filename, ?1, ?2) WHERE instr(filename, ?1) > 0",
            params![from, to],
        )?)
    }

    /// Records whose path is shared with another record.
    ///
    /// Always zero unless a translation mapped two paths onto one.
    pub fn duplicate_paths(&self) -> StoreResult<usize> {
        let count: i64 = self.working.query_row(
            "SELECT COUNT(*) - COUNT(DISTINCT filename) FROM hashes",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Replace every `from` separator with `to` across all stored paths.
    pub fn convert_separators(&self, from: char, to: char) -> StoreResult<usize> {
        Ok(self.working.execute(
            "UPDATE hashes SET filename = replace(filename, ?1, ?2) WHERE instr(filename, ?1) > 0",
            params![from.to_string(), to.to_string()],
        )?)
    }

    /// Mirror the working copy onto the durable file.
    ///
    /// Safe to call repeatedly. The copy is a single backup step, so the
    /// durable file holds either the old or the new contents, never a mix.
    pub fn checkpoint(&mut self) -> StoreResult<()> {
        let started = Instant::now();
        copy_database(&self.working, &mut self.durable)?;
        log::debug!(
            "Checkpointed {} in {:?}",
            self.durable_path.display(),
            started.elapsed()
        );
        Ok(())
    }

    /// Release both connections. Does not checkpoint.
    pub fn close(self) -> StoreResult<()> {
        self.working.close().map_err(|(_, e)| StoreError::Sql(e))?;
        self.durable.close().map_err(|(_, e)| StoreError::Sql(e))?;
        Ok(())
    }
}

/// Copy all of `from` onto `to` in one backup step.
fn copy_database(from: &Connection, to: &mut Connection) -> rusqlite::Result<()> {
    let backup = Backup::new(from, to)?;
    let mut retries = 0;
    loop {
        match backup.step(-1)? {
            StepResult::Done => return Ok(()),
            StepResult::Busy | StepResult::Locked if retries < BACKUP_RETRIES => {
                retries += 1;
                thread::sleep(BACKUP_RETRY_DELAY);
            }
            StepResult::Busy | StepResult::Locked => {
                return Err(rusqlite::Error::SqliteFailure(
                    ffi::Error::new(ffi::SQLITE_BUSY),
                    Some("store is busy".to_string()),
                ));
            }
            _ => {}
        }
    }
}

fn validate_columns(conn: &Connection, path: &Path) -> StoreResult<()> {
    let invalid = |source: rusqlite::Error| StoreError::InvalidDatabase {
        path: path.to_path_buf(),
        source,
    };
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('hashes')")
        .map_err(invalid)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(invalid)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(invalid)?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !columns.iter().any(|c| c.eq_ignore_ascii_case(required)))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::InvalidSchema {
            path: path.to_path_buf(),
            detail: format!("table `hashes` lacks columns: {}", missing.join(", ")),
        })
    }
}

fn check_digest(record: &HashRecord) -> StoreResult<()> {
    if is_valid_digest(&record.content_hash) {
        Ok(())
    } else {
        Err(StoreError::MalformedDigest {
            path: record.path.clone(),
            digest: record.content_hash.clone(),
        })
    }
}

fn size_to_sql(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<HashRecord> {
    let size: Option<i64> = row.get(2)?;
    let created: Option<String> = row.get(3)?;
    let modified: Option<String> = row.get(4)?;
    let observed: Option<String> = row.get(5)?;
    let session: Option<i64> = row.get(6)?;

    Ok(HashRecord {
        path: row.get(0)?,
        content_hash: row.get(1)?,
        size_bytes: size.and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
        created_at: parse_timestamp(created.as_deref()),
        modified_at: parse_timestamp(modified.as_deref()),
        observed_at: parse_timestamp(observed.as_deref()).and_utc(),
        session_id: session.unwrap_or(super::record::DEFAULT_SESSION),
    })
}
