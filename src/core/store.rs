//! Purpose: SQLite-backed storage backend and its session handle.
//! Exports: `StoreLocation`, `StoreConfig`, `SqliteStore`, `StoreSession`.
//! Role: One independent store per backend, each with its own connection and
//! transaction scope; sessions stage writes and apply them in one transaction.
//! Invariants: A store only ever creates tables for the record types it owns.
//! Invariants: `commit` applies the whole stage buffer or none of it (per store).
use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags, params};

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Order, Record, RecordType, User};
use crate::core::registry::BackendId;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreLocation {
    /// SQLite database file on disk.
    Path(PathBuf),
    /// Named shared-cache in-memory database. All connections opened under the
    /// same name see one database for as long as any connection stays open.
    Memory(String),
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendId,
    pub location: StoreLocation,
}

impl StoreConfig {
    pub fn file(backend: BackendId, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            location: StoreLocation::Path(path.into()),
        }
    }

    pub fn memory(backend: BackendId, name: impl Into<String>) -> Self {
        Self {
            backend,
            location: StoreLocation::Memory(name.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    config: StoreConfig,
    owned: Vec<RecordType>,
}

impl SqliteStore {
    pub fn new(config: StoreConfig, owned: Vec<RecordType>) -> Self {
        Self { config, owned }
    }

    pub fn backend(&self) -> BackendId {
        self.config.backend
    }

    pub fn owned_types(&self) -> &[RecordType] {
        &self.owned
    }

    pub fn location(&self) -> &StoreLocation {
        &self.config.location
    }

    /// Create the tables for this store's owned record types if absent.
    pub fn ensure_schema(&self) -> Result<(), Error> {
        let conn = self.connect()?;
        for record_type in &self.owned {
            conn.execute_batch(create_table_sql(*record_type))
                .map_err(|err| self.storage_error("failed to create schema", err))?;
        }
        Ok(())
    }

    pub fn open_session(&self) -> Result<StoreSession, Error> {
        let conn = self.connect()?;
        Ok(StoreSession {
            backend: self.config.backend,
            conn,
            staged: Vec::new(),
        })
    }

    pub(crate) fn connect(&self) -> Result<Connection, Error> {
        match &self.config.location {
            StoreLocation::Path(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|err| {
                            Error::new(ErrorKind::Io)
                                .with_message("failed to create store directory")
                                .with_backend(self.config.backend)
                                .with_source(err)
                        })?;
                    }
                }
                let conn = Connection::open(path)
                    .map_err(|err| self.storage_error("failed to open store", err))?;
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(|err| self.storage_error("failed to set journal mode", err))?;
                Ok(conn)
            }
            StoreLocation::Memory(name) => {
                let uri = format!("file:{name}?mode=memory&cache=shared");
                let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX;
                Connection::open_with_flags(uri, flags)
                    .map_err(|err| self.storage_error("failed to open in-memory store", err))
            }
        }
    }

    fn storage_error(&self, message: &str, err: rusqlite::Error) -> Error {
        Error::new(ErrorKind::Storage)
            .with_message(message)
            .with_backend(self.config.backend)
            .with_source(err)
    }
}

/// One backend's session handle: a connection plus a buffer of staged records.
/// Staged records only become durable when `commit` applies them inside a
/// single transaction on this store.
#[derive(Debug)]
pub struct StoreSession {
    backend: BackendId,
    conn: Connection,
    staged: Vec<Record>,
}

impl StoreSession {
    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn stage(&mut self, record: Record) {
        self.staged.push(record);
    }

    pub fn fetch_all(&self, record_type: RecordType) -> Result<Vec<Record>, Error> {
        let sql = select_all_sql(record_type);
        let mut stmt = self.conn.prepare(sql).map_err(|err| {
            Error::new(ErrorKind::Storage)
                .with_message("failed to prepare query")
                .with_backend(self.backend)
                .with_record_type(record_type)
                .with_source(err)
        })?;

        let rows = stmt
            .query_map([], |row| match record_type {
                RecordType::User => Ok(Record::User(User {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    email: row.get(2)?,
                })),
                RecordType::Order => Ok(Record::Order(Order {
                    id: Some(row.get(0)?),
                    item: row.get(1)?,
                    quantity: row.get(2)?,
                })),
            })
            .map_err(|err| {
                Error::new(ErrorKind::Storage)
                    .with_message("failed to run query")
                    .with_backend(self.backend)
                    .with_record_type(record_type)
                    .with_source(err)
            })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|err| {
                Error::new(ErrorKind::Storage)
                    .with_message("failed to read row")
                    .with_backend(self.backend)
                    .with_record_type(record_type)
                    .with_source(err)
            })?);
        }
        Ok(records)
    }

    /// Apply the stage buffer inside one transaction. Empty buffer: no-op.
    /// On failure the transaction rolls back and the buffer is dropped; the
    /// store is left as it was before the call.
    pub fn commit(&mut self) -> Result<(), Error> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let staged = std::mem::take(&mut self.staged);
        let backend = self.backend;
        let result = (|| -> Result<(), rusqlite::Error> {
            let tx = self.conn.transaction()?;
            for record in &staged {
                match record {
                    Record::User(user) => {
                        tx.execute(
                            "INSERT INTO users (name, email) VALUES (?1, ?2)",
                            params![user.name, user.email],
                        )?;
                    }
                    Record::Order(order) => {
                        tx.execute(
                            "INSERT INTO orders (item, quantity) VALUES (?1, ?2)",
                            params![order.item, order.quantity],
                        )?;
                    }
                }
            }
            tx.commit()
        })();

        result.map_err(|err| {
            Error::new(ErrorKind::CommitFailed)
                .with_message("store rejected staged writes")
                .with_backend(backend)
                .with_source(err)
        })
    }

    pub fn close(self) {
        // Dropping the connection releases the handle.
    }
}

fn create_table_sql(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::User => {
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users (email);"
        }
        RecordType::Order => {
            "CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                item TEXT NOT NULL,
                quantity INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_item ON orders (item);"
        }
    }
}

fn select_all_sql(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::User => "SELECT id, name, email FROM users ORDER BY id",
        RecordType::Order => "SELECT id, item, quantity FROM orders ORDER BY id",
    }
}
