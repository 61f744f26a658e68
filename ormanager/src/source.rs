use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::Result;

/// Where an operation gets its connection from
///
/// The connection is released when the returned [`Pooled`] guard is dropped.
pub trait ConnectionSource: Send + Sync {
    fn acquire(&self) -> Result<Pooled<'_>>;
}

pub enum Pooled<'a> {
    Shared(MutexGuard<'a, Connection>),
    Owned(Connection),
}

impl Deref for Pooled<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Pooled::Shared(guard) => &**guard,
            Pooled::Owned(conn) => conn,
        }
    }
}

/// A single connection, handed out to one operation at a time
pub struct SharedConnection(Mutex<Connection>);

impl SharedConnection {
    pub fn open<T: AsRef<Path>>(path: T) -> Result<Self> {
        Ok(Connection::open(path)?.into())
    }

    pub fn memory() -> Result<Self> {
        Ok(Connection::open_in_memory()?.into())
    }
}

impl From<Connection> for SharedConnection {
    fn from(connection: Connection) -> Self {
        SharedConnection(Mutex::new(connection))
    }
}

impl ConnectionSource for SharedConnection {
    fn acquire(&self) -> Result<Pooled<'_>> {
        let guard = self.0.lock().unwrap_or_else(|poisoned| {
            log::warn!("Recovering connection after a panicked operation");
            PoisonError::into_inner(poisoned)
        });
        Ok(Pooled::Shared(guard))
    }
}

/// Opens the database file anew for every operation
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<T: Into<PathBuf>>(path: T) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionSource for FileSource {
    fn acquire(&self) -> Result<Pooled<'_>> {
        Ok(Pooled::Owned(Connection::open(&self.path)?))
    }
}

impl<T: ConnectionSource + ?Sized> ConnectionSource for Arc<T> {
    fn acquire(&self) -> Result<Pooled<'_>> {
        self.as_ref().acquire()
    }
}

impl<T: ConnectionSource + ?Sized> ConnectionSource for Box<T> {
    fn acquire(&self) -> Result<Pooled<'_>> {
        self.as_ref().acquire()
    }
}
