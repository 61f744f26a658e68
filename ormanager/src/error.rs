pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Sqlite error. {0}")]
    Store(rusqlite::Error),
    #[error("Conflict with existing data. {0}")]
    NonUnique(String),
    #[error("Invalid metadata for {entity}. {reason}")]
    Metadata { entity: &'static str, reason: String },
    #[error("Binding {entity}. {reason}")]
    Binding { entity: &'static str, reason: String },
    #[error("Hydrating {entity}. {reason}")]
    Hydration { entity: &'static str, reason: String },
    #[error("Not persisted")]
    NotPersisted,
    #[error(
        "Table {table} does not match {entity}: expected {expected:?}, found {found:?}"
    )]
    SchemaMismatch {
        entity: &'static str,
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Unsupported operation {0}")]
    Unsupported(&'static str),
    #[error("Invalid configuration. {0}")]
    Config(String),
    #[error("Reading configuration. {0}")]
    Toml(#[from] toml::de::Error),
    #[error("I/O error. {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding cache entry. {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn metadata<T: Into<String>>(
        entity: &'static str,
        reason: T,
    ) -> Self {
        Error::Metadata {
            entity,
            reason: reason.into(),
        }
    }

    pub(crate) fn binding<T: Into<String>>(
        entity: &'static str,
        reason: T,
    ) -> Self {
        Error::Binding {
            entity,
            reason: reason.into(),
        }
    }

    pub(crate) fn hydration<T: Into<String>>(
        entity: &'static str,
        reason: T,
    ) -> Self {
        Error::Hydration {
            entity,
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == 2067 =>
            {
                Error::NonUnique(msg.unwrap_or("".to_string()))
            }
            _ => Error::Store(e),
        }
    }
}
