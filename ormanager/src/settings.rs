use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::source::{ConnectionSource, FileSource, SharedConnection};
use crate::{Error, Result};

pub const DEFAULT_MAX_DEPTH: usize = 8;

const MEMORY_URL: &str = ":memory:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Database {
    Memory,
    File(PathBuf),
}

/// Manager settings, usually read from a TOML properties file
///
/// ```toml
/// [database]
/// url = "students.db"
///
/// [hydration]
/// max_depth = 8
///
/// [cache]
/// dir = "cache"
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database: Database,
    pub max_depth: usize,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database::Memory,
            max_depth: DEFAULT_MAX_DEPTH,
            cache_dir: None,
        }
    }
}

impl Settings {
    /// Read settings from a file, relative paths being resolved against
    /// the file's directory
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        Self::parse(&content, base)
    }

    pub fn parse(content: &str, base: &Path) -> Result<Self> {
        let table = content.parse::<Table>()?;
        let mut settings = Settings::default();

        settings.database = match get_str(&table, "database", "url")? {
            Some(MEMORY_URL) => Database::Memory,
            Some(url) => Database::File(base.join(url)),
            None => return Err(Error::Config("database.url is not defined".into())),
        };

        settings.max_depth = max_depth(&table)?;
        settings.cache_dir = get_str(&table, "cache", "dir")?.map(|dir| base.join(dir));

        Ok(settings)
    }

    pub fn source(&self) -> Result<Box<dyn ConnectionSource>> {
        Ok(match &self.database {
            Database::Memory => Box::new(SharedConnection::memory()?),
            Database::File(path) => Box::new(FileSource::new(path)),
        })
    }
}

/// `hydration.max_depth` of a settings table, [`DEFAULT_MAX_DEPTH`] when absent
pub fn max_depth(table: &Table) -> Result<usize> {
    let Some(value) = get(table, "hydration", "max_depth") else {
        return Ok(DEFAULT_MAX_DEPTH);
    };

    value
        .as_integer()
        .and_then(|depth| usize::try_from(depth).ok())
        .ok_or_else(|| Error::Config("hydration.max_depth must be a non-negative integer".into()))
}

fn get<'a>(table: &'a Table, section: &str, key: &str) -> Option<&'a Value> {
    table
        .get(section)
        .and_then(Value::as_table)
        .and_then(|section| section.get(key))
}

fn get_str<'a>(table: &'a Table, section: &str, key: &str) -> Result<Option<&'a str>> {
    match get(table, section, key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| Error::Config(format!("{section}.{key} must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::fixture::{FileWriteStr, PathChild};
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full() -> Result<()> {
        let settings = Settings::parse(
            "
            [database]
            url = 'school.db'

            [hydration]
            max_depth = 2

            [cache]
            dir = 'cache'
            ",
            Path::new("/srv/orm"),
        )?;

        assert_eq!(
            Settings {
                database: Database::File(PathBuf::from("/srv/orm/school.db")),
                max_depth: 2,
                cache_dir: Some(PathBuf::from("/srv/orm/cache")),
            },
            settings
        );

        Ok(())
    }

    #[test]
    fn parse_defaults() -> Result<()> {
        let settings = Settings::parse("[database]\nurl = ':memory:'", Path::new(""))?;

        assert_eq!(Settings::default(), settings);

        Ok(())
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Settings::parse("", Path::new("")),
            Err(Error::Config(msg)) if msg == "database.url is not defined"
        ));
        assert!(matches!(
            Settings::parse("[database]\nurl = 3", Path::new("")),
            Err(Error::Config(msg)) if msg == "database.url must be a string"
        ));
        assert!(matches!(
            Settings::parse(
                "[database]\nurl = ':memory:'\n[hydration]\nmax_depth = -1",
                Path::new("")
            ),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::parse("[database", Path::new("")),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn hydration_depth() -> Result<()> {
        assert_eq!(DEFAULT_MAX_DEPTH, max_depth(&Table::new())?);
        assert_eq!(3, max_depth(&"[hydration]\nmax_depth = 3".parse::<Table>()?)?);
        assert!(matches!(
            max_depth(&"[hydration]\nmax_depth = 'deep'".parse::<Table>()?),
            Err(Error::Config(msg)) if msg == "hydration.max_depth must be a non-negative integer"
        ));

        Ok(())
    }

    #[test]
    fn load_relative_to_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("orm.toml")
            .write_str("[database]\nurl = 'data/school.db'")?;

        let settings = Settings::load(dir.child("orm.toml").path())?;
        assert_eq!(
            Database::File(dir.path().join("data/school.db")),
            settings.database
        );

        Ok(())
    }
}
