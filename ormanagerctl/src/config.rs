use std::fs::create_dir_all;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use toml::{Table, Value};

use ormanager::settings::{self, Database, Settings};
use ormanager::ORManager;

use crate::cli::{Cli, Commands};
use crate::student::Student;

#[derive(Debug)]
pub struct Config {
    pub dir: PathBuf,
    pub data_dir: PathBuf,
    cli: Cli,
    table: Table,
}

impl Config {
    pub fn try_parse() -> Result<Self> {
        Self::try_parse_from(std::env::args_os())
    }

    pub fn try_parse_from<I, T>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::Parser;

        let cli = Cli::try_parse_from(iter)?;

        let dir = match cli.config.clone() {
            Some(dir) => dir,
            None => config_home()?,
        };
        let table = match std::fs::read_to_string(dir.join("config.toml")) {
            Ok(content) => content.parse::<Table>()?,
            Err(_) => Table::new(),
        };

        let data_dir = match cli.data.clone() {
            Some(dir) => dir,
            None => match table.get("data_dir").and_then(Value::as_str) {
                Some(dir) => PathBuf::from(dir),
                None => data_home()?,
            },
        };

        if !data_dir.is_dir() {
            return Err(anyhow!(
                "Data directory is not a dir: {}",
                data_dir.display()
            ));
        }

        Ok(Config {
            dir,
            data_dir,
            cli,
            table,
        })
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.cli.verbose.log_level_filter()
    }

    pub fn command(&self) -> Option<&Commands> {
        self.cli.command.as_ref()
    }

    fn section(&self, name: &str) -> Option<&Table> {
        self.table.get(name).and_then(Value::as_table)
    }

    pub fn database_path(&self) -> PathBuf {
        let filename = self
            .section("db")
            .and_then(|db| db.get("filename"))
            .and_then(Value::as_str)
            .unwrap_or("students.db");

        self.data_dir.join(filename)
    }

    pub fn cache_dir(&self) -> PathBuf {
        let dir = self
            .section("cache")
            .and_then(|cache| cache.get("dir"))
            .and_then(Value::as_str)
            .unwrap_or("cache");

        self.data_dir.join(dir)
    }

    /// Manager settings out of the `[db]`, `[cache]` and `[hydration]` sections
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            database: Database::File(self.database_path()),
            max_depth: settings::max_depth(&self.table)?,
            cache_dir: Some(self.cache_dir()),
        })
    }

    /// Manager over the database file, with the student table registered
    pub fn manager(&self) -> Result<ORManager> {
        let manager = ORManager::with_settings(&self.settings()?)?;
        manager.register::<Student>()?;

        Ok(manager)
    }
}

fn config_home() -> Result<PathBuf> {
    match std::env::var("ORMANAGER_CONFIG") {
        Ok(val) if !val.is_empty() => Ok(PathBuf::from(val)),
        _ => {
            let path = xdg::BaseDirectories::with_prefix("ormanager")?.get_config_home();
            if !path.exists() {
                create_dir_all(&path)?;
            }
            Ok(path)
        }
    }
}

fn data_home() -> Result<PathBuf> {
    match std::env::var("ORMANAGER_DATA") {
        Ok(val) if !val.is_empty() => Ok(PathBuf::from(val)),
        _ => {
            let path = xdg::BaseDirectories::with_prefix("ormanager")?.get_data_home();
            if !path.exists() {
                create_dir_all(&path)?;
            }
            Ok(path)
        }
    }
}
