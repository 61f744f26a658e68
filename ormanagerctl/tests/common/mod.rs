use std::path::PathBuf;

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::fixture::{FileWriteStr, PathChild};
use assert_fs::TempDir;
use chrono::NaiveDate;
use ormanager::{Entity, Id, ORManager};

pub mod prelude {
    pub use super::{Env, Storage, Student};
    pub use anyhow::Result;
    pub use predicates::prelude::*;
    pub use predicates::str;
}

/// Rows of the `students` table, as written by `ormanagerctl`
#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "students")]
pub struct Student {
    #[id]
    pub id: Option<Id>,
    #[column(name = "first_name", unique)]
    pub first_name: String,
    pub enrolled_on: Option<NaiveDate>,
    #[column(name = "mentor_id", reference)]
    pub mentor: Option<Box<Student>>,
}

/// `[db]`, `[cache]` and `[hydration]` sections of `config.toml`
pub struct Storage {
    pub database: &'static str,
    pub cache: &'static str,
    pub max_depth: usize,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            database: "students.db",
            cache: "cache",
            max_depth: 8,
        }
    }
}

pub struct Env {
    pub conf_dir: TempDir,
    pub data_dir: TempDir,
    storage: Storage,
}

/// Runs `ormanagerctl` in `$env` with the given bare words and `--flags`
macro_rules! cmd {
    ($env:ident, $($tail:tt)*) => {{
        let mut args: Vec<&str> = Vec::new();
        cmd!(@push args, $($tail)*);
        $env.command()?.args(&args).assert()
    }};
    (@push $args:ident,) => {};
    (@push $args:ident, --$flag:tt $($tail:tt)*) => {
        $args.push(concat!("--", stringify!($flag)));
        cmd!(@push $args, $($tail)*);
    };
    (@push $args:ident, $arg:tt $($tail:tt)*) => {
        $args.push(stringify!($arg));
        cmd!(@push $args, $($tail)*);
    };
}

impl Env {
    pub fn new() -> Result<Self> {
        Self::with_storage(Storage::default())
    }

    pub fn with_storage(storage: Storage) -> Result<Self> {
        let env = Self {
            conf_dir: TempDir::new()?,
            data_dir: TempDir::new()?,
            storage,
        };

        let Storage {
            database,
            cache,
            max_depth,
        } = &env.storage;
        env.conf_dir.child("config.toml").write_str(&format!(
            "[db]\nfilename = '{database}'\n\n[cache]\ndir = '{cache}'\n\n[hydration]\nmax_depth = {max_depth}\n"
        ))?;

        Ok(env)
    }

    pub fn command(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("ormanagerctl")?;
        cmd.arg("-C")
            .arg(self.conf_dir.path())
            .arg("-D")
            .arg(self.data_dir.path());
        Ok(cmd)
    }

    pub fn database(&self) -> PathBuf {
        self.data_dir.path().join(self.storage.database)
    }

    /// JSON lines copy of every student the binary saved
    pub fn cache_file(&self) -> PathBuf {
        self.data_dir
            .path()
            .join(self.storage.cache)
            .join("Student.jsonl")
    }

    /// Manager over the same database file as the binary
    pub fn manager(&self) -> Result<ORManager> {
        let manager = ORManager::open(self.database());
        manager.register::<Student>()?;
        Ok(manager)
    }

    /// Save one student per name, each mentored by the previous one
    pub fn seed(&self, names: &[&str]) -> Result<Vec<Id>> {
        let manager = self.manager()?;
        let mut mentor: Option<Student> = None;
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            let mut student = Student {
                first_name: name.to_string(),
                mentor: mentor.take().map(Box::new),
                ..Default::default()
            };
            ids.push(manager.save(&mut student)?);
            mentor = Some(student);
        }

        Ok(ids)
    }
}
