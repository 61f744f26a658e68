use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;

use crate::binder::{bind, KeyPosition};
use crate::cache::FileCache;
use crate::catalog::Catalog;
use crate::dialect::Dialect;
use crate::entity::Entity;
use crate::hydrator::Loader;
use crate::settings::{Settings, DEFAULT_MAX_DEPTH};
use crate::source::{ConnectionSource, FileSource, SharedConnection};
use crate::{Error, Id, Result};

/// Persists entities to their tables
///
/// Every operation acquires one connection from the source and releases it
/// before returning. Metadata is resolved once per entity type into the
/// manager's [`Catalog`], which can be shared between managers.
pub struct ORManager {
    source: Box<dyn ConnectionSource>,
    catalog: Arc<Catalog>,
    cache: Option<FileCache>,
    max_depth: usize,
}

impl ORManager {
    pub fn new<S: ConnectionSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            catalog: Arc::new(Catalog::default()),
            cache: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self::new(SharedConnection::from(connection))
    }

    pub fn memory() -> Result<Self> {
        Ok(Self::new(SharedConnection::memory()?))
    }

    /// Manager opening the database file anew for each operation
    pub fn open<T: AsRef<Path>>(path: T) -> Self {
        Self::new(FileSource::new(path.as_ref()))
    }

    pub fn with_settings(settings: &Settings) -> Result<Self> {
        let mut manager = Self {
            source: settings.source()?,
            catalog: Arc::new(Catalog::default()),
            cache: None,
            max_depth: settings.max_depth,
        };
        if let Some(dir) = &settings.cache_dir {
            manager.cache = Some(FileCache::new(dir));
        }

        Ok(manager)
    }

    pub fn with_properties_from<T: AsRef<Path>>(path: T) -> Result<Self> {
        Self::with_settings(&Settings::load(path)?)
    }

    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_dialect<D: Dialect + 'static>(self, dialect: D) -> Self {
        self.with_catalog(Arc::new(Catalog::new(dialect)))
    }

    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn cache(&self) -> Option<&FileCache> {
        self.cache.as_ref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Create the table of `E` unless it exists, then check that its columns
    /// are the ones of `E`
    pub fn register<E: Entity>(&self) -> Result<&Self> {
        let mapping = self.catalog.mapping::<E>()?;
        let descriptor = &mapping.descriptor;
        let conn = self.source.acquire()?;

        log::debug!("{}", mapping.statements.create_table);
        conn.execute(&mapping.statements.create_table, ())?;

        let mut expected = descriptor
            .column_names()
            .into_iter()
            .map(str::to_lowercase)
            .collect::<Vec<_>>();
        expected.sort();

        let mut found = conn
            .prepare(&mapping.statements.table_columns)?
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|name| name.map(|name| name.to_lowercase()))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        found.sort();

        if expected != found {
            return Err(Error::SchemaMismatch {
                entity: descriptor.entity(),
                table: descriptor.table().to_string(),
                expected,
                found,
            });
        }

        log::info!("Registered {} as table {}", descriptor.entity(), descriptor.table());
        Ok(self)
    }

    /// Insert a transient entity and give it the generated key
    ///
    /// Saving an entity which already has a key does nothing.
    pub fn save<E: Entity>(&self, entity: &mut E) -> Result<Id> {
        let mapping = self.catalog.mapping::<E>()?;
        let descriptor = &mapping.descriptor;

        if let Some(id) = descriptor.key(entity)? {
            log::debug!("{} #{id} already saved", descriptor.entity());
            return Ok(id);
        }

        let id = {
            let conn = self.source.acquire()?;
            let mut statement = conn.prepare_cached(&mapping.statements.insert)?;
            bind(&mut statement, entity, descriptor, KeyPosition::Omit)?;
            log::debug!("{}", mapping.statements.insert);
            statement.raw_execute()?;
            Id::from(conn.last_insert_rowid())
        };
        descriptor.set_key(entity, Some(id))?;
        log::info!("Saved {} #{id}", descriptor.entity());

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.serialize(entity, descriptor) {
                log::warn!("Caching {} #{id}: {e}", descriptor.entity());
            }
        }

        Ok(id)
    }

    /// Write every column of a persisted entity, `false` if its row is gone
    pub fn update<E: Entity>(&self, entity: &E) -> Result<bool> {
        let mapping = self.catalog.mapping::<E>()?;
        let descriptor = &mapping.descriptor;

        let conn = self.source.acquire()?;
        let mut statement = conn.prepare_cached(&mapping.statements.update)?;
        bind(&mut statement, entity, descriptor, KeyPosition::Last)?;
        log::debug!("{}", mapping.statements.update);

        Ok(statement.raw_execute()? > 0)
    }

    pub fn refresh<E: Entity>(&self, _entity: &mut E) -> Result<()> {
        Err(Error::Unsupported("refresh"))
    }

    /// Delete the row of `entity`, which becomes transient again
    pub fn delete<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        let mapping = self.catalog.mapping::<E>()?;
        let descriptor = &mapping.descriptor;

        let Some(id) = descriptor.key(entity)? else {
            return Ok(false);
        };

        let deleted = {
            let conn = self.source.acquire()?;
            let mut statement = conn.prepare_cached(&mapping.statements.delete)?;
            log::debug!("{}", mapping.statements.delete);
            statement.execute([id])?
        };

        if deleted == 0 {
            return Ok(false);
        }

        descriptor.set_key(entity, None)?;
        log::info!("Deleted {} #{id}", descriptor.entity());
        Ok(true)
    }

    /// Delete each entity in turn, carrying on after failures
    pub fn delete_all<E: Entity>(&self, entities: &mut [E]) -> Vec<Result<bool>> {
        entities
            .iter_mut()
            .map(|entity| {
                let result = self.delete(entity);
                if let Err(e) = &result {
                    log::warn!("Deleting {}: {e}", std::any::type_name::<E>());
                }
                result
            })
            .collect()
    }

    pub fn find_by_id<E: Entity>(&self, id: impl Into<Id>) -> Result<Option<E>> {
        let conn = self.source.acquire()?;
        let found = Loader::new(&conn, &self.catalog, self.max_depth).find::<E>(id.into());
        found
    }

    pub fn find_all<E: Entity>(&self) -> Result<Vec<E>> {
        let conn = self.source.acquire()?;
        let found = Loader::new(&conn, &self.catalog, self.max_depth).find_all::<E>();
        found
    }

    pub fn records_count<E: Entity>(&self) -> Result<u64> {
        let mapping = self.catalog.mapping::<E>()?;
        let conn = self.source.acquire()?;

        let count = conn
            .prepare_cached(&mapping.statements.count)?
            .query_row([], |row| row.get::<_, i64>(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Entities appended to the flat-file cache by previous saves
    pub fn deserialize<E: Entity>(&self) -> Result<Vec<E>> {
        let Some(cache) = &self.cache else {
            return Err(Error::Config("no cache directory configured".into()));
        };
        let mapping = self.catalog.mapping::<E>()?;

        cache.deserialize(&mapping.descriptor)
    }
}
