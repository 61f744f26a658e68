use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::descriptor::EntityDescriptor;
use crate::dialect::Dialect;
use crate::entity::Entity;
use crate::statement::Statements;
use crate::{Error, Result};

/// Resolved metadata and statements of one entity type
pub struct Mapping<E> {
    pub descriptor: EntityDescriptor<E>,
    pub statements: Statements,
}

impl<E: Entity> Mapping<E> {
    pub fn resolve(dialect: &dyn Dialect) -> Result<Self> {
        let descriptor = EntityDescriptor::<E>::resolve()?;
        let statements = Statements::build(&descriptor, dialect);

        Ok(Mapping {
            descriptor,
            statements,
        })
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Lazily populated table of [`Mapping`]s, keyed by entity type
///
/// Each type is resolved at most once and then only read. Entries live until
/// [`Catalog::clear`] or until the catalog is dropped.
pub struct Catalog {
    dialect: Box<dyn Dialect>,
    mappings: RwLock<HashMap<TypeId, Entry>>,
}

impl Catalog {
    pub fn new<D: Dialect + 'static>(dialect: D) -> Self {
        Self {
            dialect: Box::new(dialect),
            mappings: RwLock::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn mapping<E: Entity>(&self) -> Result<Arc<Mapping<E>>> {
        let type_id = TypeId::of::<E>();

        let cached = self
            .mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();
        if let Some(entry) = cached {
            return downcast(entry);
        }

        let resolved: Entry = Arc::new(Mapping::<E>::resolve(self.dialect())?);
        log::debug!("Resolved {}", std::any::type_name::<E>());

        let entry = self
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert(resolved)
            .clone();
        downcast(entry)
    }

    pub fn contains<E: Entity>(&self) -> bool {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(crate::dialect::Sqlite)
    }
}

fn downcast<E: Entity>(entry: Entry) -> Result<Arc<Mapping<E>>> {
    entry.downcast::<Mapping<E>>().map_err(|_| {
        Error::metadata(std::any::type_name::<E>(), "catalog entry of another type")
    })
}
