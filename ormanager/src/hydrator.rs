use std::any::{type_name, TypeId};

use rusqlite::{Connection, Row, Statement};

use crate::catalog::Catalog;
use crate::descriptor::EntityDescriptor;
use crate::entity::{Accessor, Entity};
use crate::value::Value;
use crate::{Error, Id, Result};

/// Lookup context shared by a hydration and its nested references
///
/// Nested lookups run on the connection of the outer operation. The loader
/// keeps the `(type, key)` path currently being hydrated so that cyclic
/// references stop instead of recursing forever.
pub struct Loader<'a> {
    conn: &'a Connection,
    catalog: &'a Catalog,
    path: Vec<(TypeId, Id)>,
    max_depth: usize,
}

impl<'a> Loader<'a> {
    pub fn new(conn: &'a Connection, catalog: &'a Catalog, max_depth: usize) -> Self {
        Self {
            conn,
            catalog,
            path: Vec::new(),
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// First row matching `id`, if any
    pub fn find<T: Entity>(&mut self, id: Id) -> Result<Option<T>> {
        let conn = self.conn;
        let mapping = self.catalog.mapping::<T>()?;
        let mut statement = conn.prepare_cached(&mapping.statements.select_by_id)?;
        let mut rows = statement.query([id])?;

        match rows.next()? {
            Some(row) => Ok(Some(hydrate(row, &mapping.descriptor, self)?)),
            None => Ok(None),
        }
    }

    /// Every row of the table, in primary key order
    pub fn find_all<T: Entity>(&mut self) -> Result<Vec<T>> {
        let conn = self.conn;
        let mapping = self.catalog.mapping::<T>()?;
        let mut statement = conn.prepare_cached(&mapping.statements.select_all)?;
        let mut rows = statement.query([])?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(hydrate(row, &mapping.descriptor, self)?);
        }
        Ok(entities)
    }

    /// Resolve a reference, leaving it absent on any failure
    pub fn load<T: Entity>(&mut self, id: Id) -> Option<T> {
        let entity = type_name::<T>();

        if self.path.contains(&(TypeId::of::<T>(), id)) {
            log::debug!("Not expanding {entity} #{id}, already being hydrated");
            return None;
        }

        if self.path.len() >= self.max_depth {
            log::warn!(
                "Not expanding {entity} #{id}, maximum depth {} reached",
                self.max_depth
            );
            return None;
        }

        match self.find::<T>(id) {
            Ok(Some(target)) => Some(target),
            Ok(None) => {
                log::warn!("Referenced {entity} #{id} not found");
                None
            }
            Err(e) => {
                log::warn!("Resolving {entity} #{id}: {e}");
                None
            }
        }
    }
}

/// Build a new `E` from a row holding every column of its descriptor
pub fn hydrate<E: Entity>(
    row: &Row<'_>,
    descriptor: &EntityDescriptor<E>,
    loader: &mut Loader<'_>,
) -> Result<E> {
    let statement: &Statement<'_> = row.as_ref();
    let expected = descriptor.columns().len();
    let found = statement.column_count();

    if found != expected {
        return Err(Error::hydration(
            descriptor.entity(),
            format!("expected {expected} columns, found {found}"),
        ));
    }

    let mut entity = E::default();
    let mut references = Vec::new();

    for column in descriptor.columns() {
        let index = statement.column_index(&column.name).map_err(|_| {
            Error::hydration(descriptor.entity(), format!("missing column {}", column.name))
        })?;
        let value = Value::read(row.get_ref(index)?, column.sql_type).map_err(|e| {
            Error::hydration(descriptor.entity(), format!("column {}: {e}", column.name))
        })?;

        match column.accessor {
            Accessor::Value { set, .. } => set(&mut entity, value).map_err(|e| {
                Error::hydration(descriptor.entity(), format!("column {}: {e}", column.name))
            })?,
            Accessor::Reference { load, .. } => {
                if let Value::Integer(key) = value {
                    references.push((load, Id::from(key)));
                }
            }
        }
    }

    if !references.is_empty() {
        let Some(key) = descriptor.key(&entity)? else {
            return Err(Error::hydration(descriptor.entity(), "row without primary key"));
        };

        loader.path.push((TypeId::of::<E>(), key));
        for (load, id) in references {
            load(&mut entity, &mut *loader, id);
        }
        loader.path.pop();
    }

    Ok(entity)
}
