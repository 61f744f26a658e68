use crate::hydrator::Loader;
use crate::value::{SqlType, SqlValue, Value, ValueError};
use crate::Id;

/// A struct persisted to its own table
///
/// Usually implemented with `#[derive(Entity)]`, which builds the metadata
/// table from the struct's fields and their `#[id]`/`#[column]` attributes.
pub trait Entity: Default + Send + Sync + 'static {
    fn metadata() -> EntityMetadata<Self>;

    /// Current primary key, `None` until the entity is first saved
    fn id(&self) -> Option<Id>;
}

/// Declarative metadata, as written on the type
pub struct EntityMetadata<E> {
    pub type_name: &'static str,
    pub table: Option<&'static str>,
    pub fields: Vec<FieldMetadata<E>>,
}

impl<E> EntityMetadata<E> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn field(mut self, field: FieldMetadata<E>) -> Self {
        self.fields.push(field);
        self
    }
}

pub struct FieldMetadata<E> {
    pub field: &'static str,
    pub column: Option<&'static str>,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub accessor: Accessor<E>,
}

impl<E> FieldMetadata<E> {
    pub fn new(field: &'static str, sql_type: SqlType, accessor: Accessor<E>) -> Self {
        Self {
            field,
            column: None,
            sql_type,
            nullable: false,
            unique: false,
            primary_key: false,
            accessor,
        }
    }

    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Typed access to one field of `E`
pub enum Accessor<E> {
    Value {
        get: fn(&E) -> Value,
        set: fn(&mut E, Value) -> Result<(), ValueError>,
    },
    /// Field holding another entity, persisted as that entity's key
    Reference {
        key: fn(&E) -> Result<Option<Id>, ValueError>,
        load: fn(&mut E, &mut Loader<'_>, Id),
    },
}

impl<E> Clone for Accessor<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Accessor<E> {}

/// Key of a referenced entity, as stored in the referencing row
pub fn reference_key<T: Entity>(target: Option<&T>) -> Result<Option<Id>, ValueError> {
    match target {
        None => Ok(None),
        Some(entity) => entity
            .id()
            .map(Some)
            .ok_or(ValueError::Transient(std::any::type_name::<T>())),
    }
}

/// Key held by an integer primary key field
pub fn key_of<T: SqlValue>(field: &T) -> Option<Id> {
    match field.to_value() {
        Value::Integer(i) => Some(i.into()),
        _ => None,
    }
}
