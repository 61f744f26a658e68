extern crate self as ormanager;

pub use rusqlite::Connection;

mod error;
pub use error::{Error, Result};

mod id;
pub use id::Id;

pub mod value;
pub use value::{SqlType, SqlValue, Value, ValueError};

pub mod entity;
pub use entity::{Accessor, Entity, EntityMetadata, FieldMetadata};

pub mod descriptor;
pub use descriptor::{ColumnDescriptor, EntityDescriptor};

pub mod binder;
pub mod cache;
pub mod catalog;
pub mod dialect;
pub mod hydrator;
pub mod settings;
pub mod source;
pub mod statement;

mod manager;
pub use manager::ORManager;

/// Derive [`Entity`](trait@Entity) for a struct with named fields
///
/// ```ignore
/// #[derive(Default, Entity)]
/// #[entity(table = "students")]
/// struct Student {
///     #[id]
///     id: Option<Id>,
///     #[column(name = "first_name", unique)]
///     first_name: String,
///     #[column(reference)]
///     mentor: Option<Box<Student>>,
/// }
/// ```
pub use ormanager_derive::Entity;

pub mod prelude {
    pub use crate::{Entity, Id, ORManager, Result};
}
