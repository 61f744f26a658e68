use std::collections::HashSet;

use crate::entity::{Accessor, Entity, EntityMetadata, FieldMetadata};
use crate::value::{SqlType, Value};
use crate::{Error, Id, Result};

/// One persisted column of `E`, with the accessor reaching its field
pub struct ColumnDescriptor<E> {
    pub name: String,
    pub field: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub accessor: Accessor<E>,
}

/// Resolved mapping between an entity type and its table
pub struct EntityDescriptor<E> {
    entity: &'static str,
    table: String,
    columns: Vec<ColumnDescriptor<E>>,
    primary_key: usize,
}

impl<E: Entity> EntityDescriptor<E> {
    pub fn resolve() -> Result<Self> {
        Self::from_metadata(E::metadata())
    }
}

impl<E> EntityDescriptor<E> {
    pub fn from_metadata(metadata: EntityMetadata<E>) -> Result<Self> {
        let EntityMetadata {
            type_name: entity,
            table,
            fields,
        } = metadata;

        let table = match table {
            Some(table) if !table.is_empty() => table.to_string(),
            _ => format!("{entity}s"),
        };

        let keys = fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.field)
            .collect::<Vec<_>>();
        let primary_key = match keys.as_slice() {
            [] => return Err(Error::metadata(entity, "no primary key declared")),
            [_] => fields.iter().position(|f| f.primary_key).unwrap_or_default(),
            _ => {
                return Err(Error::metadata(
                    entity,
                    format!("multiple primary keys declared: {}", keys.join(", ")),
                ))
            }
        };

        let optional_key = fields[primary_key].nullable;

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(fields.len());

        for field in fields {
            let column = column(entity, field)?;
            if !seen.insert(column.name.to_lowercase()) {
                return Err(Error::metadata(
                    entity,
                    format!("column {} declared twice", column.name),
                ));
            }
            columns.push(column);
        }

        let key = &columns[primary_key];
        if !matches!(key.sql_type, SqlType::BigInt | SqlType::Integer)
            || !matches!(key.accessor, Accessor::Value { .. })
        {
            return Err(Error::metadata(
                entity,
                format!("primary key {} is not an integer field", key.field),
            ));
        }
        if !optional_key {
            return Err(Error::metadata(
                entity,
                format!("primary key {} must be optional", key.field),
            ));
        }

        Ok(EntityDescriptor {
            entity,
            table,
            columns,
            primary_key,
        })
    }

    /// Name of the entity type
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every column, primary key included, in declaration order
    pub fn columns(&self) -> &[ColumnDescriptor<E>] {
        &self.columns
    }

    /// Every column but the primary key, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &ColumnDescriptor<E>> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    pub fn primary_key(&self) -> &ColumnDescriptor<E> {
        &self.columns[self.primary_key]
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn key(&self, entity: &E) -> Result<Option<Id>> {
        let column = self.primary_key();
        let Accessor::Value { get, .. } = column.accessor else {
            return Ok(None);
        };

        match get(entity) {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(i.into())),
            other => Err(Error::binding(
                self.entity,
                format!("primary key {} holds a {} value", column.name, other.kind()),
            )),
        }
    }

    pub fn set_key(&self, entity: &mut E, key: Option<Id>) -> Result<()> {
        let column = self.primary_key();
        let Accessor::Value { set, .. } = column.accessor else {
            return Ok(());
        };

        let value = key.map(|k| Value::Integer(k.into())).unwrap_or(Value::Null);
        set(entity, value).map_err(|e| {
            Error::hydration(self.entity, format!("column {}: {e}", column.name))
        })
    }
}

fn column<E>(entity: &'static str, field: FieldMetadata<E>) -> Result<ColumnDescriptor<E>> {
    let reference = matches!(field.accessor, Accessor::Reference { .. });
    if reference != (field.sql_type == SqlType::Reference) {
        return Err(Error::metadata(
            entity,
            format!("field {} mixes reference and value access", field.field),
        ));
    }

    let name = match field.column {
        Some(column) if !column.is_empty() => column.to_string(),
        _ => field.field.to_string(),
    };

    Ok(ColumnDescriptor {
        name,
        field: field.field,
        sql_type: field.sql_type,
        nullable: field.nullable && !field.primary_key,
        unique: field.unique,
        primary_key: field.primary_key,
        accessor: field.accessor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{Course, Student};
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Bare {
        key: Option<Id>,
        label: String,
    }

    impl Bare {
        fn key_field() -> FieldMetadata<Self> {
            FieldMetadata::new(
                "key",
                SqlType::BigInt,
                Accessor::Value {
                    get: |e: &Bare| e.key.to_value(),
                    set: |e: &mut Bare, v| {
                        e.key = SqlValue::from_value(v)?;
                        Ok(())
                    },
                },
            )
            .nullable(true)
        }

        fn label_field() -> FieldMetadata<Self> {
            FieldMetadata::new(
                "label",
                SqlType::Text,
                Accessor::Value {
                    get: |e: &Bare| e.label.to_value(),
                    set: |e: &mut Bare, v| {
                        e.label = SqlValue::from_value(v)?;
                        Ok(())
                    },
                },
            )
        }
    }

    #[test]
    fn resolve_with_overrides() -> Result<()> {
        let descriptor = EntityDescriptor::<Student>::resolve()?;

        assert_eq!("students", descriptor.table());
        assert_eq!(
            vec!["id", "first_name", "enrolled_on", "mentor_id"],
            descriptor.column_names()
        );
        assert_eq!("id", descriptor.primary_key().name);
        assert_eq!(3, descriptor.fields().count());

        let first_name = &descriptor.columns()[1];
        assert_eq!("first_name", first_name.field);
        assert!(!first_name.nullable);
        assert!(first_name.unique);

        let mentor = &descriptor.columns()[3];
        assert_eq!(SqlType::Reference, mentor.sql_type);
        assert!(mentor.nullable);

        Ok(())
    }

    #[test]
    fn default_names() -> Result<()> {
        let descriptor = EntityDescriptor::from_metadata(
            EntityMetadata::new("Bare")
                .field(Bare::key_field().primary_key())
                .field(Bare::label_field()),
        )?;

        assert_eq!("Bares", descriptor.table());
        assert_eq!(vec!["key", "label"], descriptor.column_names());

        let descriptor = EntityDescriptor::<Course>::resolve()?;
        assert_eq!("Courses", descriptor.table());

        Ok(())
    }

    #[test]
    fn missing_primary_key() {
        let result = EntityDescriptor::from_metadata(
            EntityMetadata::new("Bare")
                .field(Bare::key_field())
                .field(Bare::label_field()),
        );

        assert!(matches!(
            result,
            Err(Error::Metadata { entity: "Bare", reason }) if reason == "no primary key declared"
        ));
    }

    #[test]
    fn multiple_primary_keys() {
        let result = EntityDescriptor::from_metadata(
            EntityMetadata::new("Bare")
                .field(Bare::key_field().primary_key())
                .field(Bare::label_field().primary_key()),
        );

        assert!(matches!(
            result,
            Err(Error::Metadata { reason, .. }) if reason.contains("key, label")
        ));
    }

    #[test]
    fn textual_primary_key() {
        let result = EntityDescriptor::from_metadata(
            EntityMetadata::new("Bare")
                .field(Bare::key_field())
                .field(Bare::label_field().primary_key()),
        );

        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[derive(Default)]
    struct Plain {
        id: i64,
    }

    #[test]
    fn required_primary_key() {
        let result = EntityDescriptor::from_metadata(EntityMetadata::new("Plain").field(
            FieldMetadata::new(
                "id",
                i64::SQL_TYPE,
                Accessor::Value {
                    get: |e: &Plain| e.id.to_value(),
                    set: |e: &mut Plain, v| {
                        e.id = SqlValue::from_value(v)?;
                        Ok(())
                    },
                },
            )
            .nullable(i64::NULLABLE)
            .primary_key(),
        ));

        assert!(matches!(
            result,
            Err(Error::Metadata { entity: "Plain", reason }) if reason == "primary key id must be optional"
        ));
    }

    #[test]
    fn duplicate_columns() {
        let result = EntityDescriptor::from_metadata(
            EntityMetadata::new("Bare")
                .field(Bare::key_field().primary_key())
                .field(Bare::label_field().column("KEY")),
        );

        assert!(matches!(
            result,
            Err(Error::Metadata { reason, .. }) if reason == "column KEY declared twice"
        ));
    }

    #[test]
    fn keys() -> Result<()> {
        let descriptor = EntityDescriptor::<Student>::resolve()?;
        let mut student = Student::new("Bob");

        assert_eq!(None, descriptor.key(&student)?);
        descriptor.set_key(&mut student, Some(Id::from(4)))?;
        assert_eq!(Some(Id::from(4)), student.id);
        assert_eq!(Some(Id::from(4)), descriptor.key(&student)?);
        descriptor.set_key(&mut student, None)?;
        assert_eq!(None, student.id);

        Ok(())
    }
}
