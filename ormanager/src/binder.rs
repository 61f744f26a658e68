use rusqlite::Statement;

use crate::descriptor::{ColumnDescriptor, EntityDescriptor};
use crate::entity::Accessor;
use crate::value::Value;
use crate::{Error, Result};

/// Whether the primary key is bound after the other columns
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyPosition {
    Omit,
    Last,
}

/// Statement parameters for `entity`, in placeholder order
pub fn parameters<E>(
    entity: &E,
    descriptor: &EntityDescriptor<E>,
    key: KeyPosition,
) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(descriptor.columns().len());

    for column in descriptor.fields() {
        values.push(column_value(entity, descriptor, column)?);
    }

    if key == KeyPosition::Last {
        let Some(id) = descriptor.key(entity)? else {
            return Err(Error::NotPersisted);
        };
        values.push(Value::Integer(id.into()));
    }

    Ok(values)
}

/// Bind the parameters of `entity` into a prepared statement
///
/// Returns the number of bound parameters.
pub fn bind<E>(
    statement: &mut Statement<'_>,
    entity: &E,
    descriptor: &EntityDescriptor<E>,
    key: KeyPosition,
) -> Result<usize> {
    let values = parameters(entity, descriptor, key)?;

    if statement.parameter_count() != values.len() {
        return Err(Error::binding(
            descriptor.entity(),
            format!(
                "statement expects {} parameters, got {}",
                statement.parameter_count(),
                values.len()
            ),
        ));
    }

    for (index, value) in values.iter().enumerate() {
        statement.raw_bind_parameter(index + 1, value)?;
    }

    Ok(values.len())
}

/// Value of one column, checked against its declaration
pub(crate) fn column_value<E>(
    entity: &E,
    descriptor: &EntityDescriptor<E>,
    column: &ColumnDescriptor<E>,
) -> Result<Value> {
    let value = match column.accessor {
        Accessor::Value { get, .. } => get(entity),
        Accessor::Reference { key, .. } => match key(entity) {
            Ok(Some(id)) => Value::Integer(id.into()),
            Ok(None) => Value::Null,
            Err(e) => {
                return Err(Error::binding(
                    descriptor.entity(),
                    format!("column {}: {e}", column.name),
                ))
            }
        },
    };

    if value.is_null() && !column.nullable && !column.primary_key {
        return Err(Error::binding(
            descriptor.entity(),
            format!("column {} is NOT NULL", column.name),
        ));
    }

    if !value.matches(column.sql_type) {
        return Err(Error::binding(
            descriptor.entity(),
            format!(
                "column {} expects {}, got {}",
                column.name,
                column.sql_type,
                value.kind()
            ),
        ));
    }

    Ok(value)
}
