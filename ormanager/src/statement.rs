use crate::descriptor::{ColumnDescriptor, EntityDescriptor};
use crate::dialect::Dialect;

/// SQL templates of one entity type, with `?` placeholders
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statements {
    pub create_table: String,
    /// Binds every column but the primary key, in declaration order
    pub insert: String,
    /// Binds the primary key
    pub select_by_id: String,
    pub select_all: String,
    /// Binds every column but the primary key, then the primary key
    pub update: String,
    /// Binds the primary key
    pub delete: String,
    pub count: String,
    pub table_columns: String,
}

impl Statements {
    pub fn build<E>(descriptor: &EntityDescriptor<E>, dialect: &dyn Dialect) -> Self {
        let table = dialect.quote_identifier(descriptor.table());
        let key = dialect.quote_identifier(&descriptor.primary_key().name);
        let all = descriptor
            .columns()
            .iter()
            .map(|c| dialect.quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let fields = descriptor
            .fields()
            .map(|c| dialect.quote_identifier(&c.name))
            .collect::<Vec<_>>();

        let definitions = descriptor
            .columns()
            .iter()
            .map(|c| format!("\t{}", definition(c, dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        let create_table = format!("CREATE TABLE IF NOT EXISTS {table} (\n{definitions}\n)");

        let insert = if fields.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                fields.join(", "),
                vec!["?"; fields.len()].join(", ")
            )
        };

        let assignments = if fields.is_empty() {
            format!("{key} = {key}")
        } else {
            fields
                .iter()
                .map(|f| format!("{f} = ?"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Statements {
            create_table,
            insert,
            select_by_id: format!("SELECT {all} FROM {table} WHERE {key} = ?"),
            select_all: format!("SELECT {all} FROM {table} ORDER BY {key}"),
            update: format!("UPDATE {table} SET {assignments} WHERE {key} = ?"),
            delete: format!("DELETE FROM {table} WHERE {key} = ?"),
            count: format!("SELECT COUNT(*) FROM {table}"),
            table_columns: dialect.table_columns(descriptor.table()),
        }
    }
}

fn definition<E>(column: &ColumnDescriptor<E>, dialect: &dyn Dialect) -> String {
    let name = dialect.quote_identifier(&column.name);
    if column.primary_key {
        return format!("{name} {}", dialect.identity());
    }

    let mut definition = format!("{name} {}", dialect.column_type(column.sql_type));
    if column.unique {
        definition.push_str(" UNIQUE");
    }
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    definition
}
