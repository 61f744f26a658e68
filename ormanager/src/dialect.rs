use crate::value::SqlType;

/// SQL flavour used when generating statements
///
/// Only the type mapping table, the identity clause and the schema
/// introspection query differ between dialects.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn column_type(&self, sql_type: SqlType) -> &'static str;

    /// Full column clause of an auto-incrementing integer primary key
    fn identity(&self) -> &'static str;

    /// Query listing the column names of an existing table
    fn table_columns(&self, table: &str) -> String;

    /// Delimited table or column name, embedded quotes doubled
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn column_type(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::BigInt | SqlType::Integer | SqlType::Reference => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Double => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
        }
    }

    fn identity(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn table_columns(&self, table: &str) -> String {
        format!("SELECT name FROM pragma_table_info({})", quote_literal(table))
    }
}

/// ANSI flavour, as understood by H2 or PostgreSQL
#[derive(Copy, Clone, Debug, Default)]
pub struct Standard;

impl Dialect for Standard {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn column_type(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::BigInt | SqlType::Reference => "BIGINT",
            SqlType::Integer => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Text => "VARCHAR(255)",
            SqlType::Date => "DATE",
        }
    }

    fn identity(&self) -> &'static str {
        "BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY"
    }

    fn table_columns(&self, table: &str) -> String {
        format!(
            "SELECT column_name FROM information_schema.columns WHERE table_name = {}",
            quote_literal(table)
        )
    }
}

fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}
