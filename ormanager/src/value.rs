use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

use crate::Id;

/// Text representation of [`SqlType::Date`] columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Semantic type of a persisted column
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SqlType {
    BigInt,
    Integer,
    Boolean,
    Double,
    Text,
    Date,
    /// Primary key of another entity
    Reference,
}

impl SqlType {
    pub fn is_integer(self) -> bool {
        matches!(self, SqlType::BigInt | SqlType::Integer | SqlType::Reference)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Boolean(bool),
    Double(f64),
    Text(String),
    Date(NaiveDate),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: SqlType,
        found: &'static str,
    },
    #[error("unexpected NULL")]
    UnexpectedNull,
    #[error("{0} is out of range")]
    OutOfRange(i64),
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid UTF-8 text")]
    InvalidText,
    #[error("referenced {0} is not persisted")]
    Transient(&'static str),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value can be stored in a column of the given type
    ///
    /// `NULL` matches every type, nullability is checked separately.
    pub fn matches(&self, sql_type: SqlType) -> bool {
        match self {
            Value::Null => true,
            Value::Integer(_) => sql_type.is_integer(),
            Value::Boolean(_) => sql_type == SqlType::Boolean,
            Value::Double(_) => sql_type == SqlType::Double,
            Value::Text(_) => sql_type == SqlType::Text,
            Value::Date(_) => sql_type == SqlType::Date,
        }
    }

    /// Read a raw column value as the given semantic type
    pub fn read(value: ValueRef<'_>, sql_type: SqlType) -> Result<Value, ValueError> {
        let mismatch = |found| ValueError::Mismatch {
            expected: sql_type,
            found,
        };

        match (value, sql_type) {
            (ValueRef::Null, _) => Ok(Value::Null),
            (ValueRef::Integer(i), t) if t.is_integer() => Ok(Value::Integer(i)),
            (ValueRef::Integer(i), SqlType::Boolean) => Ok(Value::Boolean(i != 0)),
            (ValueRef::Integer(i), SqlType::Double) => Ok(Value::Double(i as f64)),
            (ValueRef::Real(f), SqlType::Double) => Ok(Value::Double(f)),
            (ValueRef::Text(bytes), SqlType::Text) => std::str::from_utf8(bytes)
                .map(|s| Value::Text(s.to_string()))
                .map_err(|_| ValueError::InvalidText),
            (ValueRef::Text(bytes), SqlType::Date) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|_| ValueError::InvalidText)?;
                parse_date(text).map(Value::Date)
            }
            (ValueRef::Integer(_), _) => Err(mismatch("integer")),
            (ValueRef::Real(_), _) => Err(mismatch("real")),
            (ValueRef::Text(_), _) => Err(mismatch("text")),
            (ValueRef::Blob(_), _) => Err(mismatch("blob")),
        }
    }
}

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate, ValueError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| ValueError::InvalidDate(text.to_string()))
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Null => rusqlite::types::Null.to_sql(),
            Value::Integer(i) => i.to_sql(),
            Value::Boolean(b) => b.to_sql(),
            Value::Double(f) => f.to_sql(),
            Value::Text(s) => s.to_sql(),
            Value::Date(d) => Ok(ToSqlOutput::from(d.format(DATE_FORMAT).to_string())),
        }
    }
}

/// Rust types that map to a persisted column
pub trait SqlValue: Sized {
    const SQL_TYPE: SqlType;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! sql_value {
    ($ty:ty, $sql_type:ident, $variant:ident) => {
        impl SqlValue for $ty {
            const SQL_TYPE: SqlType = SqlType::$sql_type;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    Value::Null => Err(ValueError::UnexpectedNull),
                    other => Err(ValueError::Mismatch {
                        expected: Self::SQL_TYPE,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

sql_value!(i64, BigInt, Integer);
sql_value!(bool, Boolean, Boolean);
sql_value!(f64, Double, Double);
sql_value!(String, Text, Text);
sql_value!(NaiveDate, Date, Date);

impl SqlValue for i32 {
    const SQL_TYPE: SqlType = SqlType::Integer;

    fn to_value(&self) -> Value {
        Value::Integer((*self).into())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = i64::from_value(value).map_err(|e| match e {
            ValueError::Mismatch { found, .. } => ValueError::Mismatch {
                expected: Self::SQL_TYPE,
                found,
            },
            e => e,
        })?;
        i32::try_from(wide).map_err(|_| ValueError::OutOfRange(wide))
    }
}

impl SqlValue for Id {
    const SQL_TYPE: SqlType = SqlType::BigInt;

    fn to_value(&self) -> Value {
        Value::Integer(self.value())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        i64::from_value(value).map(Id::from)
    }
}

impl<T: SqlValue> SqlValue for Option<T> {
    const SQL_TYPE: SqlType = T::SQL_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}
