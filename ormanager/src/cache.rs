use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value as Json};

use crate::binder::column_value;
use crate::descriptor::EntityDescriptor;
use crate::entity::{Accessor, Entity};
use crate::value::{parse_date, SqlType, Value, ValueError, DATE_FORMAT};
use crate::{Error, Result};

/// Append-only JSON lines copy of saved entities, one file per type
///
/// Entries are never compacted nor updated, and have no relation to the
/// rows of the database they were saved to.
#[derive(Clone, Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<T: Into<PathBuf>>(dir: T) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path<E>(&self, descriptor: &EntityDescriptor<E>) -> PathBuf {
        self.dir.join(format!("{}.jsonl", descriptor.entity()))
    }

    pub fn serialize<E>(&self, entity: &E, descriptor: &EntityDescriptor<E>) -> Result<()> {
        let mut object = Map::new();
        for column in descriptor.columns() {
            let value = column_value(entity, descriptor, column)?;
            object.insert(column.name.clone(), to_json(&value));
        }

        std::fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(descriptor))?;

        let mut line = serde_json::to_vec(&object)?;
        line.push(b'\n');
        file.write_all(&line)?;

        Ok(())
    }

    /// Every cached entity, in append order
    ///
    /// Reference fields are left absent.
    pub fn deserialize<E: Entity>(&self, descriptor: &EntityDescriptor<E>) -> Result<Vec<E>> {
        let path = self.path(descriptor);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut entities = Vec::new();
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let object: Map<String, Json> = serde_json::from_str(&line)?;
            let mut entity = E::default();

            for column in descriptor.columns() {
                let Accessor::Value { set, .. } = column.accessor else {
                    continue;
                };

                from_json(object.get(&column.name), column.sql_type)
                    .and_then(|value| set(&mut entity, value))
                    .map_err(|e| {
                        Error::hydration(
                            descriptor.entity(),
                            format!("cached column {}: {e}", column.name),
                        )
                    })?;
            }

            entities.push(entity);
        }

        Ok(entities)
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(i) => Json::from(*i),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Double(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Text(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
    }
}

fn from_json(json: Option<&Json>, sql_type: SqlType) -> std::result::Result<Value, ValueError> {
    let mismatch = |found| ValueError::Mismatch {
        expected: sql_type,
        found,
    };

    match (json, sql_type) {
        (None | Some(Json::Null), _) => Ok(Value::Null),
        (Some(Json::Number(n)), t) if t.is_integer() => {
            n.as_i64().map(Value::Integer).ok_or(mismatch("number"))
        }
        (Some(Json::Number(n)), SqlType::Double) => {
            n.as_f64().map(Value::Double).ok_or(mismatch("number"))
        }
        (Some(Json::Bool(b)), SqlType::Boolean) => Ok(Value::Boolean(*b)),
        (Some(Json::String(s)), SqlType::Text) => Ok(Value::Text(s.clone())),
        (Some(Json::String(s)), SqlType::Date) => parse_date(s).map(Value::Date),
        (Some(Json::Number(_)), _) => Err(mismatch("number")),
        (Some(Json::Bool(_)), _) => Err(mismatch("boolean")),
        (Some(Json::String(_)), _) => Err(mismatch("string")),
        (Some(_), _) => Err(mismatch("structure")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{Course, Student};
    use crate::Id;
    use assert_fs::fixture::{FileWriteStr, PathChild};
    use assert_fs::TempDir;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_then_read() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let cache = FileCache::new(dir.path());
        let descriptor = EntityDescriptor::<Student>::resolve()?;

        assert!(cache.deserialize(&descriptor)?.is_empty());

        let mut mentor = Student::new("Ani");
        mentor.id = Some(Id::from(1));
        let mut student = Student::new("Bob");
        student.id = Some(Id::from(2));
        student.enrolled_on = NaiveDate::from_ymd_opt(2020, 2, 2);
        student.mentor = Some(Box::new(mentor.clone()));

        cache.serialize(&mentor, &descriptor)?;
        cache.serialize(&student, &descriptor)?;

        assert!(dir.child("Student.jsonl").path().exists());
        let content = std::fs::read_to_string(cache.path(&descriptor))?;
        assert_eq!(
            r#"{"enrolled_on":null,"first_name":"Ani","id":1,"mentor_id":null}
{"enrolled_on":"2020-02-02","first_name":"Bob","id":2,"mentor_id":1}
"#,
            content
        );

        student.mentor = None;
        assert_eq!(vec![mentor, student], cache.deserialize(&descriptor)?);

        Ok(())
    }

    #[test]
    fn all_value_types() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let cache = FileCache::new(dir.path().join("nested"));
        let descriptor = EntityDescriptor::<Course>::resolve()?;

        let course = Course {
            id: Some(Id::from(3)),
            title: "Rust".into(),
            credits: 4,
            active: true,
            weight: 0.5,
            instructor: None,
        };
        cache.serialize(&course, &descriptor)?;

        assert_eq!(vec![course], cache.deserialize(&descriptor)?);

        Ok(())
    }

    #[test]
    fn corrupted_entry() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let cache = FileCache::new(dir.path());
        let descriptor = EntityDescriptor::<Student>::resolve()?;

        dir.child("Student.jsonl")
            .write_str("{\"id\":1,\"first_name\":true}\n")?;

        assert!(matches!(
            cache.deserialize(&descriptor),
            Err(Error::Hydration { reason, .. }) if reason.starts_with("cached column first_name")
        ));

        Ok(())
    }
}
