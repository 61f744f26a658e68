use std::borrow::Cow;

use anyhow::Result;
use chrono::NaiveDate;
use tabled::{Table, Tabled};

use ormanager::{Entity, Id, ORManager};

use crate::cli::{student::*, Commands};
use crate::config::Config;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "students")]
pub struct Student {
    #[id]
    pub id: Option<Id>,
    #[column(name = "first_name", unique)]
    pub first_name: String,
    pub enrolled_on: Option<NaiveDate>,
    #[column(name = "mentor_id", reference)]
    pub mentor: Option<Box<Student>>,
}

impl Student {
    pub fn new(first_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(derive_more::From)]
struct StudentToDisplay(Student);

impl Tabled for StudentToDisplay {
    const LENGTH: usize = 4;

    fn fields(&self) -> Vec<Cow<'_, str>> {
        let student = &self.0;

        vec![
            student
                .id
                .map(|id| id.to_string().into())
                .unwrap_or("".into()),
            student.first_name.as_str().into(),
            student
                .enrolled_on
                .map(|date| date.to_string().into())
                .unwrap_or("".into()),
            student
                .mentor
                .as_ref()
                .map(|mentor| mentor.first_name.as_str().into())
                .unwrap_or("".into()),
        ]
    }

    fn headers() -> Vec<Cow<'static, str>> {
        vec![
            "id".into(),
            "first name".into(),
            "enrolled on".into(),
            "mentor".into(),
        ]
    }
}

struct CommandContext<'a> {
    manager: &'a ORManager,
}

pub fn run(config: &Config) -> Result<()> {
    let Some(Commands::Student(command)) = config.command() else {
        anyhow::bail!("wrong command passed: {:?}", config.command());
    };

    let manager = &config.manager()?;
    let cmd = CommandContext { manager };

    match command {
        Command::Add(args) => cmd.add(args),
        Command::List => cmd.list(),
        Command::Show(args) => cmd.show(args),
        Command::Rename(args) => cmd.rename(args),
        Command::Delete(args) => cmd.delete(args),
        Command::Count => cmd.count(),
        Command::Cached => cmd.cached(),
    }
}

impl CommandContext<'_> {
    fn find(&self, id: i64) -> Result<Student> {
        self.manager
            .find_by_id::<Student>(id)?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {id}"))
    }

    fn add(&self, args: &Add) -> Result<()> {
        let mut student = Student::new(&args.first_name);
        student.enrolled_on = args.enrolled;

        if let Some(mentor) = args.mentor {
            student.mentor = Some(Box::new(self.find(mentor)?));
        }

        let id = self.manager.save(&mut student)?;
        println!("Saved student {id}");

        Ok(())
    }

    fn list(&self) -> Result<()> {
        let students = self
            .manager
            .find_all::<Student>()?
            .into_iter()
            .map(StudentToDisplay::from)
            .collect::<Vec<_>>();

        println!("{}", Table::new(students));

        Ok(())
    }

    fn show(&self, args: &Show) -> Result<()> {
        let student = self.find(args.id)?;

        println!("{} | {}", args.id, student.first_name);

        if let Some(date) = student.enrolled_on {
            println!("\tEnrolled on: {date}");
        }

        if let Some(mentor) = &student.mentor {
            let id = mentor.id.map(|id| id.to_string()).unwrap_or_default();
            println!("\tMentor: {id} | {}", mentor.first_name);
        }

        Ok(())
    }

    fn rename(&self, args: &Rename) -> Result<()> {
        let mut student = self.find(args.id)?;
        student.first_name.clone_from(&args.first_name);

        if !self.manager.update(&student)? {
            anyhow::bail!("Student not found: {}", args.id);
        }

        Ok(())
    }

    fn delete(&self, args: &Delete) -> Result<()> {
        let mut students = Vec::new();
        for &id in &args.ids {
            match self.manager.find_by_id::<Student>(id)? {
                Some(student) => students.push(student),
                None => eprintln!("Student not found: {id}"),
            }
        }

        let ids = students.iter().map(|s| s.id).collect::<Vec<_>>();
        let mut failed = students.len() != args.ids.len();

        for (id, result) in ids
            .into_iter()
            .zip(self.manager.delete_all(&mut students))
        {
            let id = id.map(|id| id.to_string()).unwrap_or_default();
            match result {
                Ok(true) => println!("Deleted student {id}"),
                Ok(false) => println!("Student {id} was already deleted"),
                Err(e) => {
                    eprintln!("Deleting student {id}: {e}");
                    failed = true;
                }
            }
        }

        if failed {
            anyhow::bail!("Some students were not deleted");
        }

        Ok(())
    }

    fn count(&self) -> Result<()> {
        println!("{}", self.manager.records_count::<Student>()?);

        Ok(())
    }

    fn cached(&self) -> Result<()> {
        let students = self
            .manager
            .deserialize::<Student>()?
            .into_iter()
            .map(StudentToDisplay::from)
            .collect::<Vec<_>>();

        println!("{}", Table::new(students));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::{assert_eq, *};

    #[test]
    fn add_with_mentor() -> Result<()> {
        let args = ["student", "add", "Bob", "--mentor", "1"];
        with_students(&["Ani"], &args, |config, manager| {
            run(config)?;

            let ani = manager.find_by_id::<Student>(1)?.expect("student seeded");
            let bob = manager
                .find_by_id::<Student>(2)?
                .expect("student added");
            assert_eq!("Bob", bob.first_name);
            assert_eq!(Some(Box::new(ani)), bob.mentor);

            Ok(())
        })
    }

    #[test]
    fn add_with_missing_mentor() -> Result<()> {
        with_command(&["student", "add", "Bob", "--mentor", "3"], |config| {
            assert!(run(config).is_err());
            assert_eq!(0, config.manager()?.records_count::<Student>()?);

            Ok(())
        })
    }

    #[test]
    fn rename() -> Result<()> {
        let args = ["student", "rename", "1", "Robert"];
        with_command(&args, |config| {
            assert!(run(config).is_err());
            Ok(())
        })?;

        with_students(&["Bob"], &args, |config, manager| {
            run(config)?;

            assert_eq!(
                "Robert",
                manager
                    .find_by_id::<Student>(1)?
                    .expect("student saved")
                    .first_name
            );

            Ok(())
        })
    }

    #[test]
    fn delete_reports_missing() -> Result<()> {
        with_students(&["Bob"], &["student", "delete", "1", "2"], |config, manager| {
            assert!(run(config).is_err());
            assert_eq!(0, manager.records_count::<Student>()?);

            Ok(())
        })
    }

    #[test]
    fn display() {
        let mut mentor = Student::new("Ani");
        mentor.id = Some(Id::from(1));
        let student = Student {
            id: Some(Id::from(2)),
            first_name: "Bob".into(),
            enrolled_on: NaiveDate::from_ymd_opt(2024, 9, 2),
            mentor: Some(Box::new(mentor)),
        };

        assert_eq!(
            vec!["2", "Bob", "2024-09-02", "Ani"],
            StudentToDisplay::from(student).fields()
        );
    }
}
