use chrono::NaiveDate;
use clap::{Args, Subcommand};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a new student
    Add(Add),
    /// List saved students
    List,
    /// Show details about a student
    Show(Show),
    /// Change the first name of a student
    Rename(Rename),
    /// Delete one or more students
    Delete(Delete),
    /// Count saved students
    Count,
    /// List students copied to the cache when they were saved
    Cached,
}

#[derive(Args, Clone, Debug)]
pub struct Add {
    /// First name of the new student
    pub first_name: String,

    /// Enrollment date
    #[arg(long, value_name = "DATE")]
    pub enrolled: Option<NaiveDate>,

    /// Id of the student mentoring the new one
    #[arg(long, value_name = "ID")]
    pub mentor: Option<i64>,
}

#[derive(Args, Clone, Debug)]
pub struct Show {
    /// Id of the student
    pub id: i64,
}

#[derive(Args, Clone, Debug)]
pub struct Rename {
    /// Id of the student
    pub id: i64,

    /// New first name
    pub first_name: String,
}

#[derive(Args, Clone, Debug)]
pub struct Delete {
    /// Ids of the students to delete
    #[arg(required = true)]
    pub ids: Vec<i64>,
}
