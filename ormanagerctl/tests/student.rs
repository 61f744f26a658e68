#[macro_use]
mod common;
use common::prelude::*;

#[test]
fn empty() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student).failure().stderr(str::contains("Usage:"));

    Ok(())
}

#[test]
fn add_and_list() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student add Bob)
        .success()
        .stdout(str::contains("Saved student 1"));
    cmd!(env, student add Ani --mentor 1)
        .success()
        .stdout(str::contains("Saved student 2"));

    cmd!(env, student list)
        .success()
        .stdout(str::contains("first name"))
        .stdout(str::is_match(r"2\s+\|\s+Ani\s+\|\s+\|\s+Bob")?)
        .stdout(str::is_match(r"1\s+\|\s+Bob")?);

    Ok(())
}

#[test]
fn add_duplicate() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student add Bob).success();
    cmd!(env, student add Bob)
        .failure()
        .stderr(str::contains("Conflict with existing data"));

    cmd!(env, student count).success().stdout("1\n");

    Ok(())
}

#[test]
fn add_enrolled() -> Result<()> {
    let env = Env::new()?;

    env.command()?
        .args(["student", "add", "Bob", "--enrolled", "2024-09-02"])
        .assert()
        .success();

    cmd!(env, student show 1)
        .success()
        .stdout(str::contains("1 | Bob"))
        .stdout(str::contains("Enrolled on: 2024-09-02"))
        .stdout(str::contains("Mentor").not());

    env.command()?
        .args(["student", "add", "Ani", "--enrolled", "someday"])
        .assert()
        .failure()
        .stderr(str::contains("--enrolled"));

    Ok(())
}

#[test]
fn show() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student show)
        .failure()
        .stderr(str::contains("  <ID>"));

    cmd!(env, student show 1)
        .failure()
        .stderr(str::contains("Student not found: 1"));

    env.seed(&["Ani", "Bob"])?;

    cmd!(env, student show 2)
        .success()
        .stdout(str::contains("2 | Bob"))
        .stdout(str::contains("Mentor: 1 | Ani"));

    cmd!(env, student add Eve --mentor 9)
        .failure()
        .stderr(str::contains("Student not found: 9"));

    Ok(())
}

#[test]
fn rename() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student rename 1 Robert)
        .failure()
        .stderr(str::contains("Student not found: 1"));

    cmd!(env, student add Bob).success();
    cmd!(env, student rename 1 Robert).success();

    cmd!(env, student show 1)
        .success()
        .stdout(str::contains("1 | Robert"));

    Ok(())
}

#[test]
fn delete() -> Result<()> {
    let env = Env::new()?;

    cmd!(env, student delete)
        .failure()
        .stderr(str::contains("<IDS>..."));

    cmd!(env, student add Bob).success();
    cmd!(env, student add Ani).success();
    cmd!(env, student add Eve).success();

    cmd!(env, student delete 1 3)
        .success()
        .stdout(str::contains("Deleted student 1"))
        .stdout(str::contains("Deleted student 3"));
    cmd!(env, student count).success().stdout("1\n");

    cmd!(env, student delete 2 3)
        .failure()
        .stdout(str::contains("Deleted student 2"))
        .stderr(str::contains("Student not found: 3"));
    cmd!(env, student count).success().stdout("0\n");

    Ok(())
}

#[test]
fn cached() -> Result<()> {
    let env = Env::with_storage(Storage {
        cache: "saved",
        ..Default::default()
    })?;
    env.seed(&["Eve"])?;

    cmd!(env, student add Bob).success();
    cmd!(env, student add Ani).success();
    cmd!(env, student delete 2).success();

    cmd!(env, student list)
        .success()
        .stdout(str::contains("Eve"))
        .stdout(str::contains("Bob").not());
    cmd!(env, student cached)
        .success()
        .stdout(str::contains("Bob"))
        .stdout(str::contains("Ani"))
        .stdout(str::contains("Eve").not());

    let lines = std::fs::read_to_string(env.cache_file())?;
    assert_eq!(2, lines.lines().count());

    let names = env
        .manager()?
        .find_all::<Student>()?
        .into_iter()
        .map(|s| s.first_name)
        .collect::<Vec<_>>();
    assert_eq!(vec!["Eve", "Ani"], names);

    Ok(())
}
