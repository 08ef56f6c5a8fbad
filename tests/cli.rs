use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn missing_config_prints_template_and_exits_one() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("rt2zammad")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Missing rt2zammad.json!"))
        .stdout(predicate::str::contains("\"zammad_host\""))
        .stdout(predicate::str::contains("\"rt_start\""));
}

#[test]
fn missing_config_reports_overridden_path() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("rt2zammad")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", "elsewhere.json"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Missing elsewhere.json!"));
}

#[test]
fn incomplete_config_is_a_fatal_startup_error() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("rt2zammad.json"),
        r#"{"zammad_host": "helpdesk.example.com"}"#,
    )
    .unwrap();

    Command::cargo_bin("rt2zammad")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("rt2zammad")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Migrate Request Tracker tickets into Zammad",
        ))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--cache"));
}
