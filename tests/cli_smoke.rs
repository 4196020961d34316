mod support;

use predicates::str::contains;

use support::tasktrack_cmd;

#[test]
fn tasktrack_help_works() {
    tasktrack_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("projects and tasks"));
}

#[test]
fn subcommand_help_works() {
    let subcommands: [&[&str]; 9] = [
        &["project"],
        &["project", "new"],
        &["project", "member"],
        &["task"],
        &["task", "new"],
        &["task", "list"],
        &["task", "edit"],
        &["task", "search"],
        &["config"],
    ];

    for args in subcommands {
        tasktrack_cmd().args(args).arg("--help").assert().success();
    }
}

#[test]
fn unknown_environment_is_a_user_error() {
    tasktrack_cmd()
        .args(["--env", "staging", "config", "show"])
        .assert()
        .code(2)
        .stderr(contains("unknown environment"));
}

#[test]
fn config_show_reports_environment_and_override() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    let value = data.json(&["config", "show"]);
    assert_eq!(value["schema_version"], "tasktrack.v1");
    assert_eq!(value["command"], "config show");
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["environment"], "testing");
    assert_eq!(value["data"]["notifications_enabled"], false);
    assert_eq!(
        value["data"]["data_dir"].as_str(),
        data.data_dir().to_str()
    );
    Ok(())
}

#[test]
fn config_file_overrides_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    let path = data.write_file("tasktrack.toml", "items_per_page = 7\nlog_level = \"error\"\n")?;

    let output = tasktrack_cmd()
        .args(["--env", "development", "--config"])
        .arg(&path)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["data"]["environment"], "development");
    assert_eq!(value["data"]["debug"], true);
    assert_eq!(value["data"]["items_per_page"], 7);
    assert_eq!(value["data"]["log_level"], "error");
    assert_eq!(value["data"]["data_dir"], "./data/dev");
    Ok(())
}

#[test]
fn invalid_config_file_exits_with_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    let path = data.write_file("tasktrack.toml", "items_per_page = 0\n")?;

    let output = tasktrack_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "--json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "invalid_config");
    Ok(())
}

#[test]
fn debug_config_enables_logging_without_rust_log() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    data.cmd()
        .args(["--env", "development", "project", "new", "Logged", "--json"])
        .assert()
        .success()
        .stderr(contains("project created"));

    data.cmd()
        .args(["project", "new", "Silent", "--json"])
        .assert()
        .success()
        .stderr(predicates::str::is_empty());
    Ok(())
}

#[test]
fn error_envelope_names_nested_command() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    let output = data
        .cmd()
        .args(["--json", "project", "member", "add", "5", "bob"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["command"], "project member add");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], 2);
    assert_eq!(value["next_steps"][0], "tasktrack project list --all");
    assert!(value.get("data").is_none());
    Ok(())
}

#[test]
fn quiet_mode_still_reports_warnings() -> Result<(), Box<dyn std::error::Error>> {
    let data = support::TestData::new()?;
    data.cmd()
        .args(["-q", "project", "new", "Quiet", "--owner", "x!"])
        .assert()
        .success()
        .stdout(predicates::str::is_empty())
        .stderr(contains("warning:"));
    Ok(())
}
