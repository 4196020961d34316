mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestData;

#[test]
fn project_new_uses_current_user_as_owner() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let value = data.json_as("alice", &["project", "new", "Website Redesign"]);
    assert_eq!(value["command"], "project new");
    assert_eq!(value["data"]["id"], 1);
    assert_eq!(value["data"]["owner"], "alice");
    assert_eq!(value["data"]["members"], serde_json::json!(["alice"]));

    let anonymous = data.json(&["project", "new", "Backlog"]);
    assert_eq!(anonymous["data"]["id"], 2);
    assert_eq!(anonymous["data"]["owner"], "unknown");

    let explicit = data.json_as("alice", &["project", "new", "Ops", "--owner", "carol"]);
    assert_eq!(explicit["data"]["owner"], "carol");
    Ok(())
}

#[test]
fn project_new_rejects_blank_name() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let output = data
        .cmd()
        .args(["project", "new", "   ", "--json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "project new");
    assert_eq!(value["error"]["kind"], "validation");
    Ok(())
}

#[test]
fn list_hides_archived_unless_all() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let active = data.new_project("Active");
    let archived = data.new_project("Old");

    let value = data.json(&["project", "archive", &archived.to_string()]);
    assert_eq!(value["data"]["changed"], true);
    let again = data.json(&["project", "archive", &archived.to_string()]);
    assert_eq!(again["data"]["changed"], false);

    let list = data.json(&["project", "list"]);
    assert_eq!(list["data"]["total"], 1);
    assert_eq!(list["data"]["projects"][0]["id"], active);

    let all = data.json(&["project", "list", "--all"]);
    assert_eq!(all["data"]["total"], 2);

    data.json(&["project", "unarchive", &archived.to_string()]);
    let list = data.json(&["project", "list"]);
    assert_eq!(list["data"]["total"], 2);
    Ok(())
}

#[test]
fn list_mine_filters_by_owner() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    data.json_as("alice", &["project", "new", "A"]);
    data.json_as("bob", &["project", "new", "B"]);

    let mine = data.json_as("alice", &["project", "list", "--mine"]);
    assert_eq!(mine["data"]["total"], 1);
    assert_eq!(mine["data"]["projects"][0]["name"], "A");

    data.cmd()
        .args(["project", "list", "--mine"])
        .assert()
        .code(2)
        .stderr(contains("--mine requires"));
    Ok(())
}

#[test]
fn members_can_be_added_and_removed() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let id = data.new_project("Team").to_string();

    let added = data.json(&["project", "member", "add", &id, "bob"]);
    assert_eq!(added["command"], "project member add");
    assert_eq!(added["data"]["changed"], true);
    assert_eq!(added["data"]["members"], serde_json::json!(["unknown", "bob"]));

    let duplicate = data.json(&["project", "member", "add", &id, "bob"]);
    assert_eq!(duplicate["data"]["changed"], false);

    let removed = data.json(&["project", "member", "rm", &id, "bob"]);
    assert_eq!(removed["data"]["changed"], true);
    assert_eq!(removed["data"]["members"], serde_json::json!(["unknown"]));

    data.cmd()
        .args(["project", "member", "rm", &id, "unknown"])
        .assert()
        .code(2)
        .stderr(contains("cannot remove owner"));
    Ok(())
}

#[test]
fn edit_updates_fields_and_requires_a_change() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let id = data.new_project("Draft").to_string();

    let value = data.json(&[
        "project",
        "edit",
        &id,
        "--name",
        "Final",
        "--description",
        "Shipped",
    ]);
    assert_eq!(value["data"]["name"], "Final");
    assert_eq!(value["data"]["description"], "Shipped");

    data.cmd()
        .args(["project", "edit", &id])
        .assert()
        .code(2)
        .stderr(contains("no changes specified"));
    Ok(())
}

#[test]
fn stats_report_completion() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let project = data.new_project("Stats");
    let first = data.new_task(project, "one");
    for title in ["two", "three", "four"] {
        data.new_task(project, title);
    }
    data.json(&["task", "done", &first.to_string()]);

    let value = data.json(&["project", "stats", &project.to_string()]);
    assert_eq!(value["data"]["total_tasks"], 4);
    assert_eq!(value["data"]["completed_tasks"], 1);
    assert_eq!(value["data"]["completion_percentage"], 25);
    assert_eq!(value["data"]["status_breakdown"]["todo"], 3);
    assert_eq!(value["data"]["status_breakdown"]["in_progress"], 0);
    assert_eq!(value["data"]["team_size"], 1);
    Ok(())
}

#[test]
fn rm_cascades_to_tasks() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    let project = data.new_project("Doomed");
    let task = data.new_task(project, "Goes too");

    let value = data.json(&["project", "rm", &project.to_string()]);
    assert_eq!(value["data"]["removed_tasks"], 1);

    let output = data
        .cmd()
        .args(["task", "show", &task.to_string(), "--json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let error: Value = serde_json::from_slice(&output)?;
    assert_eq!(error["error"]["kind"], "not_found");
    assert_eq!(error["error"]["details"]["entity"], "task");
    assert_eq!(error["error"]["details"]["id"], task);

    let tasks = data.read_data_file("tasks.json")?;
    assert_eq!(tasks["tasks"], serde_json::json!([]));
    Ok(())
}

#[test]
fn show_unknown_project_suggests_listing() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new()?;
    data.cmd()
        .args(["project", "show", "99"])
        .assert()
        .code(2)
        .stderr(contains("project not found: 99"))
        .stderr(contains("tasktrack project list --all"));
    Ok(())
}
