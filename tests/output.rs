use tasktrack::error::{EntityKind, Error};
use tasktrack::output::{recovery_steps, HumanOutput};

#[test]
fn human_output_aligns_fields_and_lists_rows() {
    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", "4");
    human.push_summary("Priority", "high");
    human.push_summary("Archived", "");
    human.push_detail("subtask: draft outline");
    human.push_warning("due date is already in the past");
    human.push_next_step("tasktrack task start 4");

    let rendered = human.to_string();
    assert_eq!(
        rendered,
        "Task created\n  ID        4\n  Priority  high\n  Archived\n\n  subtask: draft outline\n\nnext: tasktrack task start 4"
    );
    assert!(!rendered.contains("due date"));
    assert_eq!(human.warnings(), ["due date is already in the past".to_string()]);
}

#[test]
fn human_output_with_title_only() {
    let human = HumanOutput::new("Projects");
    assert_eq!(human.to_string(), "Projects");
}

#[test]
fn recovery_steps_point_at_listing_commands() {
    let missing_project = Error::NotFound {
        kind: EntityKind::Project,
        id: 3,
    };
    assert_eq!(
        recovery_steps("project show", &missing_project),
        vec!["tasktrack project list --all".to_string()]
    );
    assert_eq!(
        recovery_steps("task done", &Error::task_not_found(9)),
        vec!["tasktrack task list".to_string()]
    );
    assert_eq!(
        recovery_steps("task edit", &Error::InvalidArgument("no changes".to_string())),
        vec!["tasktrack task edit --help".to_string()]
    );
    assert!(recovery_steps("config show", &Error::Integrity("x".to_string()))[0]
        .contains("projects.json"));
}
