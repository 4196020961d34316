//! tasktrack project command implementations.

use serde::Serialize;

use crate::cli::{require_user, Context, SessionArgs};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::project::{Project, ProjectUpdate};
use crate::task::{Task, TaskStatus};
use crate::utils::{text, validate};

pub struct NewOptions {
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub all: bool,
    pub mine: bool,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct ShowOptions {
    pub id: u64,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct EditOptions {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct ArchiveOptions {
    pub id: u64,
    pub archived: bool,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct MemberOptions {
    pub id: u64,
    pub name: String,
    pub remove: bool,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct ProjectListOutput<'a> {
    total: usize,
    projects: Vec<&'a Project>,
}

#[derive(Serialize)]
struct ProjectShowOutput<'a> {
    project: &'a Project,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct ProjectChangeOutput {
    id: u64,
    archived: bool,
    changed: bool,
}

#[derive(Serialize)]
struct MemberChangeOutput {
    id: u64,
    member: String,
    changed: bool,
    members: Vec<String>,
}

#[derive(Serialize)]
struct ProjectRemovedOutput {
    id: u64,
    name: String,
    removed_tasks: usize,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let project = manager.create_project(
        &options.name,
        options.description.as_deref().unwrap_or_default(),
        options.owner.as_deref(),
    )?;

    let mut human = HumanOutput::new("Project created");
    push_project_summary(&mut human, &project);
    human.push_summary("Slug", text::to_slug(&project.name));
    if !validate::is_valid_username(&project.owner) {
        human.push_warning(format!(
            "owner '{}' is not a valid username (3-20 letters, digits or underscores)",
            project.owner
        ));
    }
    human.push_next_step(format!(
        "tasktrack task new <title> --project {}",
        project.id
    ));
    emit_success(options.output, "project new", &project, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, manager) = ctx.split()?;
    let projects: Vec<&Project> = if options.mine {
        require_user(&manager)?;
        manager
            .get_my_projects()
            .into_iter()
            .filter(|project| options.all || !project.archived)
            .collect()
    } else {
        manager.list_projects(options.all)
    };

    let mut human = HumanOutput::new("Projects");
    human.push_summary("Total", projects.len().to_string());
    if options.mine {
        if let Some(user) = manager.current_user() {
            human.push_summary("Owner", user.to_string());
        }
    }
    for project in &projects {
        let mut line = format!(
            "#{} {} (owner: {}, tasks: {})",
            project.id,
            text::truncate(&project.name, 50, "..."),
            project.owner,
            project.task_ids.len()
        );
        if project.archived {
            line.push_str(" [archived]");
        }
        human.push_detail(line);
    }

    let output = ProjectListOutput {
        total: projects.len(),
        projects,
    };
    emit_success(options.output, "project list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, manager) = ctx.split()?;
    let project = manager.get_project(options.id)?;
    let tasks = manager.store().tasks_for_project(options.id)?;

    let mut human = HumanOutput::new(format!("Project #{}", project.id));
    push_project_summary(&mut human, project);
    human.push_summary("Members", project.members.join(", "));
    human.push_summary("Archived", project.archived.to_string());
    human.push_summary("Created", project.created_at.to_rfc3339());
    human.push_summary("Updated", project.updated_at.to_rfc3339());
    for task in &tasks {
        human.push_detail(format!(
            "[{}][{}] #{} {}",
            task.status,
            task.priority,
            task.id,
            text::truncate(&task.title, 60, "...")
        ));
    }

    let output = ProjectShowOutput { project, tasks };
    emit_success(options.output, "project show", &output, Some(&human))
}

pub fn run_stats(options: ShowOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, manager) = ctx.split()?;
    let stats = manager.get_project_stats(options.id)?;

    let mut human = HumanOutput::new(format!(
        "Project #{} {}",
        stats.project_id, stats.project_name
    ));
    human.push_summary("Owner", stats.owner.clone());
    human.push_summary("Tasks", stats.total_tasks.to_string());
    human.push_summary("Completed", stats.completed_tasks.to_string());
    human.push_summary("Completion", format!("{}%", stats.completion_percentage));
    human.push_summary("Team size", stats.team_size.to_string());
    if stats.is_archived {
        human.push_summary("Archived", "");
    }
    for status in TaskStatus::ALL {
        let count = stats.status_breakdown.get(&status).copied().unwrap_or(0);
        human.push_detail(format!("{}: {count}", status_label(status)));
    }
    emit_success(options.output, "project stats", &stats, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let update = ProjectUpdate {
        name: options.name,
        description: options.description,
        owner: options.owner,
        ..ProjectUpdate::default()
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "no changes specified (use --name, --description or --owner)".to_string(),
        ));
    }

    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let project = manager.update_project(options.id, update)?;

    let mut human = HumanOutput::new("Project updated");
    push_project_summary(&mut human, &project);
    emit_success(options.output, "project edit", &project, Some(&human))
}

pub fn run_archive(options: ArchiveOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let changed = if options.archived {
        manager.archive_project(options.id)?
    } else {
        manager.unarchive_project(options.id)?
    };

    let title = match (options.archived, changed) {
        (true, true) => "Project archived",
        (true, false) => "Project already archived",
        (false, true) => "Project unarchived",
        (false, false) => "Project already active",
    };
    let mut human = HumanOutput::new(title);
    human.push_summary("ID", options.id.to_string());

    let output = ProjectChangeOutput {
        id: options.id,
        archived: options.archived,
        changed,
    };
    emit_success(
        options.output,
        if options.archived {
            "project archive"
        } else {
            "project unarchive"
        },
        &output,
        Some(&human),
    )
}

pub fn run_member(options: MemberOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let member = options.name.trim().to_string();
    let changed = if options.remove {
        manager.remove_team_member(options.id, &member)?
    } else {
        manager.add_team_member(options.id, &member)?
    };
    let members = manager.get_project(options.id)?.members.clone();

    let title = match (options.remove, changed) {
        (false, true) => "Member added",
        (false, false) => "Already a member",
        (true, true) => "Member removed",
        (true, false) => "Not a member",
    };
    let mut human = HumanOutput::new(title);
    human.push_summary("Project", options.id.to_string());
    human.push_summary("Member", member.clone());
    human.push_summary("Members", members.join(", "));
    if !options.remove && !validate::is_valid_username(&member) {
        human.push_warning(format!(
            "'{member}' is not a valid username (3-20 letters, digits or underscores)"
        ));
    }

    let output = MemberChangeOutput {
        id: options.id,
        member,
        changed,
        members,
    };
    emit_success(
        options.output,
        if options.remove {
            "project member rm"
        } else {
            "project member add"
        },
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: ShowOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let project = manager.delete_project(options.id)?;

    let output = ProjectRemovedOutput {
        id: project.id,
        name: project.name,
        removed_tasks: project.task_ids.len(),
    };
    let mut human = HumanOutput::new("Project deleted");
    human.push_summary("ID", output.id.to_string());
    human.push_summary("Name", output.name.clone());
    human.push_summary("Tasks removed", output.removed_tasks.to_string());
    emit_success(options.output, "project rm", &output, Some(&human))
}

fn push_project_summary(human: &mut HumanOutput, project: &Project) {
    human.push_summary("ID", project.id.to_string());
    human.push_summary("Name", project.name.clone());
    human.push_summary("Owner", project.owner.clone());
    if !project.description.is_empty() {
        human.push_summary("Description", project.description.clone());
    }
}

fn status_label(status: TaskStatus) -> String {
    text::capitalize_words(&status.as_str().replace('_', " "))
}
