//! tasktrack task command implementations.

use serde::Serialize;

use crate::cli::{require_user, Context, SessionArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::manager::{Manager, TaskFilter};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{NewTask, Task, TaskPriority, TaskStatus, TaskUpdate};
use crate::utils::{date, list, text, validate};

pub struct NewOptions {
    pub title: String,
    pub project: u64,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub project: Option<u64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub mine: bool,
    pub page: Option<usize>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct IdOptions {
    pub id: u64,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct AssignOptions {
    pub id: u64,
    /// `None` clears the assignee
    pub user: Option<String>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct EditOptions {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project: Option<u64>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct TextOptions {
    pub id: u64,
    pub text: String,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

pub struct SearchOptions {
    pub keyword: Option<String>,
    pub tag: Option<String>,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskView {
    Overdue,
    Urgent,
    Today,
}

pub struct ViewOptions {
    pub view: TaskView,
    pub session: SessionArgs,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<usize>,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct TaskShowOutput<'a> {
    #[serde(flatten)]
    task: &'a Task,
    project_name: &'a str,
    overdue: bool,
    days_until_due: Option<i64>,
}

#[derive(Serialize)]
struct TaskTagOutput {
    id: u64,
    tag: String,
    changed: bool,
    tags: Vec<String>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let priority = parse_priority(options.priority.as_deref())?;
    let due_date = options.due.as_deref().map(date::parse_date).transpose()?;

    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let task = if options.tags.is_empty() {
        manager.create_task(
            &options.title,
            options.description.as_deref().unwrap_or_default(),
            options.project,
            priority,
            due_date,
        )?
    } else {
        manager.create_task_with(
            NewTask::new(options.title, options.project)
                .description(options.description.unwrap_or_default())
                .priority(priority.unwrap_or_default())
                .due_date(due_date)
                .tags(options.tags),
        )?
    };

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &task, config)?;
    if let Some(due) = task.due_date {
        if date::is_overdue(due, date::today()) {
            human.push_warning("due date is already in the past");
        }
    }
    human.push_next_step(format!("tasktrack task start {}", task.id));
    emit_success(options.output, "task new", &task, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let status = parse_status(options.status.as_deref())?;
    let priority = parse_priority(options.priority.as_deref())?;
    if options.page == Some(0) {
        return Err(Error::InvalidArgument("--page starts at 1".to_string()));
    }

    let mut ctx = Context::load(options.session)?;
    let (config, manager) = ctx.split()?;
    let assignee = if options.mine {
        Some(require_user(&manager)?.to_string())
    } else {
        options.assignee
    };
    if let Some(project_id) = options.project {
        manager.get_project(project_id)?;
    }
    let filter = TaskFilter {
        project_id: options.project,
        status,
        priority,
        assignee,
        tag: None,
    };
    let tasks = manager.list_tasks(&filter);
    let total = tasks.len();

    let (tasks, pages) = match options.page {
        Some(page) => {
            let chunks = list::chunk(&tasks, config.items_per_page);
            let pages = chunks.len();
            let current = chunks.into_iter().nth(page - 1).unwrap_or_default();
            (current, Some(pages))
        }
        None => (tasks, None),
    };

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", total.to_string());
    if let (Some(page), Some(pages)) = (options.page, pages) {
        human.push_summary("Page", format!("{page}/{}", pages.max(1)));
    }
    if let Some(project_id) = filter.project_id {
        human.push_summary("Project", project_id.to_string());
    }
    if let Some(user) = filter.assignee.as_ref() {
        human.push_summary("Assignee", user.clone());
    }
    for task in &tasks {
        human.push_detail(task_line(task, config)?);
    }

    let output = TaskListOutput {
        total,
        page: options.page,
        pages,
        tasks,
    };
    emit_success(options.output, "task list", &output, Some(&human))
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, manager) = ctx.split()?;
    let task = manager.get_task(options.id)?;
    let project = manager.get_project(task.project_id)?;
    let today = date::today();

    let mut human = HumanOutput::new(format!("Task #{}", task.id));
    push_task_summary(&mut human, task, config)?;
    human.push_summary("Project", format!("#{} {}", project.id, project.name));
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    if !task.tags.is_empty() {
        human.push_summary("Tags", task.tags.join(", "));
    }
    human.push_summary("Created", task.created_at.to_rfc3339());
    if let Some(completed_at) = task.completed_at {
        human.push_summary("Completed", completed_at.to_rfc3339());
    }
    for subtask in &task.subtasks {
        human.push_detail(format!("subtask: {subtask}"));
    }

    let output = TaskShowOutput {
        task,
        project_name: &project.name,
        overdue: task.is_overdue_on(today),
        days_until_due: task.due_date.map(|due| date::days_until(due, today)),
    };
    emit_success(options.output, "task show", &output, Some(&human))
}

pub fn run_start(options: IdOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let before = manager.get_task(options.id)?.status;
    let task = manager.start_task(options.id)?;

    let mut human = HumanOutput::new(if before == TaskStatus::InProgress {
        "Task already in progress"
    } else {
        "Task started"
    });
    push_task_summary(&mut human, &task, config)?;
    human.push_next_step(format!("tasktrack task done {}", task.id));
    emit_success(options.output, "task start", &task, Some(&human))
}

pub fn run_done(options: IdOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let before = manager.get_task(options.id)?.status;
    let task = manager.complete_task(options.id)?;

    let mut human = HumanOutput::new(if before == TaskStatus::Completed {
        "Task already completed"
    } else {
        "Task completed"
    });
    push_task_summary(&mut human, &task, config)?;
    emit_success(options.output, "task done", &task, Some(&human))
}

pub fn run_assign(options: AssignOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;

    let (task, command) = match options.user.as_deref() {
        Some(user) => (manager.assign_task(options.id, user)?, "task assign"),
        None => (manager.unassign_task(options.id)?, "task unassign"),
    };

    let mut human = HumanOutput::new(if task.assigned_to.is_some() {
        "Task assigned"
    } else {
        "Task unassigned"
    });
    push_task_summary(&mut human, &task, config)?;
    if let Some(user) = task.assigned_to.as_deref() {
        if !validate::is_valid_username(user) {
            human.push_warning(format!(
                "'{user}' is not a valid username (3-20 letters, digits or underscores)"
            ));
        }
        let project = manager.get_project(task.project_id)?;
        if !project.has_member(user) {
            human.push_warning(format!(
                "'{user}' is not a member of project #{}",
                project.id
            ));
            human.push_next_step(format!(
                "tasktrack project member add {} {user}",
                project.id
            ));
        }
    }
    emit_success(options.output, command, &task, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(date::parse_date)
            .transpose()?
            .map(Some)
    };
    let update = TaskUpdate {
        title: options.title,
        description: options.description,
        project_id: options.project,
        status: parse_status(options.status.as_deref())?,
        priority: parse_priority(options.priority.as_deref())?,
        due_date,
        ..TaskUpdate::default()
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "no changes specified (see tasktrack task edit --help)".to_string(),
        ));
    }

    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let task = manager.update_task(options.id, update)?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &task, config)?;
    emit_success(options.output, "task edit", &task, Some(&human))
}

pub fn run_subtask(options: TextOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let task = manager.add_subtask(options.id, &options.text)?;

    let mut human = HumanOutput::new("Subtask added");
    push_task_summary(&mut human, &task, config)?;
    for subtask in &task.subtasks {
        human.push_detail(format!("subtask: {subtask}"));
    }
    emit_success(options.output, "task subtask", &task, Some(&human))
}

pub fn run_tag(options: TextOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (_, mut manager) = ctx.split()?;
    let changed = manager.tag_task(options.id, &options.text)?;
    let tags = manager.get_task(options.id)?.tags.clone();

    let mut human = HumanOutput::new(if changed {
        "Tag added"
    } else {
        "Tag already present"
    });
    human.push_summary("ID", options.id.to_string());
    human.push_summary("Tags", tags.join(", "));

    let output = TaskTagOutput {
        id: options.id,
        tag: options.text.trim().to_string(),
        changed,
        tags,
    };
    emit_success(options.output, "task tag", &output, Some(&human))
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, manager) = ctx.split()?;
    let (tasks, header) = match (options.tag.as_deref(), options.keyword.as_deref()) {
        (Some(tag), _) => (manager.search_tasks_by_tag(tag), format!("Tasks tagged '{tag}'")),
        (None, Some(keyword)) => (manager.search_tasks(keyword), format!("Tasks matching '{keyword}'")),
        (None, None) => {
            return Err(Error::InvalidArgument(
                "provide a keyword or --tag".to_string(),
            ))
        }
    };
    render_task_list(options.output, "task search", header, tasks, config)
}

pub fn run_view(options: ViewOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, manager) = ctx.split()?;
    let (tasks, header, command) = view_tasks(&manager, options.view);
    render_task_list(options.output, command, header.to_string(), tasks, config)
}

pub fn run_rm(options: IdOptions) -> Result<()> {
    let mut ctx = Context::load(options.session)?;
    let (config, mut manager) = ctx.split()?;
    let task = manager.delete_task(options.id)?;

    let mut human = HumanOutput::new("Task deleted");
    push_task_summary(&mut human, &task, config)?;
    emit_success(options.output, "task rm", &task, Some(&human))
}

fn view_tasks<'m>(
    manager: &'m Manager<'_>,
    view: TaskView,
) -> (Vec<&'m Task>, &'static str, &'static str) {
    match view {
        TaskView::Overdue => (manager.get_overdue_tasks(), "Overdue tasks", "task overdue"),
        TaskView::Urgent => (
            manager.get_high_priority_tasks(),
            "High priority tasks",
            "task urgent",
        ),
        TaskView::Today => (manager.get_tasks_due_today(), "Tasks due today", "task today"),
    }
}

fn render_task_list(
    output: OutputOptions,
    command: &str,
    header: String,
    tasks: Vec<&Task>,
    config: &Config,
) -> Result<()> {
    let mut human = HumanOutput::new(header);
    human.push_summary("Total", tasks.len().to_string());
    for task in &tasks {
        human.push_detail(task_line(task, config)?);
    }
    let data = TaskListOutput {
        total: tasks.len(),
        page: None,
        pages: None,
        tasks,
    };
    emit_success(output, command, &data, Some(&human))
}

fn push_task_summary(human: &mut HumanOutput, task: &Task, config: &Config) -> Result<()> {
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary(
        "Assignee",
        task.assigned_to.clone().unwrap_or_else(|| "-".to_string()),
    );
    if let Some(due) = task.due_date {
        human.push_summary("Due", date::format_date(due, &config.date_format)?);
    }
    Ok(())
}

fn task_line(task: &Task, config: &Config) -> Result<String> {
    let mut line = format!(
        "[{}][{}] #{} {}",
        task.status,
        task.priority,
        task.id,
        text::truncate(&task.title, 60, "...")
    );
    if let Some(user) = task.assigned_to.as_deref() {
        line.push_str(&format!(" (assignee: {user})"));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(
            " (due: {})",
            date::format_date(due, &config.date_format)?
        ));
        if task.is_overdue_on(date::today()) {
            line.push_str(" [overdue]");
        }
    }
    Ok(line)
}

fn parse_status(value: Option<&str>) -> Result<Option<TaskStatus>> {
    value.map(str::parse::<TaskStatus>).transpose()
}

fn parse_priority(value: Option<&str>) -> Result<Option<TaskPriority>> {
    value.map(str::parse::<TaskPriority>).transpose()
}
