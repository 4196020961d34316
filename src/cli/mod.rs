//! Command-line interface for tasktrack
//!
//! This module defines the CLI structure using clap derive macros.
//! Project and task commands live in their own submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{Config, Environment};
use crate::error::Result;
use crate::manager::Manager;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Store;

mod project;
mod task;

/// tasktrack - projects and tasks from the terminal
///
/// Tracks projects, their members and tasks with status, priority,
/// assignee, due date, tags and subtasks. Data is kept as JSON files in a
/// data directory.
#[derive(Parser, Debug)]
#[command(name = "tasktrack")]
#[command(author, version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration environment: development, testing, production
    #[arg(long, global = true, env = "TASKTRACK_ENV", default_value = "production")]
    pub env: String,

    /// TOML file overriding the environment defaults
    #[arg(long, global = true, env = "TASKTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configured one)
    #[arg(long, global = true, env = "TASKTRACK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Current user for ownership and "mine" queries
    #[arg(long, global = true, env = "TASKTRACK_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    New {
        /// Project name
        name: String,

        /// Project description
        #[arg(long)]
        description: Option<String>,

        /// Owner (defaults to the current user)
        #[arg(long)]
        owner: Option<String>,
    },

    /// List projects
    List {
        /// Include archived projects
        #[arg(long)]
        all: bool,

        /// Only projects owned by the current user
        #[arg(long)]
        mine: bool,
    },

    /// Show a project
    Show {
        /// Project id
        id: u64,
    },

    /// Show completion statistics for a project
    Stats {
        /// Project id
        id: u64,
    },

    /// Edit project fields
    Edit {
        /// Project id
        id: u64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New owner
        #[arg(long)]
        owner: Option<String>,
    },

    /// Archive a project
    Archive {
        /// Project id
        id: u64,
    },

    /// Unarchive a project
    Unarchive {
        /// Project id
        id: u64,
    },

    /// Team member management
    #[command(subcommand)]
    Member(MemberCommands),

    /// Delete a project and all of its tasks
    Rm {
        /// Project id
        id: u64,
    },
}

/// Project member subcommands
#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// Add a team member
    Add {
        /// Project id
        id: u64,

        /// Member name
        name: String,
    },

    /// Remove a team member
    Rm {
        /// Project id
        id: u64,

        /// Member name
        name: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        /// Owning project id
        #[arg(long)]
        project: u64,

        /// Task description
        #[arg(long)]
        description: Option<String>,

        /// Priority: low, medium, high, critical
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tasks
    List {
        /// Filter by project id
        #[arg(long)]
        project: Option<u64>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,

        /// Filter by assignee
        #[arg(long, conflicts_with = "mine")]
        assignee: Option<String>,

        /// Only tasks assigned to the current user
        #[arg(long)]
        mine: bool,

        /// Page number (1-based), sized by items_per_page
        #[arg(long)]
        page: Option<usize>,
    },

    /// Show a task
    Show {
        /// Task id
        id: u64,
    },

    /// Mark a task in progress
    Start {
        /// Task id
        id: u64,
    },

    /// Mark a task completed
    Done {
        /// Task id
        id: u64,
    },

    /// Assign a task
    Assign {
        /// Task id
        id: u64,

        /// Assignee name
        user: String,
    },

    /// Clear a task's assignee
    Unassign {
        /// Task id
        id: u64,
    },

    /// Edit task fields
    Edit {
        /// Task id
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// Move the task to another project
        #[arg(long)]
        project: Option<u64>,

        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Append a subtask
    Subtask {
        /// Task id
        id: u64,

        /// Subtask title
        title: String,
    },

    /// Add a tag
    Tag {
        /// Task id
        id: u64,

        /// Tag
        tag: String,
    },

    /// Search tasks by keyword or tag
    Search {
        /// Keyword matched against title, description and assignee
        #[arg(required_unless_present = "tag", conflicts_with = "tag")]
        keyword: Option<String>,

        /// Exact tag (case-insensitive)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Open tasks past their due date
    Overdue,

    /// Open high and critical priority tasks
    Urgent,

    /// Open tasks due today
    Today,

    /// Delete a task
    Rm {
        /// Task id
        id: u64,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,
}

impl Commands {
    /// Name reported in the `command` field of output envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Project(cmd) => match cmd {
                ProjectCommands::New { .. } => "project new",
                ProjectCommands::List { .. } => "project list",
                ProjectCommands::Show { .. } => "project show",
                ProjectCommands::Stats { .. } => "project stats",
                ProjectCommands::Edit { .. } => "project edit",
                ProjectCommands::Archive { .. } => "project archive",
                ProjectCommands::Unarchive { .. } => "project unarchive",
                ProjectCommands::Member(MemberCommands::Add { .. }) => "project member add",
                ProjectCommands::Member(MemberCommands::Rm { .. }) => "project member rm",
                ProjectCommands::Rm { .. } => "project rm",
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New { .. } => "task new",
                TaskCommands::List { .. } => "task list",
                TaskCommands::Show { .. } => "task show",
                TaskCommands::Start { .. } => "task start",
                TaskCommands::Done { .. } => "task done",
                TaskCommands::Assign { .. } => "task assign",
                TaskCommands::Unassign { .. } => "task unassign",
                TaskCommands::Edit { .. } => "task edit",
                TaskCommands::Subtask { .. } => "task subtask",
                TaskCommands::Tag { .. } => "task tag",
                TaskCommands::Search { .. } => "task search",
                TaskCommands::Overdue => "task overdue",
                TaskCommands::Urgent => "task urgent",
                TaskCommands::Today => "task today",
                TaskCommands::Rm { .. } => "task rm",
            },
            Commands::Config(ConfigCommands::Show) => "config show",
        }
    }
}

/// Global flags that select configuration, data and user
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub env: String,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
}

impl SessionArgs {
    fn resolve_config(&self) -> Result<Config> {
        let environment: Environment = self.env.parse()?;
        let mut config = Config::resolve(environment, self.config.as_deref())?;
        if let Some(data_dir) = self.data_dir.as_ref() {
            config.data_dir = data_dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Resolved configuration plus the opened store
pub(crate) struct Context {
    pub config: Config,
    pub store: Store,
    pub user: Option<String>,
}

impl Context {
    pub fn load(session: SessionArgs) -> Result<Self> {
        let config = session.resolve_config()?;
        debug!(
            environment = %config.environment,
            data_dir = %config.data_dir.display(),
            "opening store"
        );
        let store = Store::open(config.data_dir.clone())?;
        Ok(Self {
            config,
            store,
            user: session.user,
        })
    }

    /// Configuration alongside a manager bound to the store and user.
    pub fn split(&mut self) -> Result<(&Config, Manager<'_>)> {
        let mut manager = Manager::new(&mut self.store);
        if let Some(user) = self.user.as_deref() {
            manager.set_current_user(user)?;
        }
        Ok((&self.config, manager))
    }
}

impl Cli {
    fn session(&self) -> SessionArgs {
        SessionArgs {
            env: self.env.clone(),
            config: self.config.clone(),
            data_dir: self.data_dir.clone(),
            user: self.user.clone(),
        }
    }

    /// Tracing filter for when `RUST_LOG` is unset. Configuration errors are
    /// reported by the command itself, so they fall back to `off` here.
    pub fn default_log_filter(&self) -> String {
        self.session()
            .resolve_config()
            .map(|config| config.log_filter().to_string())
            .unwrap_or_else(|_| "off".to_string())
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let session = self.session();
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Project(cmd) => match cmd {
                ProjectCommands::New {
                    name,
                    description,
                    owner,
                } => project::run_new(project::NewOptions {
                    name,
                    description,
                    owner,
                    session,
                    output,
                }),
                ProjectCommands::List { all, mine } => project::run_list(project::ListOptions {
                    all,
                    mine,
                    session,
                    output,
                }),
                ProjectCommands::Show { id } => project::run_show(project::ShowOptions {
                    id,
                    session,
                    output,
                }),
                ProjectCommands::Stats { id } => project::run_stats(project::ShowOptions {
                    id,
                    session,
                    output,
                }),
                ProjectCommands::Edit {
                    id,
                    name,
                    description,
                    owner,
                } => project::run_edit(project::EditOptions {
                    id,
                    name,
                    description,
                    owner,
                    session,
                    output,
                }),
                ProjectCommands::Archive { id } => {
                    project::run_archive(project::ArchiveOptions {
                        id,
                        archived: true,
                        session,
                        output,
                    })
                }
                ProjectCommands::Unarchive { id } => {
                    project::run_archive(project::ArchiveOptions {
                        id,
                        archived: false,
                        session,
                        output,
                    })
                }
                ProjectCommands::Member(member) => match member {
                    MemberCommands::Add { id, name } => {
                        project::run_member(project::MemberOptions {
                            id,
                            name,
                            remove: false,
                            session,
                            output,
                        })
                    }
                    MemberCommands::Rm { id, name } => {
                        project::run_member(project::MemberOptions {
                            id,
                            name,
                            remove: true,
                            session,
                            output,
                        })
                    }
                },
                ProjectCommands::Rm { id } => project::run_rm(project::ShowOptions {
                    id,
                    session,
                    output,
                }),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    project,
                    description,
                    priority,
                    due,
                    tags,
                } => task::run_new(task::NewOptions {
                    title,
                    project,
                    description,
                    priority,
                    due,
                    tags,
                    session,
                    output,
                }),
                TaskCommands::List {
                    project,
                    status,
                    priority,
                    assignee,
                    mine,
                    page,
                } => task::run_list(task::ListOptions {
                    project,
                    status,
                    priority,
                    assignee,
                    mine,
                    page,
                    session,
                    output,
                }),
                TaskCommands::Show { id } => task::run_show(task::IdOptions {
                    id,
                    session,
                    output,
                }),
                TaskCommands::Start { id } => task::run_start(task::IdOptions {
                    id,
                    session,
                    output,
                }),
                TaskCommands::Done { id } => task::run_done(task::IdOptions {
                    id,
                    session,
                    output,
                }),
                TaskCommands::Assign { id, user } => task::run_assign(task::AssignOptions {
                    id,
                    user: Some(user),
                    session,
                    output,
                }),
                TaskCommands::Unassign { id } => task::run_assign(task::AssignOptions {
                    id,
                    user: None,
                    session,
                    output,
                }),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    status,
                    priority,
                    project,
                    due,
                    clear_due,
                } => task::run_edit(task::EditOptions {
                    id,
                    title,
                    description,
                    status,
                    priority,
                    project,
                    due,
                    clear_due,
                    session,
                    output,
                }),
                TaskCommands::Subtask { id, title } => task::run_subtask(task::TextOptions {
                    id,
                    text: title,
                    session,
                    output,
                }),
                TaskCommands::Tag { id, tag } => task::run_tag(task::TextOptions {
                    id,
                    text: tag,
                    session,
                    output,
                }),
                TaskCommands::Search { keyword, tag } => task::run_search(task::SearchOptions {
                    keyword,
                    tag,
                    session,
                    output,
                }),
                TaskCommands::Overdue => task::run_view(task::ViewOptions {
                    view: task::TaskView::Overdue,
                    session,
                    output,
                }),
                TaskCommands::Urgent => task::run_view(task::ViewOptions {
                    view: task::TaskView::Urgent,
                    session,
                    output,
                }),
                TaskCommands::Today => task::run_view(task::ViewOptions {
                    view: task::TaskView::Today,
                    session,
                    output,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::IdOptions {
                    id,
                    session,
                    output,
                }),
            },
            Commands::Config(ConfigCommands::Show) => run_config_show(session, output),
        }
    }
}

fn run_config_show(session: SessionArgs, output: OutputOptions) -> Result<()> {
    let config = session.resolve_config()?;
    let mut human = HumanOutput::new(format!("{} configuration", config.app_name));
    human.push_summary("Environment", config.environment.to_string());
    human.push_summary("Data dir", config.data_dir.display().to_string());
    human.push_summary("Debug", config.debug.to_string());
    human.push_summary("Log level", config.log_level.clone());
    human.push_summary("Notifications", config.notifications_enabled.to_string());
    human.push_summary("Items per page", config.items_per_page.to_string());
    human.push_summary("Date format", config.date_format.clone());
    if let Some(path) = session.config.as_ref() {
        human.push_detail(format!("loaded from {}", path.display()));
    }
    emit_success(output, "config show", &config, Some(&human))
}

/// Name of the current user, required by the `--mine` filters.
pub(crate) fn require_user<'m>(manager: &'m Manager<'_>) -> Result<&'m str> {
    manager.current_user().ok_or_else(|| {
        crate::error::Error::InvalidArgument(
            "--mine requires --user or TASKTRACK_USER".to_string(),
        )
    })
}
