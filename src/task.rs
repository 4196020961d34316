//! Task records for tasktrack.
//!
//! A task always belongs to exactly one project. Identifiers are handed out by
//! the [`Store`](crate::storage::Store); everything here is plain data plus the
//! small state transitions the Manager builds on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::utils;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Archived => "archived",
        }
    }

    /// Completed and archived tasks no longer count as open work.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Archived)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "archived" => Ok(TaskStatus::Archived),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{}': must be todo, in_progress, completed, or archived",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            _ => Err(Error::InvalidArgument(format!(
                "invalid priority '{}': must be low, medium, high, or critical",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project_id: u64,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl Task {
    pub(crate) fn new(id: u64, input: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            project_id: input.project_id,
            status: TaskStatus::Todo,
            priority: input.priority,
            assigned_to: None,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
            tags: normalize_tags(input.tags),
            subtasks: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn mark_in_progress(&mut self) {
        self.set_status(TaskStatus::InProgress);
    }

    /// Completing a completed task only refreshes `updated_at`.
    pub fn mark_completed(&mut self) {
        self.set_status(TaskStatus::Completed);
    }

    /// `completed_at` is set on entering `Completed`, kept while the task
    /// stays there and cleared when it leaves.
    pub fn set_status(&mut self, status: TaskStatus) {
        let now = Utc::now();
        self.completed_at = match (self.status, status) {
            (TaskStatus::Completed, TaskStatus::Completed) => self.completed_at.or(Some(now)),
            (_, TaskStatus::Completed) => Some(now),
            _ => None,
        };
        self.status = status;
        self.updated_at = now;
    }

    pub fn assign_to(&mut self, user: &str) {
        self.assigned_to = Some(user.trim().to_string());
        self.touch();
    }

    pub fn unassign(&mut self) {
        self.assigned_to = None;
        self.touch();
    }

    pub fn add_subtask(&mut self, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("subtask title cannot be empty".to_string()));
        }
        self.subtasks.push(title.to_string());
        self.touch();
        Ok(())
    }

    /// Returns false when the tag was already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::Validation("tag cannot be empty".to_string()));
        }
        if self.has_tag(tag) {
            return Ok(false);
        }
        self.tags.push(tag.to_string());
        self.touch();
        Ok(true)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }

    pub fn is_assigned_to(&self, user: &str) -> bool {
        self.assigned_to.as_deref() == Some(user)
    }

    /// Due strictly before `today` and still open.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => !self.status.is_closed() && utils::date::is_overdue(due, today),
            None => false,
        }
    }

    /// `needle` must already be lowercased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .assigned_to
                .as_deref()
                .map(|user| user.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

/// Input for [`Store::create_task`](crate::storage::Store::create_task).
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_id: u64,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, project_id: u64) -> Self {
        Self {
            title: title.into(),
            project_id,
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update of a task. `None` leaves a field untouched; for the
/// nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<u64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub subtasks: Option<Vec<String>>,
}

impl TaskUpdate {
    /// Parse a JSON object patch. Unknown fields, `id` included, are rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| Error::Validation(format!("invalid task update: {err}")))
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }

    /// Check the update before anything is mutated.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(title) = self.title.as_deref() {
            if title.trim().is_empty() {
                return Err(Error::Validation("task title cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Apply every field except `project_id`, which the store handles
    /// because it touches two projects.
    pub(crate) fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            if status != task.status {
                task.set_status(status);
            }
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to
                .map(|user| user.trim().to_string())
                .filter(|user| !user.is_empty());
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
        task.touch();
    }
}

pub(crate) fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let trimmed: Vec<String> = tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    utils::list::unique(trimmed)
}
