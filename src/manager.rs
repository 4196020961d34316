//! Session-aware orchestration over a [`Store`].
//!
//! The manager borrows one store for its whole lifetime and adds the notion
//! of a current user. All writes go through the store; all derived views
//! (ownership, overdue-ness, statistics, search) live here.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::project::{completion_rate, Project, ProjectUpdate};
use crate::storage::Store;
use crate::task::{NewTask, Task, TaskPriority, TaskStatus, TaskUpdate};
use crate::utils;

/// Lowest priority reported by [`Manager::get_high_priority_tasks`].
pub const HIGH_PRIORITY_THRESHOLD: TaskPriority = TaskPriority::High;

/// Owner recorded when neither an explicit owner nor a current user is known.
pub const DEFAULT_OWNER: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub project_id: u64,
    pub project_name: String,
    pub owner: String,
    pub is_archived: bool,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub todo_tasks: usize,
    /// Rounded to the nearest whole percent; 0 for a project without tasks.
    pub completion_percentage: u32,
    pub status_breakdown: BTreeMap<TaskStatus, usize>,
    pub team_size: usize,
}

/// Attribute filter for [`Manager::list_tasks`]. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<u64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    pub tag: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.map_or(true, |id| task.project_id == id)
            && self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
            && self
                .assignee
                .as_deref()
                .map_or(true, |user| task.is_assigned_to(user))
            && self.tag.as_deref().map_or(true, |tag| task.has_tag(tag))
    }
}

pub struct Manager<'a> {
    store: &'a mut Store,
    current_user: Option<String>,
}

impl<'a> Manager<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self {
            store,
            current_user: None,
        }
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn set_current_user(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("user name cannot be empty".to_string()));
        }
        debug!(user = name, "current user set");
        self.current_user = Some(name.to_string());
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Owner falls back to the current user, then to [`DEFAULT_OWNER`].
    pub fn create_project(
        &mut self,
        name: &str,
        description: &str,
        owner: Option<&str>,
    ) -> Result<Project> {
        let owner = owner
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .or(self.current_user.as_deref())
            .unwrap_or(DEFAULT_OWNER)
            .to_string();
        self.store.create_project(name, description, &owner)
    }

    pub fn get_project(&self, id: u64) -> Result<&Project> {
        self.store
            .get_project(id)
            .ok_or_else(|| Error::project_not_found(id))
    }

    pub fn list_projects(&self, include_archived: bool) -> Vec<&Project> {
        self.store
            .projects()
            .filter(|project| include_archived || !project.archived)
            .collect()
    }

    pub fn update_project(&mut self, id: u64, update: ProjectUpdate) -> Result<Project> {
        self.store.update_project(id, update)
    }

    /// Returns false when the member was already on the roster.
    pub fn add_team_member(&mut self, project_id: u64, member: &str) -> Result<bool> {
        self.store
            .modify_project(project_id, |project| project.add_member(member))
    }

    pub fn remove_team_member(&mut self, project_id: u64, member: &str) -> Result<bool> {
        self.store
            .modify_project(project_id, |project| project.remove_member(member))
    }

    /// Returns false when the project was already archived.
    pub fn archive_project(&mut self, project_id: u64) -> Result<bool> {
        self.set_archived(project_id, true)
    }

    pub fn unarchive_project(&mut self, project_id: u64) -> Result<bool> {
        self.set_archived(project_id, false)
    }

    fn set_archived(&mut self, project_id: u64, archived: bool) -> Result<bool> {
        self.store.modify_project(project_id, |project| {
            if project.archived == archived {
                return Ok(false);
            }
            project.archived = archived;
            project.touch();
            Ok(true)
        })
    }

    pub fn delete_project(&mut self, project_id: u64) -> Result<Project> {
        self.store.delete_project(project_id)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Priority defaults to [`TaskPriority::Medium`]. New tasks are unassigned.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        project_id: u64,
        priority: Option<TaskPriority>,
        due_date: Option<NaiveDate>,
    ) -> Result<Task> {
        self.store.create_task(
            NewTask::new(title, project_id)
                .description(description)
                .priority(priority.unwrap_or_default())
                .due_date(due_date),
        )
    }

    /// Full-control variant taking a prepared [`NewTask`].
    pub fn create_task_with(&mut self, input: NewTask) -> Result<Task> {
        self.store.create_task(input)
    }

    pub fn get_task(&self, id: u64) -> Result<&Task> {
        self.store.get_task(id).ok_or_else(|| Error::task_not_found(id))
    }

    pub fn update_task(&mut self, id: u64, update: TaskUpdate) -> Result<Task> {
        self.store.update_task(id, update)
    }

    pub fn start_task(&mut self, task_id: u64) -> Result<Task> {
        self.store.modify_task(task_id, |task| {
            task.mark_in_progress();
            Ok(task.clone())
        })
    }

    /// Completing an already completed task is not an error.
    pub fn complete_task(&mut self, task_id: u64) -> Result<Task> {
        self.store.modify_task(task_id, |task| {
            task.mark_completed();
            Ok(task.clone())
        })
    }

    /// Any name is accepted; assignment is not limited to project members.
    pub fn assign_task(&mut self, task_id: u64, user: &str) -> Result<Task> {
        let user = user.trim();
        if user.is_empty() {
            return Err(Error::Validation("assignee cannot be empty".to_string()));
        }
        self.store.modify_task(task_id, |task| {
            task.assign_to(user);
            Ok(task.clone())
        })
    }

    pub fn unassign_task(&mut self, task_id: u64) -> Result<Task> {
        self.store.modify_task(task_id, |task| {
            task.unassign();
            Ok(task.clone())
        })
    }

    pub fn add_subtask(&mut self, task_id: u64, title: &str) -> Result<Task> {
        self.store.modify_task(task_id, |task| {
            task.add_subtask(title)?;
            Ok(task.clone())
        })
    }

    /// Returns false when the task already carried the tag.
    pub fn tag_task(&mut self, task_id: u64, tag: &str) -> Result<bool> {
        self.store.modify_task(task_id, |task| task.add_tag(tag))
    }

    pub fn delete_task(&mut self, task_id: u64) -> Result<Task> {
        self.store.delete_task(task_id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Projects owned by the current user; empty when no user is set.
    pub fn get_my_projects(&self) -> Vec<&Project> {
        match self.current_user.as_deref() {
            Some(user) => self
                .store
                .projects()
                .filter(|project| project.owner == user)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Tasks assigned to the current user; empty when no user is set.
    pub fn get_my_tasks(&self) -> Vec<&Task> {
        match self.current_user.as_deref() {
            Some(user) => self
                .store
                .tasks()
                .filter(|task| task.is_assigned_to(user))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Open tasks at or above [`HIGH_PRIORITY_THRESHOLD`].
    pub fn get_high_priority_tasks(&self) -> Vec<&Task> {
        self.store
            .tasks()
            .filter(|task| task.priority >= HIGH_PRIORITY_THRESHOLD && !task.status.is_closed())
            .collect()
    }

    pub fn get_overdue_tasks(&self) -> Vec<&Task> {
        self.get_overdue_tasks_as_of(utils::date::today())
    }

    /// Open tasks whose due date is strictly before `today`.
    pub fn get_overdue_tasks_as_of(&self, today: NaiveDate) -> Vec<&Task> {
        self.store
            .tasks()
            .filter(|task| task.is_overdue_on(today))
            .collect()
    }

    pub fn get_tasks_due_on(&self, day: NaiveDate) -> Vec<&Task> {
        self.store
            .tasks()
            .filter(|task| {
                !task.status.is_closed()
                    && task
                        .due_date
                        .map_or(false, |due| utils::date::is_due_today(due, day))
            })
            .collect()
    }

    pub fn get_tasks_due_today(&self) -> Vec<&Task> {
        self.get_tasks_due_on(utils::date::today())
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.store.tasks().filter(|task| filter.matches(task)).collect()
    }

    /// Case-insensitive substring search over title, description and
    /// assignee. A blank keyword matches nothing.
    pub fn search_tasks(&self, keyword: &str) -> Vec<&Task> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.store
            .tasks()
            .filter(|task| task.matches_keyword(&needle))
            .collect()
    }

    pub fn search_tasks_by_tag(&self, tag: &str) -> Vec<&Task> {
        if tag.trim().is_empty() {
            return Vec::new();
        }
        self.store.tasks().filter(|task| task.has_tag(tag)).collect()
    }

    pub fn get_project_stats(&self, project_id: u64) -> Result<ProjectStats> {
        let project = self.get_project(project_id)?;
        let tasks = self.store.tasks_for_project(project_id)?;

        let mut status_breakdown: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for task in &tasks {
            *status_breakdown.entry(task.status).or_insert(0) += 1;
        }
        let count = |status: TaskStatus| status_breakdown.get(&status).copied().unwrap_or(0);

        Ok(ProjectStats {
            project_id,
            project_name: project.name.clone(),
            owner: project.owner.clone(),
            is_archived: project.archived,
            total_tasks: tasks.len(),
            completed_tasks: count(TaskStatus::Completed),
            in_progress_tasks: count(TaskStatus::InProgress),
            todo_tasks: count(TaskStatus::Todo),
            completion_percentage: (completion_rate(tasks.iter().copied()) * 100.0).round() as u32,
            team_size: project.members.len(),
            status_breakdown,
        })
    }
}
