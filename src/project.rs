//! Project records for tasktrack.
//!
//! Projects own an ordered list of task ids and a small member roster. The
//! owner is always the first member and cannot be removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{normalize_tags, Task, TaskStatus};
use crate::utils;

/// Upper bound on the member roster, owner included.
pub const MAX_MEMBERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub task_ids: Vec<u64>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub(crate) fn new(id: u64, name: &str, description: &str, owner: &str) -> Self {
        let now = Utc::now();
        let owner = owner.trim().to_string();
        Self {
            id,
            name: name.trim().to_string(),
            description: description.to_string(),
            members: vec![owner.clone()],
            owner,
            task_ids: Vec::new(),
            archived: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|member| member == name)
    }

    /// Returns false when `name` is already a member.
    pub fn add_member(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("member name cannot be empty".to_string()));
        }
        if self.has_member(name) {
            return Ok(false);
        }
        if self.members.len() >= MAX_MEMBERS {
            return Err(Error::Validation(format!(
                "project {} already has the maximum of {MAX_MEMBERS} members",
                self.id
            )));
        }
        self.members.push(name.to_string());
        self.touch();
        Ok(true)
    }

    /// Returns false when `name` was not a member.
    pub fn remove_member(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name == self.owner {
            return Err(Error::Validation(format!(
                "cannot remove owner '{name}' from project {}",
                self.id
            )));
        }
        let before = self.members.len();
        self.members.retain(|member| member != name);
        let removed = self.members.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub(crate) fn attach_task(&mut self, task_id: u64) {
        if !self.task_ids.contains(&task_id) {
            self.task_ids.push(task_id);
        }
    }

    pub(crate) fn detach_task(&mut self, task_id: u64) {
        self.task_ids.retain(|id| *id != task_id);
    }

    /// Owner first, duplicates dropped; used after loading and editing.
    pub(crate) fn normalize_members(&mut self) {
        let mut members = Vec::with_capacity(self.members.len() + 1);
        members.push(self.owner.clone());
        members.extend(self.members.drain(..));
        self.members = utils::list::unique(members);
    }
}

/// Share of completed tasks, in `[0.0, 1.0]`; zero for an empty project.
pub fn completion_rate<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    let mut total = 0usize;
    let mut completed = 0usize;
    for task in tasks {
        total += 1;
        if task.status == TaskStatus::Completed {
            completed += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    }
}

/// Partial update of a project. Task membership is not editable here; it
/// follows task creation, deletion and moves.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub members: Option<Vec<String>>,
    pub archived: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl ProjectUpdate {
    /// Parse a JSON object patch. Unknown fields, `id` included, are rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| Error::Validation(format!("invalid project update: {err}")))
    }

    pub fn is_empty(&self) -> bool {
        *self == ProjectUpdate::default()
    }

    /// Check the update against the project it will be applied to.
    pub(crate) fn validate(&self, project: &Project) -> Result<()> {
        if let Some(name) = self.name.as_deref() {
            if name.trim().is_empty() {
                return Err(Error::Validation("project name cannot be empty".to_string()));
            }
        }
        if let Some(owner) = self.owner.as_deref() {
            if owner.trim().is_empty() {
                return Err(Error::Validation("project owner cannot be empty".to_string()));
            }
        }
        let roster = self.roster(project);
        if roster.len() > MAX_MEMBERS {
            return Err(Error::Validation(format!(
                "project {} would have {} members; the maximum is {MAX_MEMBERS}",
                project.id,
                roster.len()
            )));
        }
        Ok(())
    }

    /// Members after the update: the new owner first, then the given or
    /// current members without duplicates.
    fn roster(&self, project: &Project) -> Vec<String> {
        let owner = self
            .owner
            .as_deref()
            .map_or(project.owner.as_str(), str::trim);
        let members = self.members.as_ref().unwrap_or(&project.members);

        let mut roster = vec![owner.to_string()];
        roster.extend(
            members
                .iter()
                .map(|member| member.trim().to_string())
                .filter(|member| !member.is_empty()),
        );
        utils::list::unique(roster)
    }

    pub(crate) fn apply(self, project: &mut Project) {
        let members = self.roster(project);
        if let Some(name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(owner) = self.owner {
            project.owner = owner.trim().to_string();
        }
        if let Some(archived) = self.archived {
            project.archived = archived;
        }
        if let Some(tags) = self.tags {
            project.tags = normalize_tags(tags);
        }
        project.members = members;
        project.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use serde_json::json;

    fn sample() -> Project {
        Project::new(1, "Test Project", "A test project", "alice")
    }

    #[test]
    fn owner_is_first_member() {
        let project = sample();
        assert_eq!(project.owner, "alice");
        assert_eq!(project.members, vec!["alice".to_string()]);
        assert!(!project.archived);
        assert!(project.task_ids.is_empty());
    }

    #[test]
    fn add_member_skips_duplicates() {
        let mut project = sample();
        assert!(project.add_member("bob").unwrap());
        assert!(!project.add_member("bob").unwrap());
        assert!(!project.add_member("alice").unwrap());
        assert_eq!(project.members, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn add_member_respects_limit() {
        let mut project = sample();
        for i in 1..MAX_MEMBERS {
            project.add_member(&format!("user{i}")).unwrap();
        }
        assert_eq!(project.members.len(), MAX_MEMBERS);
        let err = project.add_member("one_too_many").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn owner_cannot_be_removed() {
        let mut project = sample();
        project.add_member("bob").unwrap();
        assert!(project.remove_member("bob").unwrap());
        assert!(!project.remove_member("bob").unwrap());
        assert!(matches!(
            project.remove_member("alice"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn completion_rate_handles_empty_and_partial() {
        assert_eq!(completion_rate(Vec::<&Task>::new()), 0.0);

        let mut tasks: Vec<Task> = (1..=4)
            .map(|id| Task::new(id, NewTask::new(format!("t{id}"), 1)))
            .collect();
        tasks[0].mark_completed();
        assert!((completion_rate(&tasks) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn update_keeps_owner_in_members() {
        let mut project = sample();
        let update = ProjectUpdate::from_json(json!({
            "owner": "bob",
            "members": ["carol", "carol"]
        }))
        .unwrap();
        update.validate(&project).unwrap();
        update.apply(&mut project);
        assert_eq!(project.owner, "bob");
        assert_eq!(project.members, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn update_rejects_unknown_and_task_fields() {
        assert!(ProjectUpdate::from_json(json!({ "task_ids": [1] })).is_err());
        assert!(ProjectUpdate::from_json(json!({ "budget": 10 })).is_err());
        let update = ProjectUpdate {
            name: Some(" ".to_string()),
            ..ProjectUpdate::default()
        };
        assert!(matches!(update.validate(&sample()), Err(Error::Validation(_))));
    }

    #[test]
    fn owner_change_on_full_roster_is_rejected() {
        let mut project = sample();
        for i in 1..MAX_MEMBERS {
            project.add_member(&format!("member{i}")).unwrap();
        }
        assert_eq!(project.members.len(), MAX_MEMBERS);

        let newcomer = ProjectUpdate {
            owner: Some("zed".to_string()),
            ..ProjectUpdate::default()
        };
        assert!(matches!(newcomer.validate(&project), Err(Error::Validation(_))));

        let promoted = ProjectUpdate {
            owner: Some("member3".to_string()),
            ..ProjectUpdate::default()
        };
        promoted.validate(&project).unwrap();
        promoted.apply(&mut project);
        assert_eq!(project.members.len(), MAX_MEMBERS);
        assert_eq!(project.members[0], "member3");
        assert!(project.has_member("alice"));
    }
}
