//! Storage layer for tasktrack
//!
//! The [`Store`] owns the canonical project and task collections, hands out
//! identifiers and mirrors every change to disk before returning.
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/
//!   projects.json    # { schema_version, last_id, projects: [...] }
//!   tasks.json       # { schema_version, last_id, tasks: [...] }
//! ```
//!
//! Identifiers are per-kind counters that only grow. The highest id ever
//! issued is stored as `last_id`, so deleting the newest record and reloading
//! never hands its id out again.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::project::{Project, ProjectUpdate};
use crate::task::{NewTask, Task, TaskUpdate};

/// File holding the project collection
pub const PROJECTS_FILE: &str = "projects.json";

/// File holding the task collection
pub const TASKS_FILE: &str = "tasks.json";

const PROJECTS_SCHEMA_VERSION: &str = "tasktrack.projects.v1";
const TASKS_SCHEMA_VERSION: &str = "tasktrack.tasks.v1";

/// Authoritative in-memory state plus its on-disk mirror
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    projects: BTreeMap<u64, Project>,
    tasks: BTreeMap<u64, Task>,
    next_project_id: u64,
    next_task_id: u64,
}

impl Store {
    /// Create an empty store rooted at `data_dir`, creating the directory if
    /// needed. Nothing is read from disk; see [`Store::open`].
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            projects: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_project_id: 1,
            next_task_id: 1,
        })
    }

    /// Create the store and load whatever is already on disk.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(data_dir)?;
        store.load()?;
        Ok(store)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn projects_file(&self) -> PathBuf {
        self.data_dir.join(PROJECTS_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn get_project(&self, id: u64) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Projects in creation order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Tasks in creation order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks of one project, in the project's own order
    pub fn tasks_for_project(&self, project_id: u64) -> Result<Vec<&Task>> {
        let project = self
            .projects
            .get(&project_id)
            .ok_or_else(|| Error::project_not_found(project_id))?;
        Ok(project
            .task_ids
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect())
    }

    // =========================================================================
    // Project operations
    // =========================================================================

    pub fn create_project(&mut self, name: &str, description: &str, owner: &str) -> Result<Project> {
        if name.trim().is_empty() {
            return Err(Error::Validation("project name cannot be empty".to_string()));
        }
        if owner.trim().is_empty() {
            return Err(Error::Validation("project owner cannot be empty".to_string()));
        }

        let id = self.next_project_id;
        self.next_project_id = next_id(id, "project")?;
        debug!(project_id = id, "assigned project id");

        let project = Project::new(id, name, description, owner);
        self.projects.insert(id, project.clone());
        self.save()?;
        info!(project_id = id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn update_project(&mut self, id: u64, update: ProjectUpdate) -> Result<Project> {
        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| Error::project_not_found(id))?;
        update.validate(project)?;
        update.apply(project);
        let updated = project.clone();
        self.save()?;
        Ok(updated)
    }

    /// Mutate a project in place and persist. Task membership must not be
    /// touched through here.
    pub(crate) fn modify_project<T, F>(&mut self, id: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Project) -> Result<T>,
    {
        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| Error::project_not_found(id))?;
        let result = f(project)?;
        self.save()?;
        Ok(result)
    }

    /// Delete a project together with every task it owns. Tasks go first so
    /// the project never lists ids that are already gone.
    pub fn delete_project(&mut self, id: u64) -> Result<Project> {
        let task_ids = self
            .projects
            .get(&id)
            .map(|project| project.task_ids.clone())
            .ok_or_else(|| Error::project_not_found(id))?;

        for task_id in &task_ids {
            self.tasks.remove(task_id);
        }
        let project = self
            .projects
            .remove(&id)
            .ok_or_else(|| Error::project_not_found(id))?;

        self.save()?;
        info!(project_id = id, tasks_removed = task_ids.len(), "project deleted");
        Ok(project)
    }

    // =========================================================================
    // Task operations
    // =========================================================================

    pub fn create_task(&mut self, input: NewTask) -> Result<Task> {
        if input.title.trim().is_empty() {
            return Err(Error::Validation("task title cannot be empty".to_string()));
        }
        let project_id = input.project_id;
        let project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| Error::project_not_found(project_id))?;

        let id = self.next_task_id;
        self.next_task_id = next_id(id, "task")?;
        debug!(task_id = id, project_id, "assigned task id");

        let task = Task::new(id, input);
        project.attach_task(id);
        self.tasks.insert(id, task.clone());
        self.save()?;
        info!(task_id = id, project_id, title = %task.title, "task created");
        Ok(task)
    }

    /// Partial update. Moving a task to another project keeps both project
    /// task lists in step; the target must exist.
    pub fn update_task(&mut self, id: u64, mut update: TaskUpdate) -> Result<Task> {
        update.validate()?;
        let target_project = update.project_id.take();

        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| Error::task_not_found(id))?;
        let previous_project = task.project_id;

        if let Some(target) = target_project {
            if !self.projects.contains_key(&target) {
                return Err(Error::Integrity(format!(
                    "cannot move task {id} to missing project {target}"
                )));
            }
        }

        update.apply(task);
        if let Some(target) = target_project {
            task.project_id = target;
        }
        let updated = task.clone();

        if updated.project_id != previous_project {
            if let Some(project) = self.projects.get_mut(&previous_project) {
                project.detach_task(id);
                project.touch();
            }
            if let Some(project) = self.projects.get_mut(&updated.project_id) {
                project.attach_task(id);
                project.touch();
            }
            debug!(
                task_id = id,
                from = previous_project,
                to = updated.project_id,
                "task moved"
            );
        }

        self.save()?;
        Ok(updated)
    }

    /// Mutate a task in place and persist. `project_id` changes must go
    /// through [`Store::update_task`].
    pub(crate) fn modify_task<T, F>(&mut self, id: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Task) -> Result<T>,
    {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| Error::task_not_found(id))?;
        let result = f(task)?;
        self.save()?;
        Ok(result)
    }

    pub fn delete_task(&mut self, id: u64) -> Result<Task> {
        let task = self
            .tasks
            .remove(&id)
            .ok_or_else(|| Error::task_not_found(id))?;
        if let Some(project) = self.projects.get_mut(&task.project_id) {
            project.detach_task(id);
            project.touch();
        }
        self.save()?;
        info!(task_id = id, project_id = task.project_id, "task deleted");
        Ok(task)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replace the in-memory state with what is on disk. Missing files are
    /// empty collections. On error the current state is left untouched.
    ///
    /// Project task lists are rebuilt from the tasks' own `project_id`, so a
    /// `projects.json` left one save behind `tasks.json` still loads.
    pub fn load(&mut self) -> Result<()> {
        let projects_doc: ProjectsDocument = read_json_or_default(&self.projects_file())?;
        let tasks_doc: TasksDocument = read_json_or_default(&self.tasks_file())?;

        if projects_doc.schema_version != PROJECTS_SCHEMA_VERSION {
            warn!(found = %projects_doc.schema_version, "unexpected projects schema version");
        }
        if tasks_doc.schema_version != TASKS_SCHEMA_VERSION {
            warn!(found = %tasks_doc.schema_version, "unexpected tasks schema version");
        }

        let mut projects = BTreeMap::new();
        for mut project in projects_doc.projects {
            project.normalize_members();
            let id = project.id;
            if projects.insert(id, project).is_some() {
                return Err(Error::Integrity(format!("duplicate project id {id}")));
            }
        }

        let mut tasks = BTreeMap::new();
        for task in tasks_doc.tasks {
            let id = task.id;
            if tasks.insert(id, task).is_some() {
                return Err(Error::Integrity(format!("duplicate task id {id}")));
            }
        }

        relink_task_lists(&mut projects, &tasks);
        verify_integrity(&projects, &tasks)?;

        let max_project = projects.keys().next_back().copied().unwrap_or(0);
        let max_task = tasks.keys().next_back().copied().unwrap_or(0);
        let next_project_id = next_id(projects_doc.last_id.max(max_project), "project")?;
        let next_task_id = next_id(tasks_doc.last_id.max(max_task), "task")?;
        self.next_project_id = next_project_id;
        self.next_task_id = next_task_id;
        self.projects = projects;
        self.tasks = tasks;

        debug!(
            projects = self.projects.len(),
            tasks = self.tasks.len(),
            "store loaded"
        );
        Ok(())
    }

    /// Write both documents. Both temp files are written before either is
    /// renamed into place; `tasks.json` is renamed first.
    pub fn save(&self) -> Result<()> {
        #[derive(Serialize)]
        struct ProjectsOut<'a> {
            schema_version: &'static str,
            last_id: u64,
            projects: Vec<&'a Project>,
        }

        #[derive(Serialize)]
        struct TasksOut<'a> {
            schema_version: &'static str,
            last_id: u64,
            tasks: Vec<&'a Task>,
        }

        let projects_json = serde_json::to_string_pretty(&ProjectsOut {
            schema_version: PROJECTS_SCHEMA_VERSION,
            last_id: self.next_project_id - 1,
            projects: self.projects.values().collect(),
        })?;
        let tasks_json = serde_json::to_string_pretty(&TasksOut {
            schema_version: TASKS_SCHEMA_VERSION,
            last_id: self.next_task_id - 1,
            tasks: self.tasks.values().collect(),
        })?;

        let tasks_file = self.tasks_file();
        let projects_file = self.projects_file();
        let tasks_temp = stage_file(&tasks_file, tasks_json.as_bytes())?;
        let projects_temp = match stage_file(&projects_file, projects_json.as_bytes()) {
            Ok(path) => path,
            Err(err) => {
                let _ = fs::remove_file(&tasks_temp);
                return Err(err);
            }
        };
        fs::rename(&tasks_temp, &tasks_file)?;
        fs::rename(&projects_temp, &projects_file)?;
        debug!(data_dir = %self.data_dir.display(), "store saved");
        Ok(())
    }

    /// Check the project/task cross references of the current state.
    pub fn verify(&self) -> Result<()> {
        verify_integrity(&self.projects, &self.tasks)
    }
}

// =============================================================================
// On-disk documents
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProjectsDocument {
    #[serde(default = "projects_schema_version")]
    schema_version: String,
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    projects: Vec<Project>,
}

impl Default for ProjectsDocument {
    fn default() -> Self {
        Self {
            schema_version: projects_schema_version(),
            last_id: 0,
            projects: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TasksDocument {
    #[serde(default = "tasks_schema_version")]
    schema_version: String,
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl Default for TasksDocument {
    fn default() -> Self {
        Self {
            schema_version: tasks_schema_version(),
            last_id: 0,
            tasks: Vec::new(),
        }
    }
}

fn projects_schema_version() -> String {
    PROJECTS_SCHEMA_VERSION.to_string()
}

fn tasks_schema_version() -> String {
    TASKS_SCHEMA_VERSION.to_string()
}

/// Make every project list exactly the tasks that name it. Stale ids are
/// dropped and unlisted tasks appended, each with a warning. Tasks whose
/// project is gone are left for [`verify_integrity`] to reject.
fn relink_task_lists(projects: &mut BTreeMap<u64, Project>, tasks: &BTreeMap<u64, Task>) {
    for project in projects.values_mut() {
        let project_id = project.id;
        project.task_ids.retain(|task_id| {
            let owned = tasks
                .get(task_id)
                .is_some_and(|task| task.project_id == project_id);
            if !owned {
                warn!(project_id, task_id = *task_id, "dropping stale task reference");
            }
            owned
        });
    }
    for task in tasks.values() {
        if let Some(project) = projects.get_mut(&task.project_id) {
            if !project.task_ids.contains(&task.id) {
                warn!(
                    project_id = project.id,
                    task_id = task.id,
                    "relinking task missing from its project"
                );
                project.task_ids.push(task.id);
            }
        }
    }
}

/// Id following `id`, or an `Integrity` error once the counter is exhausted.
fn next_id(id: u64, kind: &str) -> Result<u64> {
    id.checked_add(1)
        .ok_or_else(|| Error::Integrity(format!("{kind} id counter is exhausted at {id}")))
}

fn verify_integrity(projects: &BTreeMap<u64, Project>, tasks: &BTreeMap<u64, Task>) -> Result<()> {
    for task in tasks.values() {
        let project = projects.get(&task.project_id).ok_or_else(|| {
            Error::Integrity(format!(
                "task {} references missing project {}",
                task.id, task.project_id
            ))
        })?;
        if !project.task_ids.contains(&task.id) {
            return Err(Error::Integrity(format!(
                "task {} is not listed by its project {}",
                task.id, project.id
            )));
        }
    }
    for project in projects.values() {
        for task_id in &project.task_ids {
            match tasks.get(task_id) {
                Some(task) if task.project_id == project.id => {}
                Some(task) => {
                    return Err(Error::Integrity(format!(
                        "project {} lists task {} owned by project {}",
                        project.id, task_id, task.project_id
                    )))
                }
                None => {
                    return Err(Error::Integrity(format!(
                        "project {} lists missing task {}",
                        project.id, task_id
                    )))
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// File I/O helpers (atomic writes for safety)
// =============================================================================

/// Write JSON data atomically (write to temp, then rename)
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(path, json.as_bytes())
}

/// Read JSON data from a file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&content)?;
    Ok(data)
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

/// Write data atomically using temp file + rename
///
/// Readers see either the previous document or the new one, never a
/// partially written file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = stage_file(path, data)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Write `data` to the sibling temp path of `path` and sync it. Returns the
/// temp path, ready to be renamed over `path`.
fn stage_file(path: &Path, data: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(temp_path)
}

/// Sibling path a document is staged at before it replaces `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, TaskStatus};
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("data")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_storage_paths() {
        let (temp, store) = store();
        let root = temp.path().join("data");
        assert!(root.is_dir());
        assert_eq!(store.projects_file(), root.join("projects.json"));
        assert_eq!(store.tasks_file(), root.join("tasks.json"));
    }

    #[test]
    fn test_new_accepts_existing_directory() {
        let temp = TempDir::new().unwrap();
        Store::new(temp.path()).unwrap();
        Store::new(temp.path()).unwrap();
    }

    #[test]
    fn test_create_project_is_write_through() {
        let (_temp, mut store) = store();
        let project = store.create_project("P1", "first", "alice").unwrap();
        assert_eq!(project.id, 1);
        assert_eq!(project.members, vec!["alice".to_string()]);

        let value: serde_json::Value = read_json(&store.projects_file()).unwrap();
        assert_eq!(value["last_id"], 1);
        assert_eq!(value["projects"][0]["name"], "P1");
        assert_eq!(value["schema_version"], PROJECTS_SCHEMA_VERSION);
    }

    #[test]
    fn test_create_project_rejects_blank_name() {
        let (_temp, mut store) = store();
        let err = store.create_project("   ", "", "alice").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.project_count(), 0);
    }

    #[test]
    fn test_create_task_links_project() {
        let (_temp, mut store) = store();
        let project = store.create_project("P1", "", "alice").unwrap();
        let task = store
            .create_task(NewTask::new("T1", project.id).priority(TaskPriority::High))
            .unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(store.get_project(project.id).unwrap().task_ids, vec![task.id]);
        store.verify().unwrap();
    }

    #[test]
    fn test_create_task_requires_project() {
        let (_temp, mut store) = store();
        let err = store.create_task(NewTask::new("orphan", 42)).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 42, .. }));
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn test_update_task_moves_between_projects() {
        let (_temp, mut store) = store();
        let a = store.create_project("A", "", "alice").unwrap();
        let b = store.create_project("B", "", "alice").unwrap();
        let task = store.create_task(NewTask::new("T", a.id)).unwrap();

        let update = TaskUpdate::from_json(json!({ "project_id": b.id })).unwrap();
        let moved = store.update_task(task.id, update).unwrap();

        assert_eq!(moved.project_id, b.id);
        assert!(store.get_project(a.id).unwrap().task_ids.is_empty());
        assert_eq!(store.get_project(b.id).unwrap().task_ids, vec![task.id]);
        store.verify().unwrap();
    }

    #[test]
    fn test_update_task_to_missing_project_is_integrity_error() {
        let (_temp, mut store) = store();
        let a = store.create_project("A", "", "alice").unwrap();
        let task = store.create_task(NewTask::new("T", a.id)).unwrap();

        let update = TaskUpdate {
            project_id: Some(99),
            title: Some("changed".to_string()),
            ..TaskUpdate::default()
        };
        let err = store.update_task(task.id, update).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(store.get_task(task.id).unwrap().title, "T");
    }

    #[test]
    fn test_load_rejects_dangling_task() {
        let (_temp, mut store) = store();
        write_json(
            &store.tasks_file(),
            &json!({
                "schema_version": TASKS_SCHEMA_VERSION,
                "last_id": 1,
                "tasks": [{
                    "id": 1,
                    "title": "lost",
                    "project_id": 7,
                    "status": "todo",
                    "priority": "low",
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }]
            }),
        )
        .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn test_load_missing_files_is_empty() {
        let (_temp, mut store) = store();
        store.load().unwrap();
        assert_eq!(store.project_count(), 0);
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let (_temp, store) = store();
        let path = store.data_dir().join("sample.json");
        write_json(&path, &json!({ "value": 42 })).unwrap();
        write_json(&path, &json!({ "value": 43 })).unwrap();

        let read_back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(read_back["value"], 43);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
