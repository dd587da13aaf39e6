use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::models::{
    NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch, DEFAULT_PROJECT_COLOR,
};
use crate::storage::Substrate;

/// Substrate key holding the snapshot of one identity.
pub fn partition_key(identity_id: &str) -> String {
    format!("taskflow:data:{identity_id}")
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    projects: &'a [Project],
    tasks: &'a [Task],
}

/// Projects and tasks of the active identity.
///
/// Every mutation rewrites the whole snapshot to the partition key.
#[derive(Debug, Clone)]
pub struct RecordStore {
    partition: Option<String>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    default_color: String,
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore {
            partition: None,
            projects: Vec::new(),
            tasks: Vec::new(),
            default_color: DEFAULT_PROJECT_COLOR.to_string(),
        }
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = color.into();
        self
    }

    pub fn default_color(&self) -> &str {
        &self.default_color
    }

    /// Partition key currently backing the store, if an identity is loaded.
    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of one project, in collection order.
    pub fn tasks_by_project(&self, project_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.project_id == project_id).collect()
    }

    /// Swaps in the snapshot of `identity_id`, or empties the store when
    /// there is no identity.
    ///
    /// Missing or malformed data loads as empty collections; inside a
    /// well-formed collection only the records that fail to decode are dropped.
    pub fn load_for_identity(
        &mut self,
        substrate: &mut impl Substrate,
        identity_id: Option<&str>,
    ) -> Result<()> {
        self.projects.clear();
        self.tasks.clear();
        self.partition = None;

        let Some(id) = identity_id else {
            debug!("store cleared, no active identity");
            return Ok(());
        };

        let key = partition_key(id);
        if let Some(raw) = substrate.get(&key) {
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(mut root)) => {
                    self.projects = collection(&key, "projects", root.remove("projects"));
                    self.tasks = collection(&key, "tasks", root.remove("tasks"));
                }
                Ok(_) => warn!(key = %key, "snapshot is not an object, starting empty"),
                Err(e) => warn!(key = %key, "unreadable snapshot, starting empty: {e}"),
            }
        }
        debug!(
            key = %key,
            projects = self.projects.len(),
            tasks = self.tasks.len(),
            "loaded snapshot"
        );
        self.partition = Some(key);
        self.persist(substrate)
    }

    /// Writes the full snapshot to the active partition. No-op without one.
    pub fn persist(&self, substrate: &mut impl Substrate) -> Result<()> {
        let Some(key) = &self.partition else {
            return Ok(());
        };
        let s = serde_json::to_string(&SnapshotRef {
            projects: &self.projects,
            tasks: &self.tasks,
        })?;
        substrate.set(key, s)?;
        debug!(key = %key, "persisted snapshot");
        Ok(())
    }

    pub fn create_project(
        &mut self,
        substrate: &mut impl Substrate,
        data: NewProject,
    ) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: Ulid::new().to_string(),
            name: data.name,
            description: data.description,
            color: data.color.unwrap_or_else(|| self.default_color.clone()),
            created_at: now,
            updated_at: now,
        };
        self.projects.push(project.clone());
        self.persist(substrate)?;
        Ok(project)
    }

    /// Creates a task under an existing project.
    pub fn create_task(&mut self, substrate: &mut impl Substrate, data: NewTask) -> Result<Task> {
        if self.project(&data.project_id).is_none() {
            return Err(Error::UnknownProject(data.project_id));
        }
        let now = Utc::now();
        let task = Task {
            id: Ulid::new().to_string(),
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            project_id: data.project_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks.push(task.clone());
        self.persist(substrate)?;
        Ok(task)
    }

    /// Applies `patch` to the project. Returns `None` if it does not exist.
    pub fn update_project(
        &mut self,
        substrate: &mut impl Substrate,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Option<Project>> {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patch.apply(project);
        project.updated_at = touch(project.created_at);
        let updated = project.clone();
        self.persist(substrate)?;
        Ok(Some(updated))
    }

    /// Applies `patch` to the task. Returns `None` if it does not exist.
    pub fn update_task(
        &mut self,
        substrate: &mut impl Substrate,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        patch.apply(task);
        task.updated_at = touch(task.created_at);
        let updated = task.clone();
        self.persist(substrate)?;
        Ok(Some(updated))
    }

    /// Removes the project together with all of its tasks.
    ///
    /// Returns `false` if the project did not exist.
    pub fn delete_project(&mut self, substrate: &mut impl Substrate, id: &str) -> Result<bool> {
        let len_before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == len_before {
            return Ok(false);
        }
        let tasks_before = self.tasks.len();
        self.tasks.retain(|t| t.project_id != id);
        debug!(
            project = id,
            tasks = tasks_before - self.tasks.len(),
            "deleted project"
        );
        self.persist(substrate)?;
        Ok(true)
    }

    pub fn delete_task(&mut self, substrate: &mut impl Substrate, id: &str) -> Result<bool> {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == len_before {
            return Ok(false);
        }
        self.persist(substrate)?;
        Ok(true)
    }
}

/// Current instant, never earlier than `created_at`.
fn touch(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

/// Reads one snapshot member record by record. A member that is not an array
/// loads empty; a record that does not decode is skipped.
fn collection<T: DeserializeOwned>(key: &str, field: &str, value: Option<Value>) -> Vec<T> {
    let records = match value {
        None => return Vec::new(),
        Some(Value::Array(records)) => records,
        Some(_) => {
            warn!(key, field, "snapshot member is not an array, starting empty");
            return Vec::new();
        }
    };
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(key, field, index, "dropping malformed record: {e}");
                None
            }
        })
        .collect()
}
