use crate::error::Result;
use crate::models::{Identity, NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch};
use crate::session::Session;
use crate::storage::Substrate;
use crate::store::RecordStore;

/// Owns the substrate together with the session and the record store bound
/// to it. Identity changes always reload the store.
#[derive(Debug)]
pub struct Workspace<S: Substrate> {
    substrate: S,
    session: Session,
    store: RecordStore,
}

impl<S: Substrate> Workspace<S> {
    /// Restores the persisted session and loads its partition.
    pub fn open(substrate: S) -> Result<Self> {
        Self::with_store(substrate, RecordStore::new())
    }

    /// Like [`Workspace::open`] with a preconfigured, empty store.
    pub fn with_store(mut substrate: S, mut store: RecordStore) -> Result<Self> {
        let session = Session::restore(&substrate);
        store.load_for_identity(&mut substrate, session.identity_id())?;
        Ok(Workspace {
            substrate,
            session,
            store,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn into_substrate(self) -> S {
        self.substrate
    }

    pub fn authenticate(&mut self, name: &str, email: &str) -> Result<Identity> {
        let previous = self.session.identity_id().map(str::to_string);
        let result = self
            .session
            .authenticate(&mut self.substrate, name, email)
            .map(|identity| identity.clone());
        self.settle(previous, result)
    }

    pub fn continue_as_guest(&mut self) -> Result<()> {
        let previous = self.session.identity_id().map(str::to_string);
        let result = self.session.continue_as_guest(&mut self.substrate).map(|_| ());
        self.settle(previous, result)
    }

    pub fn end_session(&mut self) -> Result<()> {
        let previous = self.session.identity_id().map(str::to_string);
        let result = self.session.end_session(&mut self.substrate);
        self.settle(previous, result)
    }

    /// Reloads the store whenever the identity changed, even if the session
    /// call itself failed halfway.
    fn settle<T>(&mut self, previous: Option<String>, result: Result<T>) -> Result<T> {
        let reloaded = if self.session.identity_id() != previous.as_deref() {
            self.reload()
        } else {
            Ok(())
        };
        let value = result?;
        reloaded?;
        Ok(value)
    }

    fn reload(&mut self) -> Result<()> {
        self.store
            .load_for_identity(&mut self.substrate, self.session.identity_id())
    }

    pub fn projects(&self) -> &[Project] {
        self.store.projects()
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.store.project(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.store.task(id)
    }

    pub fn tasks_by_project(&self, project_id: &str) -> Vec<&Task> {
        self.store.tasks_by_project(project_id)
    }

    pub fn create_project(&mut self, data: NewProject) -> Result<Project> {
        self.store.create_project(&mut self.substrate, data)
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        self.store.update_project(&mut self.substrate, id, patch)
    }

    pub fn delete_project(&mut self, id: &str) -> Result<bool> {
        self.store.delete_project(&mut self.substrate, id)
    }

    pub fn create_task(&mut self, data: NewTask) -> Result<Task> {
        self.store.create_task(&mut self.substrate, data)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        self.store.update_task(&mut self.substrate, id, patch)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        self.store.delete_task(&mut self.substrate, id)
    }
}
