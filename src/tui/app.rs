use ratatui::widgets::TableState;

use crate::commands::parse_due;
use crate::error::{Error, Result};
use crate::models::{NewProject, NewTask, Project, ProjectPatch, Status, Task, TaskPatch};
use crate::query::Board;
use crate::storage::Substrate;
use crate::workspace::Workspace;

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(Debug, PartialEq)]
pub enum ViewMode {
    SignIn,
    Projects,
    Board,
}

#[derive(Debug, PartialEq)]
pub enum InputField {
    None,
    ProjectName,
    TaskTitle,
    TaskDue,
}

/// State for the multi-step sign-in and "Add" wizards.
#[derive(Default)]
pub struct AddState {
    pub name: String,
    pub detail: Option<String>,
    pub step: usize, // 0: Name/Title, 1: Email/Description/Due
}

pub struct App<S: Substrate> {
    pub workspace: Workspace<S>,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub add_state: AddState,
    pub project_state: TableState,
    /// Project shown on the board.
    pub current_project: Option<String>,
    /// Focused board column.
    pub column: Status,
    /// Selected card inside the focused column.
    pub card: usize,
    /// Feedback line shown above the help bar.
    pub message: Option<String>,
}

impl<S: Substrate> App<S> {
    /// Creates the app on top of an opened workspace.
    pub fn new(workspace: Workspace<S>) -> App<S> {
        let view_mode = if workspace.identity().is_some() {
            ViewMode::Projects
        } else {
            ViewMode::SignIn
        };
        let mut app = App {
            workspace,
            view_mode,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            add_state: AddState::default(),
            project_state: TableState::default(),
            current_project: None,
            column: Status::Todo,
            card: 0,
            message: None,
        };
        app.clamp_selection();
        app
    }

    pub fn projects(&self) -> &[Project] {
        self.workspace.projects()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.project_state
            .selected()
            .and_then(|i| self.workspace.projects().get(i))
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_project
            .as_deref()
            .and_then(|id| self.workspace.project(id))
    }

    /// Tasks of the open project grouped by column.
    pub fn board(&self) -> Board<'_> {
        match &self.current_project {
            Some(id) => Board::new(self.workspace.tasks_by_project(id)),
            None => Board::default(),
        }
    }

    pub fn selected_task(&self) -> Option<Task> {
        self.board().column(self.column).get(self.card).map(|t| (*t).clone())
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        match self.view_mode {
            ViewMode::Projects => {
                let len = self.projects().len();
                if len == 0 { return; }
                let i = match self.project_state.selected() {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                };
                self.project_state.select(Some(i));
            }
            ViewMode::Board => {
                let len = self.board().column(self.column).len();
                if len == 0 { return; }
                self.card = if self.card + 1 < len { self.card + 1 } else { 0 };
            }
            ViewMode::SignIn => {}
        }
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        match self.view_mode {
            ViewMode::Projects => {
                let len = self.projects().len();
                if len == 0 { return; }
                let i = match self.project_state.selected() {
                    Some(0) | None => len - 1,
                    Some(i) => i - 1,
                };
                self.project_state.select(Some(i));
            }
            ViewMode::Board => {
                let len = self.board().column(self.column).len();
                if len == 0 { return; }
                self.card = if self.card == 0 { len - 1 } else { self.card - 1 };
            }
            ViewMode::SignIn => {}
        }
    }

    /// Moves the column focus left or right.
    pub fn focus_column(&mut self, forward: bool) {
        if self.view_mode != ViewMode::Board { return; }
        let target = if forward { self.column.next() } else { self.column.previous() };
        if let Some(status) = target {
            self.column = status;
            self.card = 0;
        }
    }

    /// Moves the selected card to the neighbouring column and keeps it selected.
    pub fn move_selected(&mut self, forward: bool) {
        if self.view_mode != ViewMode::Board { return; }
        let Some(task) = self.selected_task() else { return; };
        let target = if forward { task.status.next() } else { task.status.previous() };
        let Some(status) = target else { return; };

        let res = self.workspace.update_task(&task.id, TaskPatch::status(status));
        if self.report(res).is_some() {
            let card = self
                .board()
                .column(status)
                .iter()
                .position(|t| t.id == task.id)
                .unwrap_or(0);
            self.column = status;
            self.card = card;
            self.message = Some(format!("Moved \"{}\" to {}", task.title, status.label()));
        }
    }

    pub fn cycle_priority(&mut self) {
        if self.view_mode != ViewMode::Board { return; }
        if let Some(task) = self.selected_task() {
            let patch = TaskPatch {
                priority: Some(task.priority.cycle()),
                ..Default::default()
            };
            let res = self.workspace.update_task(&task.id, patch);
            self.report(res);
        }
    }

    /// Deletes the selected project (with its tasks) or the selected card.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Projects => {
                if let Some(project) = self.selected_project().cloned() {
                    let res = self.workspace.delete_project(&project.id);
                    if self.report(res).is_some() {
                        self.message = Some(format!("Deleted project \"{}\"", project.name));
                    }
                }
            }
            ViewMode::Board => {
                if let Some(task) = self.selected_task() {
                    let res = self.workspace.delete_task(&task.id);
                    self.report(res);
                }
            }
            ViewMode::SignIn => {}
        }
        self.clamp_selection();
    }

    /// Opens the board of the selected project.
    pub fn open_selected(&mut self) {
        if self.view_mode != ViewMode::Projects { return; }
        if let Some(id) = self.selected_project().map(|p| p.id.clone()) {
            self.current_project = Some(id);
            self.view_mode = ViewMode::Board;
            self.column = Status::Todo;
            self.card = 0;
        }
    }

    /// Returns from the board to the project list.
    pub fn back(&mut self) {
        if self.view_mode == ViewMode::Board {
            self.view_mode = ViewMode::Projects;
            self.current_project = None;
        }
    }

    pub fn continue_as_guest(&mut self) {
        let res = self.workspace.continue_as_guest();
        if self.report(res).is_some() {
            self.enter_projects();
        }
    }

    pub fn sign_out(&mut self) {
        let res = self.workspace.end_session();
        if self.report(res).is_some() {
            self.view_mode = ViewMode::SignIn;
            self.current_project = None;
            self.project_state.select(None);
        }
    }

    /// Initiates the wizard of the current view.
    pub fn start_add(&mut self) {
        if self.view_mode == ViewMode::Board && self.current_project.is_none() { return; }
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a field of the selected project or card.
    pub fn start_edit(&mut self, field: InputField) {
        let prefill = match (&self.view_mode, &field) {
            (ViewMode::Projects, InputField::ProjectName) => self.selected_project().map(|p| p.name.clone()),
            (ViewMode::Board, InputField::TaskTitle) => self.selected_task().map(|t| t.title),
            (ViewMode::Board, InputField::TaskDue) => self
                .selected_task()
                .map(|t| t.due_date.map(|d| d.to_string()).unwrap_or_default()),
            _ => None,
        };
        if let Some(text) = prefill {
            self.input_mode = InputMode::Editing;
            self.input_field = field;
            self.input_buffer = text;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => { // Name / Title
                if input.is_empty() && self.view_mode != ViewMode::SignIn { return; }
                self.add_state.name = input;
                self.add_state.step += 1;
                self.input_buffer.clear();
            }
            _ => {
                self.add_state.detail = Some(input).filter(|s| !s.is_empty());
                self.input_buffer.clear();
                self.input_mode = InputMode::Normal;
                self.finish_add();
            }
        }
    }

    fn finish_add(&mut self) {
        let name = std::mem::take(&mut self.add_state.name);
        let detail = self.add_state.detail.take();
        match self.view_mode {
            ViewMode::SignIn => {
                let email = detail.unwrap_or_default();
                match self.workspace.authenticate(&name, &email) {
                    Ok(identity) => {
                        self.message = Some(format!("Welcome, {}", identity.name()));
                        self.enter_projects();
                    }
                    Err(Error::Validation(errors)) => self.message = Some(errors.to_string()),
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
            ViewMode::Projects => {
                let res = self.workspace.create_project(NewProject {
                    name,
                    description: detail,
                    color: None,
                });
                if let Some(p) = self.report(res) {
                    let i = self.projects().iter().position(|x| x.id == p.id);
                    self.project_state.select(i);
                }
            }
            ViewMode::Board => {
                let Some(project_id) = self.current_project.clone() else { return; };
                let due_date = match detail.as_deref().map(parse_due).transpose() {
                    Ok(d) => d.flatten(),
                    Err(e) => {
                        self.message = Some(e.to_string());
                        return;
                    }
                };
                let res = self.workspace.create_task(NewTask {
                    title: name,
                    status: self.column,
                    due_date,
                    ..NewTask::new(project_id, String::new())
                });
                if self.report(res).is_some() {
                    let len = self.board().column(self.column).len();
                    self.card = len.saturating_sub(1);
                }
            }
        }
    }

    fn handle_editing_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        match self.input_field {
            InputField::ProjectName => {
                if let Some(id) = self.selected_project().map(|p| p.id.clone()) {
                    if !input.is_empty() {
                        let patch = ProjectPatch { name: Some(input), ..Default::default() };
                        let res = self.workspace.update_project(&id, patch);
                        self.report(res);
                    }
                }
            }
            InputField::TaskTitle => {
                if let Some(task) = self.selected_task() {
                    if !input.is_empty() {
                        let patch = TaskPatch { title: Some(input), ..Default::default() };
                        let res = self.workspace.update_task(&task.id, patch);
                        self.report(res);
                    }
                }
            }
            InputField::TaskDue => {
                if let Some(task) = self.selected_task() {
                    match parse_due(&input) {
                        Ok(due) => {
                            let patch = TaskPatch { due_date: Some(due), ..Default::default() };
                            let res = self.workspace.update_task(&task.id, patch);
                            self.report(res);
                        }
                        Err(e) => self.message = Some(e.to_string()),
                    }
                }
            }
            InputField::None => {}
        }
        self.cancel_input();
    }

    fn enter_projects(&mut self) {
        self.view_mode = ViewMode::Projects;
        self.current_project = None;
        self.project_state.select(None);
        self.clamp_selection();
    }

    /// Keeps selections inside the current lists.
    fn clamp_selection(&mut self) {
        let len = self.projects().len();
        if len == 0 {
            self.project_state.select(None);
        } else {
            match self.project_state.selected() {
                Some(i) if i >= len => self.project_state.select(Some(len - 1)),
                None => self.project_state.select(Some(0)),
                _ => {}
            }
        }
        let cards = self.board().column(self.column).len();
        if self.card >= cards {
            self.card = cards.saturating_sub(1);
        }
    }

    /// Records a failed operation in the message line.
    fn report<T>(&mut self, res: Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
