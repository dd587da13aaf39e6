use std::cmp::Ordering;

use clap::ValueEnum;

use crate::models::{Priority, Project, Status, Task};

/// Projects whose name contains `search`, ignoring case.
pub fn search_projects<'a>(projects: &'a [Project], search: &str) -> Vec<&'a Project> {
    let needle = search.to_lowercase();
    projects
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// Order in which a task list is displayed.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Newest first
    #[default]
    Created,
    /// Earliest due date first, undated tasks last
    Due,
    /// High, then medium, then low
    Priority,
}

/// Narrowing applied to a project's tasks before display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub search: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub sort: TaskSort,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        task.title.to_lowercase().contains(&self.search.to_lowercase())
            && self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.status.is_some() || self.priority.is_some()
    }

    /// Filters then sorts. The sort is stable so ties keep collection order.
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut filtered: Vec<&Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        filtered.sort_by(|a, b| compare(self.sort, a, b));
        filtered
    }
}

fn compare(sort: TaskSort, a: &Task, b: &Task) -> Ordering {
    match sort {
        TaskSort::Created => b.created_at.cmp(&a.created_at),
        TaskSort::Due => match (a.due_date, b.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        TaskSort::Priority => a.priority.rank().cmp(&b.priority.rank()),
    }
}

/// Tasks split into the three board columns.
#[derive(Debug, Default)]
pub struct Board<'a> {
    pub todo: Vec<&'a Task>,
    pub doing: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> Board<'a> {
    pub fn new<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut board = Board::default();
        for t in tasks {
            match t.status {
                Status::Todo => board.todo.push(t),
                Status::Doing => board.doing.push(t),
                Status::Done => board.done.push(t),
            }
        }
        board
    }

    pub fn column(&self, status: Status) -> &[&'a Task] {
        match status {
            Status::Todo => &self.todo,
            Status::Doing => &self.doing,
            Status::Done => &self.done,
        }
    }
}

/// Dashboard counters over all of an identity's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total_projects: usize,
    pub total_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
}

pub fn stats(projects: &[Project], tasks: &[Task]) -> Stats {
    Stats {
        total_projects: projects.len(),
        total_tasks: tasks.len(),
        in_progress_tasks: tasks.iter().filter(|t| t.status == Status::Doing).count(),
        completed_tasks: tasks.iter().filter(|t| t.status == Status::Done).count(),
    }
}

/// Share of a project's tasks that are done, in percent.
pub fn progress(tasks: &[&Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks.iter().filter(|t| t.status == Status::Done).count();
    ((done * 100) / tasks.len()) as u8
}
