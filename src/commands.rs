use std::io::{self, Write};

use chrono::{Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use eyre::{bail, eyre};

use crate::models::{
    NewProject, NewTask, Priority, Project, ProjectPatch, Status, Task, TaskPatch,
};
use crate::query::{progress, search_projects, stats, Board, TaskFilter};
use crate::storage::Substrate;
use crate::workspace::Workspace;

/// Signs in as a registered user.
pub fn cmd_login<S: Substrate>(ws: &mut Workspace<S>, name: &str, email: &str, silent: bool) -> eyre::Result<()> {
    let identity = ws.authenticate(name, email)?;
    if !silent { println!("Signed in as {} <{}>.", identity.name(), identity.email()); }
    Ok(())
}

pub fn cmd_guest<S: Substrate>(ws: &mut Workspace<S>, silent: bool) -> eyre::Result<()> {
    ws.continue_as_guest()?;
    if !silent { println!("Continuing as guest."); }
    Ok(())
}

pub fn cmd_logout<S: Substrate>(ws: &mut Workspace<S>, silent: bool) -> eyre::Result<()> {
    ws.end_session()?;
    if !silent { println!("Signed out."); }
    Ok(())
}

pub fn cmd_whoami<S: Substrate>(ws: &Workspace<S>) {
    match ws.identity() {
        Some(identity) if identity.is_guest() => println!("Guest session"),
        Some(identity) => println!("{} <{}> (id = {})", identity.name(), identity.email(), identity.id()),
        None => println!("Not signed in."),
    }
}

/// Adds a new project for the active identity.
pub fn cmd_project_add<S: Substrate>(
    ws: &mut Workspace<S>,
    name: String,
    description: Option<String>,
    color: Option<String>,
    silent: bool,
) -> eyre::Result<()> {
    require_identity(ws)?;
    if name.trim().is_empty() {
        bail!("Project name is required.");
    }
    let project = ws.create_project(NewProject {
        name: name.trim().to_string(),
        description: non_empty(description),
        color,
    })?;
    if !silent { println!("Project added (id = {})", project.id); }
    Ok(())
}

/// Lists projects with their task counts and progress.
pub fn cmd_project_list<S: Substrate>(ws: &Workspace<S>, search: Option<String>) -> eyre::Result<()> {
    require_identity(ws)?;
    let search = search.unwrap_or_default();
    let projects = search_projects(ws.projects(), &search);
    if projects.is_empty() {
        if search.is_empty() {
            println!("No projects yet. Create one with `taskflow project add <NAME>`.");
        } else {
            println!("No projects match your search.");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Tasks").add_attribute(Attribute::Bold),
            Cell::new("Progress").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

    for p in projects {
        let tasks = ws.tasks_by_project(&p.id);
        let name = Cell::new(&p.name);
        let name = match hex_color(&p.color) {
            Some(c) => name.fg(c),
            None => name,
        };
        table.add_row(vec![
            Cell::new(&p.id),
            name,
            Cell::new(p.description.clone().unwrap_or_default()),
            Cell::new(tasks.len()),
            Cell::new(format!("{}%", progress(&tasks))),
            Cell::new(p.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Edits a project's details. An empty description clears it.
pub fn cmd_project_edit<S: Substrate>(
    ws: &mut Workspace<S>,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    silent: bool,
) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(project_id) = resolve_project(ws, id)?.map(|p| p.id.clone()) else {
        if !silent { eprintln!("Project {} not found.", id); }
        return Ok(());
    };
    let name = name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        bail!("Project name is required.");
    }
    let patch = ProjectPatch {
        name,
        description: description.map(|d| non_empty(Some(d))),
        color,
    };
    if patch.is_empty() {
        if !silent { println!("Nothing to update."); }
        return Ok(());
    }
    ws.update_project(&project_id, patch)?;
    if !silent { println!("Project {} updated.", project_id); }
    Ok(())
}

/// Removes a project and every task in it.
pub fn cmd_project_remove<S: Substrate>(ws: &mut Workspace<S>, id: &str, force: bool, silent: bool) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(project) = resolve_project(ws, id)?.cloned() else {
        if !silent { eprintln!("Project {} not found.", id); }
        return Ok(());
    };

    if !force {
        let count = ws.tasks_by_project(&project.id).len();
        print!(
            "Delete \"{}\" and its {} task(s)? This cannot be undone. [y/N] ",
            project.name, count
        );
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }

    ws.delete_project(&project.id)?;
    if !silent { println!("Project {} removed.", project.id); }
    Ok(())
}

/// Adds a task to a project.
#[allow(clippy::too_many_arguments)]
pub fn cmd_task_add<S: Substrate>(
    ws: &mut Workspace<S>,
    project: &str,
    title: String,
    description: Option<String>,
    status: Status,
    priority: Priority,
    due: Option<String>,
    silent: bool,
) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(project_id) = resolve_project(ws, project)?.map(|p| p.id.clone()) else {
        bail!("Project {} not found.", project);
    };
    if title.trim().is_empty() {
        bail!("Task title is required.");
    }
    let due_date = due.as_deref().map(parse_due).transpose()?.flatten();
    let task = ws.create_task(NewTask {
        title: title.trim().to_string(),
        description: non_empty(description),
        status,
        priority,
        due_date,
        project_id,
    })?;
    if !silent { println!("Task added (id = {})", task.id); }
    Ok(())
}

/// Lists a project's tasks as a table, filtered and sorted.
pub fn cmd_task_list<S: Substrate>(ws: &Workspace<S>, project: &str, filter: &TaskFilter) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(project) = resolve_project(ws, project)? else {
        bail!("Project {} not found.", project);
    };
    let tasks = filter.apply(ws.tasks_by_project(&project.id));
    if tasks.is_empty() {
        if filter.is_active() {
            println!("No tasks match your filters.");
        } else {
            println!("No tasks in \"{}\" yet.", project.name);
        }
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
        ]);

    let today = Local::now().date_naive();
    for t in tasks {
        let due = match t.due_date {
            Some(d) => {
                let overdue = d < today && t.status != Status::Done;
                Cell::new(d).fg(if overdue { Color::Red } else { Color::Reset })
            }
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(t.status).fg(status_color(t.status)),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            due,
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Edits an existing task. An empty description or a due date of `none`
/// clears the field.
#[allow(clippy::too_many_arguments)]
pub fn cmd_task_edit<S: Substrate>(
    ws: &mut Workspace<S>,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    due: Option<String>,
    silent: bool,
) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(task_id) = resolve_task(ws, id)?.map(|t| t.id.clone()) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return Ok(());
    };
    let title = title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        bail!("Task title is required.");
    }
    let patch = TaskPatch {
        title,
        description: description.map(|d| non_empty(Some(d))),
        status,
        priority,
        due_date: due.as_deref().map(parse_due).transpose()?,
    };
    if patch.is_empty() {
        if !silent { println!("Nothing to update."); }
        return Ok(());
    }
    ws.update_task(&task_id, patch)?;
    if !silent { println!("Task {} updated.", task_id); }
    Ok(())
}

/// Moves a task to another board column.
pub fn cmd_task_move<S: Substrate>(ws: &mut Workspace<S>, id: &str, status: Status, silent: bool) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(task) = resolve_task(ws, id)?.cloned() else {
        if !silent { eprintln!("Task {} not found.", id); }
        return Ok(());
    };
    if task.status == status {
        if !silent { println!("Task {} is already in {}.", task.id, status.label()); }
        return Ok(());
    }
    ws.update_task(&task.id, TaskPatch::status(status))?;
    if !silent { println!("Task {} moved to {}.", task.id, status.label()); }
    Ok(())
}

/// Removes a task by ID.
pub fn cmd_task_remove<S: Substrate>(ws: &mut Workspace<S>, id: &str, silent: bool) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(task_id) = resolve_task(ws, id)?.map(|t| t.id.clone()) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return Ok(());
    };
    ws.delete_task(&task_id)?;
    if !silent { println!("Task {} removed.", task_id); }
    Ok(())
}

/// Prints the project's tasks as three kanban columns.
pub fn cmd_board<S: Substrate>(ws: &Workspace<S>, project: &str, filter: &TaskFilter) -> eyre::Result<()> {
    require_identity(ws)?;
    let Some(project) = resolve_project(ws, project)? else {
        bail!("Project {} not found.", project);
    };
    let tasks = filter.apply(ws.tasks_by_project(&project.id));
    let board = Board::new(tasks);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(Status::ALL.iter().map(|s| {
            Cell::new(format!("{} ({})", s.label(), board.column(*s).len()))
                .add_attribute(Attribute::Bold)
                .fg(status_color(*s))
        }));

    let depth = Status::ALL.iter().map(|s| board.column(*s).len()).max().unwrap_or(0);
    for row in 0..depth {
        table.add_row(Status::ALL.iter().map(|s| match board.column(*s).get(row) {
            Some(t) => card(t),
            None => Cell::new(""),
        }));
    }

    println!("{}", project.name);
    println!("{table}");
    Ok(())
}

/// Prints dashboard counters for the active identity.
pub fn cmd_stats<S: Substrate>(ws: &Workspace<S>) -> eyre::Result<()> {
    require_identity(ws)?;
    let s = stats(ws.projects(), ws.tasks());
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Total Projects",
        "Total Tasks",
        "In Progress",
        "Completed",
    ]);
    table.add_row(vec![
        Cell::new(s.total_projects),
        Cell::new(s.total_tasks),
        Cell::new(s.in_progress_tasks).fg(Color::Yellow),
        Cell::new(s.completed_tasks).fg(Color::Green),
    ]);
    println!("{table}");
    Ok(())
}

/// Finds a project by exact id or unique id prefix.
pub fn resolve_project<'a, S: Substrate>(ws: &'a Workspace<S>, id: &str) -> eyre::Result<Option<&'a Project>> {
    resolve(ws.projects(), id, |p| p.id.as_str())
}

/// Finds a task by exact id or unique id prefix.
pub fn resolve_task<'a, S: Substrate>(ws: &'a Workspace<S>, id: &str) -> eyre::Result<Option<&'a Task>> {
    resolve(ws.tasks(), id, |t| t.id.as_str())
}

fn resolve<'a, T>(items: &'a [T], id: &str, id_of: impl Fn(&T) -> &str) -> eyre::Result<Option<&'a T>> {
    if let Some(exact) = items.iter().find(|i| id_of(i) == id) {
        return Ok(Some(exact));
    }
    if id.is_empty() {
        return Ok(None);
    }
    let id = id.to_uppercase();
    let mut matches = items.iter().filter(|i| id_of(i).starts_with(&id));
    let first = matches.next();
    if matches.next().is_some() {
        return Err(eyre!("id prefix '{}' is ambiguous", id));
    }
    Ok(first)
}

fn require_identity<S: Substrate>(ws: &Workspace<S>) -> eyre::Result<()> {
    if ws.identity().is_none() {
        bail!("Not signed in. Run `taskflow login <NAME> <EMAIL>` or `taskflow guest` first.");
    }
    Ok(())
}

/// Parses a due date in YYYY-MM-DD; `none` or an empty string means no date.
pub fn parse_due(s: &str) -> eyre::Result<Option<NaiveDate>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| eyre!("Invalid due date '{}': {}. Use YYYY-MM-DD.", s, e))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn card(t: &Task) -> Cell {
    let mut text = t.title.clone();
    if let Some(d) = t.due_date {
        text.push_str(&format!("\ndue {}", d));
    }
    text.push_str(&format!("\n{}", &t.id));
    Cell::new(text).fg(priority_color(t.priority))
}

fn status_color(s: Status) -> Color {
    match s {
        Status::Todo => Color::Grey,
        Status::Doing => Color::Yellow,
        Status::Done => Color::Green,
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

/// Parses `#rrggbb` into a terminal color.
fn hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let v = u32::from_str_radix(hex, 16).ok()?;
    Some(Color::Rgb {
        r: (v >> 16) as u8,
        g: (v >> 8) as u8,
        b: v as u8,
    })
}
