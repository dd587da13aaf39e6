//! # TaskFlow
//!
//! Track projects and their tasks from the terminal. TaskFlow pairs a
//! scriptable CLI with an interactive kanban TUI; both work on the same
//! per-user data.
//!
//! ## Features
//!
//! *   **Projects**: name, description and a display color per project.
//! *   **Tasks**: status (`todo`, `doing`, `done`), priority, optional due date.
//! *   **Board**: kanban view with cards moved between columns.
//! *   **Per-user data**: sign in with a name and email, or continue as guest.
//!     Each identity sees only its own projects.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! taskflow
//! # or explicitly
//! taskflow ui
//! ```
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! taskflow login "Ada" ada@example.com   # or: taskflow guest
//! taskflow project add "Launch" --color "#22c55e"
//! taskflow task add <PROJECT> "Draft spec" --priority high --due 2025-12-01
//! taskflow task move <TASK> doing
//! taskflow board <PROJECT>
//! ```
//!
//! Ids can be abbreviated to any unique prefix.
//!
//! ## Data Storage
//!
//! Everything lives in one JSON file in your local data directory
//! (`~/.local/share/taskflow/store.json` on Linux). Override it with the
//! `TASKFLOW_DB` environment variable or `data_file` in
//! `~/.config/taskflow/config.toml`.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

use taskflow::commands::*;
use taskflow::models::{Priority, Status};
use taskflow::query::{TaskFilter, TaskSort};
use taskflow::store::RecordStore;
use taskflow::tui::run_tui;
use taskflow::{config, logging, storage, FileSubstrate, Workspace};

#[derive(Parser)]
#[command(name = "taskflow", version)]
#[command(about = "Projects and tasks in your terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a name and email
    Login {
        name: String,
        email: String,
    },
    /// Continue without an account
    Guest,
    /// End the current session
    Logout,
    /// Show the active identity
    Whoami,
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show a project's tasks as a kanban board
    Board {
        project: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show totals across all projects
    Stats,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Add a new project
    Add {
        /// Project name (quoted if it has spaces)
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Display color, e.g. "#3b82f6"
        #[arg(short, long)]
        color: Option<String>,
    },
    /// List projects
    List {
        /// Only projects whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Edit a project
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        /// New description (empty to clear)
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a project and all of its tasks
    Remove {
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task to a project
    Add {
        project: String,
        /// Task title (quoted if it has spaces)
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Status::Todo)]
        status: Status,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date in YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// List a project's tasks
    List {
        project: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        /// New description (empty to clear)
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_enum)]
        status: Option<Status>,
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
        /// New due date in YYYY-MM-DD, or "none" to clear
        #[arg(long)]
        due: Option<String>,
    },
    /// Move a task to another column
    Move {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Remove a task
    Remove {
        id: String,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Only tasks whose title contains this text
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum)]
    status: Option<Status>,
    #[arg(long, value_enum)]
    priority: Option<Priority>,
    #[arg(long, value_enum, default_value_t = TaskSort::Created)]
    sort: TaskSort,
}

impl From<FilterArgs> for TaskFilter {
    fn from(args: FilterArgs) -> Self {
        TaskFilter {
            search: args.search.unwrap_or_default(),
            status: args.status,
            priority: args.priority,
            sort: args.sort,
        }
    }
}

fn open_workspace() -> eyre::Result<Workspace<FileSubstrate>> {
    let config = match config::config_path() {
        Some(path) => config::load(&path)?,
        None => config::Config::default(),
    };
    let path = storage::db_path(config.data_file.as_deref());
    let substrate = FileSubstrate::open(path)?;
    let store = RecordStore::new().with_default_color(config.default_color);
    Ok(Workspace::with_store(substrate, store)?)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    logging::setup()?;

    let cli = Cli::parse();
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "taskflow", &mut io::stdout());
        return Ok(());
    }

    let mut ws = open_workspace()?;
    match cli.command {
        Some(Commands::Login { name, email }) => cmd_login(&mut ws, &name, &email, false),
        Some(Commands::Guest) => cmd_guest(&mut ws, false),
        Some(Commands::Logout) => cmd_logout(&mut ws, false),
        Some(Commands::Whoami) => {
            cmd_whoami(&ws);
            Ok(())
        }
        Some(Commands::Project { command }) => match command {
            ProjectCommands::Add { name, description, color } => cmd_project_add(&mut ws, name, description, color, false),
            ProjectCommands::List { search } => cmd_project_list(&ws, search),
            ProjectCommands::Edit { id, name, description, color } => cmd_project_edit(&mut ws, &id, name, description, color, false),
            ProjectCommands::Remove { id, force } => cmd_project_remove(&mut ws, &id, force, false),
        },
        Some(Commands::Task { command }) => match command {
            TaskCommands::Add { project, title, description, status, priority, due } => {
                cmd_task_add(&mut ws, &project, title, description, status, priority, due, false)
            }
            TaskCommands::List { project, filter } => cmd_task_list(&ws, &project, &filter.into()),
            TaskCommands::Edit { id, title, description, status, priority, due } => {
                cmd_task_edit(&mut ws, &id, title, description, status, priority, due, false)
            }
            TaskCommands::Move { id, status } => cmd_task_move(&mut ws, &id, status, false),
            TaskCommands::Remove { id } => cmd_task_remove(&mut ws, &id, false),
        },
        Some(Commands::Board { project, filter }) => cmd_board(&ws, &project, &filter.into()),
        Some(Commands::Stats) => cmd_stats(&ws),
        Some(Commands::Completions { .. }) => Ok(()),
        Some(Commands::Ui) | None => run_tui(ws),
    }
}
