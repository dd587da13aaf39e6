use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};
use chrono::Local;

use crate::models::{Priority, Status};
use crate::query::{progress, stats};
use crate::storage::Substrate;
use super::app::{App, InputField, InputMode, ViewMode};

pub fn ui<S: Substrate>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Main
            Constraint::Length(1), // Message
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::SignIn => draw_sign_in(f, chunks[0]),
        ViewMode::Projects => draw_projects(f, app, chunks[0]),
        ViewMode::Board => draw_board(f, app, chunks[0]),
    }

    if let Some(msg) = &app.message {
        f.render_widget(Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Yellow)), chunks[1]);
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::SignIn => "q: Quit | Enter/l: Sign in | g: Continue as Guest",
            ViewMode::Projects => "q: Quit | a: Add | n: Rename | d: Del | Enter: Open Board | o: Sign out",
            ViewMode::Board => "q: Quit | h/l: Column | j/k: Card | H/L: Move Card | a: Add | n: Title | t: Due | p: Priority | d: Del | Esc: Back",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
        f.render_widget(Clear, area); // Clear the area first

        let title = match app.input_mode {
            InputMode::Adding => match (&app.view_mode, app.add_state.step) {
                (ViewMode::SignIn, 0) => "Sign in: Enter Name",
                (ViewMode::SignIn, _) => "Sign in: Enter Email",
                (ViewMode::Projects, 0) => "Add Project: Enter Name",
                (ViewMode::Projects, _) => "Add Project: Enter Description (Optional)",
                (ViewMode::Board, 0) => "Add Task: Enter Title",
                (ViewMode::Board, _) => "Add Task: Enter Due Date (YYYY-MM-DD, Optional)",
            },
            InputMode::Editing => match app.input_field {
                InputField::ProjectName => "Rename Project",
                InputField::TaskTitle => "Edit Title",
                InputField::TaskDue => "Edit Due Date (YYYY-MM-DD, empty to clear)",
                InputField::None => "Edit",
            },
            InputMode::Normal => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn draw_sign_in(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("TaskFlow", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("Manage your projects and tasks efficiently"),
        Line::from(""),
        Line::from("Press Enter to sign in with your name and email, or g to continue as guest."),
    ];
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("TaskFlow - Sign in"));
    f.render_widget(p, area);
}

fn draw_projects<S: Substrate>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let s = stats(app.workspace.projects(), app.workspace.tasks());
    let who = app.workspace.identity().map(|i| i.name().to_string()).unwrap_or_default();
    let title = format!(
        "TaskFlow - {} | Projects {} | Tasks {} | In Progress {} | Completed {}",
        who, s.total_projects, s.total_tasks, s.in_progress_tasks, s.completed_tasks
    );

    let rows: Vec<Row> = app
        .workspace
        .projects()
        .iter()
        .map(|p| {
            let tasks = app.workspace.tasks_by_project(&p.id);
            Row::new(vec![
                Cell::from(p.name.clone()).style(Style::default().fg(hex_color(&p.color))),
                Cell::from(p.description.clone().unwrap_or_default()),
                Cell::from(tasks.len().to_string()),
                Cell::from(format!("{}%", progress(&tasks))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Name", "Description", "Tasks", "Progress"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.project_state);
}

fn draw_board<S: Substrate>(f: &mut Frame, app: &App<S>, area: Rect) {
    let title = app
        .current_project()
        .map(|p| format!("TaskFlow - {}", p.name))
        .unwrap_or_else(|| "TaskFlow".to_string());
    let outer = Block::default().borders(Borders::ALL).title(title);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ].as_ref())
        .split(inner);

    let today = Local::now().date_naive();
    let board = app.board();
    for (i, status) in Status::ALL.into_iter().enumerate() {
        let tasks = board.column(status);
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|t| {
                let mut spans = vec![
                    Span::styled(format!("[{}] ", t.priority), Style::default().fg(priority_color(t.priority))),
                    Span::raw(t.title.clone()),
                ];
                if let Some(d) = t.due_date {
                    let overdue = d < today && t.status != Status::Done;
                    spans.push(Span::styled(
                        format!("  {}", d),
                        Style::default().fg(if overdue { Color::Red } else { Color::Gray }),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let focused = app.column == status;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!("{} ({})", status.label(), tasks.len())))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
            .highlight_symbol(">> ");

        let mut state = ListState::default();
        if focused && !tasks.is_empty() {
            state.select(Some(app.card));
        }
        f.render_stateful_widget(list, columns[i], &mut state);
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn hex_color(s: &str) -> Color {
    s.strip_prefix('#')
        .filter(|h| h.len() == 6)
        .and_then(|h| u32::from_str_radix(h, 16).ok())
        .map(|v| Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
        .unwrap_or(Color::Reset)
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
