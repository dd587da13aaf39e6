use taskflow::models::{NewProject, NewTask, Priority, Status};
use taskflow::tui::app::{App, InputField, InputMode, ViewMode};
use taskflow::{MemorySubstrate, Workspace};

fn type_text(app: &mut App<MemorySubstrate>, text: &str) {
    app.input_buffer = text.to_string();
    app.handle_input();
}

fn guest_app_with_board() -> App<MemorySubstrate> {
    let mut ws = Workspace::open(MemorySubstrate::new()).unwrap();
    ws.continue_as_guest().unwrap();
    let p = ws.create_project(NewProject::named("Launch")).unwrap();
    ws.create_task(NewTask::new(&p.id, "First")).unwrap();
    ws.create_task(NewTask::new(&p.id, "Second")).unwrap();
    let mut app = App::new(ws);
    app.open_selected();
    app
}

#[test]
fn test_starts_on_sign_in_without_identity() {
    let app = App::new(Workspace::open(MemorySubstrate::new()).unwrap());
    assert_eq!(app.view_mode, ViewMode::SignIn);
}

#[test]
fn test_sign_in_wizard() {
    let mut app = App::new(Workspace::open(MemorySubstrate::new()).unwrap());
    app.start_add();
    type_text(&mut app, "Ada");
    assert_eq!(app.input_mode, InputMode::Adding);
    type_text(&mut app, "bad-email");
    assert_eq!(app.view_mode, ViewMode::SignIn);
    assert!(app.message.as_deref().unwrap().contains("Invalid email format"));

    app.start_add();
    type_text(&mut app, "Ada");
    type_text(&mut app, "ada@example.com");
    assert_eq!(app.view_mode, ViewMode::Projects);
    assert_eq!(app.workspace.identity().unwrap().name(), "Ada");
}

#[test]
fn test_guest_then_add_and_rename_project() {
    let mut app = App::new(Workspace::open(MemorySubstrate::new()).unwrap());
    app.continue_as_guest();
    assert_eq!(app.view_mode, ViewMode::Projects);

    app.start_add();
    type_text(&mut app, "Website");
    type_text(&mut app, "");
    assert_eq!(app.projects().len(), 1);
    assert_eq!(app.selected_project().unwrap().name, "Website");
    assert_eq!(app.projects()[0].description, None);

    app.start_edit(InputField::ProjectName);
    assert_eq!(app.input_buffer, "Website");
    type_text(&mut app, "Site");
    assert_eq!(app.projects()[0].name, "Site");
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn test_move_card_across_columns() {
    let mut app = guest_app_with_board();
    assert_eq!(app.view_mode, ViewMode::Board);
    assert_eq!(app.selected_task().unwrap().title, "First");

    app.move_selected(true);
    assert_eq!(app.column, Status::Doing);
    let t = app.selected_task().unwrap();
    assert_eq!(t.title, "First");
    assert_eq!(t.status, Status::Doing);

    app.move_selected(true);
    app.move_selected(true); // already done, stays
    assert_eq!(app.selected_task().unwrap().status, Status::Done);

    app.focus_column(false);
    app.focus_column(false);
    assert_eq!(app.column, Status::Todo);
    assert_eq!(app.board().todo.len(), 1);
    assert_eq!(app.selected_task().unwrap().title, "Second");
}

#[test]
fn test_board_add_edit_and_delete() {
    let mut app = guest_app_with_board();
    app.focus_column(true);
    app.start_add();
    type_text(&mut app, "Third");
    type_text(&mut app, "2025-12-01");
    let t = app.selected_task().unwrap();
    assert_eq!(t.title, "Third");
    assert_eq!(t.status, Status::Doing);
    assert_eq!(t.due_date, chrono::NaiveDate::from_ymd_opt(2025, 12, 1));

    app.cycle_priority();
    assert_eq!(app.selected_task().unwrap().priority, Priority::High);

    app.start_edit(InputField::TaskDue);
    type_text(&mut app, "soon");
    assert!(app.message.is_some());
    assert!(app.selected_task().unwrap().due_date.is_some());

    app.delete_selected();
    assert!(app.board().doing.is_empty());
    assert!(app.selected_task().is_none());
}

#[test]
fn test_delete_project_from_list_cascades() {
    let mut app = guest_app_with_board();
    app.back();
    assert_eq!(app.view_mode, ViewMode::Projects);
    app.delete_selected();
    assert!(app.projects().is_empty());
    assert!(app.workspace.tasks().is_empty());
    assert!(app.selected_project().is_none());
}

#[test]
fn test_sign_out_returns_to_sign_in() {
    let mut app = guest_app_with_board();
    app.back();
    app.sign_out();
    assert_eq!(app.view_mode, ViewMode::SignIn);
    assert!(app.workspace.identity().is_none());
    assert!(app.projects().is_empty());
}
