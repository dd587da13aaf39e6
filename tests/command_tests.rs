use std::path::PathBuf;

use taskflow::commands::*;
use taskflow::models::{Priority, Status};
use taskflow::{FileSubstrate, Workspace};

fn with_test_db<F>(f: F)
where
    F: FnOnce(PathBuf),
{
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("store.json");
    f(db_path);
}

fn open(path: &PathBuf) -> Workspace<FileSubstrate> {
    Workspace::open(FileSubstrate::open(path).unwrap()).unwrap()
}

#[test]
fn test_store_commands_require_sign_in() {
    with_test_db(|path| {
        let mut ws = open(&path);
        assert!(cmd_project_add(&mut ws, "Nope".into(), None, None, true).is_err());
        assert!(cmd_stats(&ws).is_err());
        assert!(!path.exists());
    });
}

#[test]
fn test_login_and_add_project_survive_restart() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_login(&mut ws, "Ada", "ada@example.com", true).unwrap();
        cmd_project_add(&mut ws, "Launch".into(), Some("Q3".into()), None, true).unwrap();

        let ws = open(&path);
        assert_eq!(ws.identity().unwrap().name(), "Ada");
        assert_eq!(ws.projects().len(), 1);
        assert_eq!(ws.projects()[0].name, "Launch");
        assert_eq!(ws.projects()[0].description, Some("Q3".into()));
    });
}

#[test]
fn test_login_rejects_bad_email() {
    with_test_db(|path| {
        let mut ws = open(&path);
        let err = cmd_login(&mut ws, "Ada", "not-an-email", true).unwrap_err();
        assert!(err.to_string().contains("Invalid email format"));
        assert!(ws.identity().is_none());
    });
}

#[test]
fn test_task_lifecycle_with_id_prefixes() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        cmd_project_add(&mut ws, "Launch".into(), None, None, true).unwrap();
        let project_id = ws.projects()[0].id.clone();

        // the full id and a unique prefix both resolve
        cmd_task_add(&mut ws, &project_id, "Draft spec".into(), None, Status::Todo, Priority::Medium, Some("2025-12-01".into()), true).unwrap();
        cmd_task_add(&mut ws, &project_id[..20], "Review".into(), None, Status::Todo, Priority::Low, None, true).unwrap();
        assert_eq!(ws.tasks_by_project(&project_id).len(), 2);

        let task_id = ws.tasks()[0].id.clone();
        cmd_task_move(&mut ws, &task_id.to_lowercase(), Status::Doing, true).unwrap();
        assert_eq!(ws.task(&task_id).unwrap().status, Status::Doing);

        cmd_task_edit(&mut ws, &task_id, Some("Final spec".into()), None, None, Some(Priority::High), Some("none".into()), true).unwrap();
        let t = ws.task(&task_id).unwrap();
        assert_eq!(t.title, "Final spec");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.due_date, None);
        assert_eq!(t.status, Status::Doing);

        cmd_task_remove(&mut ws, &task_id, true).unwrap();
        assert!(ws.task(&task_id).is_none());

        let ws = open(&path);
        assert_eq!(ws.tasks().len(), 1);
        assert_eq!(ws.tasks()[0].title, "Review");
    });
}

#[test]
fn test_task_add_validates_input() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        cmd_project_add(&mut ws, "P".into(), None, None, true).unwrap();
        let pid = ws.projects()[0].id.clone();

        assert!(cmd_task_add(&mut ws, "missing", "x".into(), None, Status::Todo, Priority::Low, None, true).is_err());
        assert!(cmd_task_add(&mut ws, &pid, "x".into(), None, Status::Todo, Priority::Low, Some("12/01/2025".into()), true).is_err());
        assert!(cmd_task_add(&mut ws, &pid, "  ".into(), None, Status::Todo, Priority::Low, None, true).is_err());
        assert!(ws.tasks().is_empty());
    });
}

#[test]
fn test_project_edit_and_forced_remove() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        cmd_project_add(&mut ws, "Old".into(), Some("desc".into()), None, true).unwrap();
        let pid = ws.projects()[0].id.clone();
        cmd_task_add(&mut ws, &pid, "t".into(), None, Status::Todo, Priority::Low, None, true).unwrap();

        cmd_project_edit(&mut ws, &pid, Some("New".into()), Some(String::new()), Some("#ef4444".into()), true).unwrap();
        let p = ws.project(&pid).unwrap();
        assert_eq!(p.name, "New");
        assert_eq!(p.description, None);
        assert_eq!(p.color, "#ef4444");

        cmd_project_remove(&mut ws, &pid, true, true).unwrap();
        assert!(ws.projects().is_empty());
        assert!(ws.tasks().is_empty());
    });
}

#[test]
fn test_edit_rejects_blank_names_and_trims() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        cmd_project_add(&mut ws, "Launch".into(), None, None, true).unwrap();
        let pid = ws.projects()[0].id.clone();
        cmd_task_add(&mut ws, &pid, "Draft".into(), None, Status::Todo, Priority::Low, None, true).unwrap();
        let tid = ws.tasks()[0].id.clone();

        assert!(cmd_project_edit(&mut ws, &pid, Some(String::new()), None, None, true).is_err());
        assert!(cmd_project_edit(&mut ws, &pid, Some("   ".into()), None, None, true).is_err());
        assert!(cmd_task_edit(&mut ws, &tid, Some("  ".into()), None, None, None, None, true).is_err());
        assert_eq!(ws.project(&pid).unwrap().name, "Launch");
        assert_eq!(ws.task(&tid).unwrap().title, "Draft");

        cmd_project_edit(&mut ws, &pid, Some("  Relaunch ".into()), None, None, true).unwrap();
        cmd_task_edit(&mut ws, &tid, Some(" Final ".into()), None, None, None, None, true).unwrap();
        assert_eq!(ws.project(&pid).unwrap().name, "Relaunch");
        assert_eq!(ws.task(&tid).unwrap().title, "Final");
    });
}

#[test]
fn test_missing_ids_are_not_errors() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        assert!(cmd_task_remove(&mut ws, "nothing", true).is_ok());
        assert!(cmd_task_move(&mut ws, "nothing", Status::Done, true).is_ok());
        assert!(cmd_project_edit(&mut ws, "nothing", Some("x".into()), None, None, true).is_ok());
        assert!(cmd_project_remove(&mut ws, "nothing", true, true).is_ok());
    });
}

#[test]
fn test_logout_hides_data_until_guest_returns() {
    with_test_db(|path| {
        let mut ws = open(&path);
        cmd_guest(&mut ws, true).unwrap();
        cmd_project_add(&mut ws, "Mine".into(), None, None, true).unwrap();
        cmd_logout(&mut ws, true).unwrap();
        assert!(ws.projects().is_empty());

        let mut ws = open(&path);
        assert!(ws.identity().is_none());
        cmd_guest(&mut ws, true).unwrap();
        assert_eq!(ws.projects().len(), 1);
    });
}

#[test]
fn test_parse_due() {
    assert_eq!(parse_due("2025-12-01").unwrap(), chrono::NaiveDate::from_ymd_opt(2025, 12, 1));
    assert_eq!(parse_due("").unwrap(), None);
    assert_eq!(parse_due("None").unwrap(), None);
    assert!(parse_due("tomorrow").is_err());
}

#[test]
fn test_corrupted_store_file_is_reported() {
    with_test_db(|path| {
        std::fs::write(&path, "not json").unwrap();
        assert!(FileSubstrate::open(&path).is_err());
    });
}
