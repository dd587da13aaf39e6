use std::collections::HashSet;

use taskflow::models::{NewProject, NewTask, Priority, ProjectPatch, Status, TaskPatch, DEFAULT_PROJECT_COLOR};
use taskflow::store::{partition_key, RecordStore};
use taskflow::{Error, MemorySubstrate, Substrate, Workspace};

fn guest_workspace() -> Workspace<MemorySubstrate> {
    let mut ws = Workspace::open(MemorySubstrate::new()).unwrap();
    ws.continue_as_guest().unwrap();
    ws
}

#[test]
fn test_create_project_assigns_fresh_id_and_timestamps() {
    let mut ws = guest_workspace();
    let mut seen = HashSet::new();
    for i in 0..20 {
        let p = ws.create_project(NewProject::named(format!("P{i}"))).unwrap();
        assert!(seen.insert(p.id.clone()), "duplicate id {}", p.id);
        assert_eq!(p.created_at, p.updated_at);
    }
    assert_eq!(ws.projects().len(), 20);
    // insertion order is kept
    assert_eq!(ws.projects()[0].name, "P0");
    assert_eq!(ws.projects()[19].name, "P19");
}

#[test]
fn test_launch_scenario() {
    let mut ws = guest_workspace();
    let project = ws.create_project(NewProject::named("Launch")).unwrap();
    assert!(!project.id.is_empty());
    assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
    assert_eq!(ws.projects().len(), 1);

    let task = ws
        .create_task(NewTask {
            status: Status::Todo,
            priority: Priority::Medium,
            ..NewTask::new(&project.id, "Draft spec")
        })
        .unwrap();
    let tasks = ws.tasks_by_project(&project.id);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], &task);

    assert!(ws.delete_project(&project.id).unwrap());
    assert!(ws.tasks_by_project(&project.id).is_empty());
    assert!(ws.task(&task.id).is_none());
}

#[test]
fn test_explicit_color_is_kept() {
    let mut ws = guest_workspace();
    let p = ws
        .create_project(NewProject {
            name: "Green".into(),
            description: None,
            color: Some("#22c55e".into()),
        })
        .unwrap();
    assert_eq!(p.color, "#22c55e");
}

#[test]
fn test_configured_default_color() {
    let mut substrate = MemorySubstrate::new();
    let mut store = RecordStore::new().with_default_color("#000000");
    store.load_for_identity(&mut substrate, Some("u1")).unwrap();
    let p = store.create_project(&mut substrate, NewProject::named("Dark")).unwrap();
    assert_eq!(p.color, "#000000");
}

#[test]
fn test_update_project_merges_only_given_fields() {
    let mut ws = guest_workspace();
    let p = ws
        .create_project(NewProject {
            name: "Site".into(),
            description: Some("marketing".into()),
            color: None,
        })
        .unwrap();

    let updated = ws
        .update_project(&p.id, ProjectPatch { name: Some("Website".into()), ..Default::default() })
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, p.id);
    assert_eq!(updated.name, "Website");
    assert_eq!(updated.description, Some("marketing".into()));
    assert_eq!(updated.color, p.color);
    assert_eq!(updated.created_at, p.created_at);
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(ws.project(&p.id), Some(&updated));

    let cleared = ws
        .update_project(&p.id, ProjectPatch { description: Some(None), ..Default::default() })
        .unwrap()
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.name, "Website");
}

#[test]
fn test_update_task_merges_only_given_fields() {
    let mut ws = guest_workspace();
    let p = ws.create_project(NewProject::named("Ops")).unwrap();
    let due = chrono::NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
    let t = ws
        .create_task(NewTask {
            description: Some("weekly".into()),
            priority: Priority::High,
            due_date: Some(due),
            ..NewTask::new(&p.id, "Rotate keys")
        })
        .unwrap();

    let moved = ws.update_task(&t.id, TaskPatch::status(Status::Doing)).unwrap().unwrap();
    assert_eq!(moved.status, Status::Doing);
    assert_eq!(moved.title, "Rotate keys");
    assert_eq!(moved.description, Some("weekly".into()));
    assert_eq!(moved.priority, Priority::High);
    assert_eq!(moved.due_date, Some(due));
    assert_eq!(moved.project_id, p.id);
    assert_eq!(moved.created_at, t.created_at);
    assert!(moved.updated_at >= t.updated_at);

    let undated = ws
        .update_task(&t.id, TaskPatch { due_date: Some(None), ..Default::default() })
        .unwrap()
        .unwrap();
    assert_eq!(undated.due_date, None);
    assert_eq!(undated.status, Status::Doing);
}

#[test]
fn test_update_and_delete_missing_are_noops() {
    let mut ws = guest_workspace();
    let p = ws.create_project(NewProject::named("Keep")).unwrap();
    let before = ws.substrate().get(&partition_key("guest"));

    let res = ws
        .update_project("missing", ProjectPatch { name: Some("x".into()), ..Default::default() })
        .unwrap();
    assert!(res.is_none());
    assert!(ws.update_task("missing", TaskPatch::status(Status::Done)).unwrap().is_none());
    assert!(!ws.delete_project("missing").unwrap());
    assert!(!ws.delete_task("missing").unwrap());

    assert_eq!(ws.projects().len(), 1);
    assert_eq!(ws.projects()[0], p);
    assert_eq!(ws.substrate().get(&partition_key("guest")), before);
}

#[test]
fn test_delete_project_cascades_only_its_tasks() {
    let mut ws = guest_workspace();
    let a = ws.create_project(NewProject::named("A")).unwrap();
    let b = ws.create_project(NewProject::named("B")).unwrap();
    for i in 0..3 {
        ws.create_task(NewTask::new(&a.id, format!("a{i}"))).unwrap();
    }
    let kept = ws.create_task(NewTask::new(&b.id, "b0")).unwrap();

    assert!(ws.delete_project(&a.id).unwrap());
    assert!(ws.project(&a.id).is_none());
    assert_eq!(ws.tasks().len(), 1);
    assert_eq!(ws.tasks()[0], kept);
    assert_eq!(ws.projects().len(), 1);
}

#[test]
fn test_delete_task() {
    let mut ws = guest_workspace();
    let p = ws.create_project(NewProject::named("P")).unwrap();
    let t1 = ws.create_task(NewTask::new(&p.id, "one")).unwrap();
    let t2 = ws.create_task(NewTask::new(&p.id, "two")).unwrap();

    assert!(ws.delete_task(&t1.id).unwrap());
    assert_eq!(ws.tasks_by_project(&p.id), vec![&t2]);
}

#[test]
fn test_create_task_requires_existing_project() {
    let mut ws = guest_workspace();
    let err = ws.create_task(NewTask::new("nope", "orphan")).unwrap_err();
    assert!(matches!(err, Error::UnknownProject(id) if id == "nope"));
    assert!(ws.tasks().is_empty());
}

#[test]
fn test_persist_then_load_round_trips() {
    let mut ws = guest_workspace();
    let p = ws.create_project(NewProject::named("Roundtrip")).unwrap();
    ws.create_task(NewTask {
        due_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 31),
        ..NewTask::new(&p.id, "Check")
    })
    .unwrap();
    let projects = ws.projects().to_vec();
    let tasks = ws.tasks().to_vec();

    let reopened = Workspace::open(ws.into_substrate()).unwrap();
    assert!(reopened.session().is_guest());
    assert_eq!(reopened.projects(), projects.as_slice());
    assert_eq!(reopened.tasks(), tasks.as_slice());
}

#[test]
fn test_snapshot_layout() {
    let mut ws = guest_workspace();
    let p = ws.create_project(NewProject::named("Layout")).unwrap();
    ws.create_task(NewTask::new(&p.id, "Shape")).unwrap();

    let raw = ws.substrate().get("taskflow:data:guest").unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["projects"][0]["name"], "Layout");
    assert!(v["projects"][0]["createdAt"].is_string());
    assert_eq!(v["tasks"][0]["projectId"], p.id.as_str());
    assert_eq!(v["tasks"][0]["status"], "todo");
    assert_eq!(v["tasks"][0]["priority"], "medium");
}

#[test]
fn test_identity_switch_keeps_partitions_apart() {
    let mut ws = Workspace::open(MemorySubstrate::new()).unwrap();
    let alice = ws.authenticate("Alice", "alice@example.com").unwrap();
    ws.create_project(NewProject::named("Alice's")).unwrap();

    ws.continue_as_guest().unwrap();
    assert!(ws.projects().is_empty());
    ws.create_project(NewProject::named("Guest's")).unwrap();

    // back to alice's partition by loading it directly
    let mut substrate = ws.into_substrate();
    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some(alice.id())).unwrap();
    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].name, "Alice's");

    store.load_for_identity(&mut substrate, Some("guest")).unwrap();
    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].name, "Guest's");
}

#[test]
fn test_malformed_snapshot_loads_empty() {
    let mut substrate = MemorySubstrate::new();
    substrate.set(&partition_key("guest"), "{not json".to_string()).unwrap();

    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some("guest")).unwrap();
    assert!(store.projects().is_empty());
    assert!(store.tasks().is_empty());
    // the load persists the healed snapshot
    let raw = substrate.get(&partition_key("guest")).unwrap();
    assert_eq!(raw, r#"{"projects":[],"tasks":[]}"#);
}

#[test]
fn test_malformed_member_only_drops_that_member() {
    let mut substrate = MemorySubstrate::new();
    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some("u")).unwrap();
    store.create_project(&mut substrate, NewProject::named("Survivor")).unwrap();

    let raw = substrate.get(&partition_key("u")).unwrap();
    let mut v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    v["tasks"] = serde_json::json!("not an array");
    substrate.set(&partition_key("u"), v.to_string()).unwrap();

    let mut reloaded = RecordStore::new();
    reloaded.load_for_identity(&mut substrate, Some("u")).unwrap();
    assert_eq!(reloaded.projects().len(), 1);
    assert_eq!(reloaded.projects()[0].name, "Survivor");
    assert!(reloaded.tasks().is_empty());
}

#[test]
fn test_malformed_record_only_drops_that_record() {
    let mut substrate = MemorySubstrate::new();
    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some("u")).unwrap();
    let p = store.create_project(&mut substrate, NewProject::named("Launch")).unwrap();
    for title in ["one", "two", "three"] {
        store.create_task(&mut substrate, NewTask::new(&p.id, title)).unwrap();
    }

    let raw = substrate.get(&partition_key("u")).unwrap();
    let mut v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    v["tasks"][1]["status"] = serde_json::json!("blocked");
    substrate.set(&partition_key("u"), v.to_string()).unwrap();

    let mut reloaded = RecordStore::new();
    reloaded.load_for_identity(&mut substrate, Some("u")).unwrap();
    let titles: Vec<&str> = reloaded.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["one", "three"]);
    assert_eq!(reloaded.projects().len(), 1);

    // the healed snapshot written back keeps the valid siblings
    let raw = substrate.get(&partition_key("u")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(v["projects"].as_array().unwrap().len(), 1);
}

#[test]
fn test_non_object_snapshot_loads_empty() {
    let mut substrate = MemorySubstrate::new();
    substrate.set(&partition_key("u"), "[1, 2, 3]".to_string()).unwrap();
    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some("u")).unwrap();
    assert!(store.projects().is_empty());
}

#[test]
fn test_load_without_identity_clears_and_touches_nothing() {
    let mut substrate = MemorySubstrate::new();
    let mut store = RecordStore::new();
    store.load_for_identity(&mut substrate, Some("u")).unwrap();
    store.create_project(&mut substrate, NewProject::named("Mine")).unwrap();
    let before: Vec<String> = substrate.keys().map(str::to_string).collect();

    store.load_for_identity(&mut substrate, None).unwrap();
    assert!(store.projects().is_empty());
    assert!(store.partition().is_none());
    let after: Vec<String> = substrate.keys().map(str::to_string).collect();
    assert_eq!(before, after);

    // mutations without an identity are not persisted anywhere
    store.create_project(&mut substrate, NewProject::named("Loose")).unwrap();
    assert_eq!(substrate.keys().count(), after.len());
}
