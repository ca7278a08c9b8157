use duetrack_core::db::open_db_in_memory;
use duetrack_core::{
    NewTask, RepoError, SqliteTaskRepository, Task, TaskCategory, TaskListQuery, TaskRepository,
    TaskService, TaskServiceError, TaskValidationError,
};
use uuid::Uuid;

const NOW: i64 = 1_760_000_000_000;
const MINUTE: i64 = 60_000;

#[test]
fn create_and_get_roundtrip_preserves_metadata() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let mut task = Task::new("contract review").due(NOW + 90 * MINUTE);
    task.client = Some("Acme Corp".to_string());
    task.due_timezone = Some("Europe/Berlin".to_string());
    task.category = TaskCategory::Business;
    repo.create_task(&task).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn get_missing_returns_none_and_update_missing_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let task = Task::new("ghost");
    assert!(repo.get_task(task.id).unwrap().is_none());
    let err = repo.update_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn create_rejects_invalid_task() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let task = Task::new("   ");
    let err = repo.create_task(&task).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::BlankTitle)
    ));
}

#[test]
fn reminder_candidates_exclude_completed_and_undated_in_due_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let later = Task::new("later").due(NOW + 120 * MINUTE);
    let sooner = Task::new("sooner").due(NOW + 10 * MINUTE);
    let undated = Task::new("undated");
    let mut done = Task::new("done").due(NOW + 5 * MINUTE);
    done.completed = true;
    for task in [&later, &sooner, &undated, &done] {
        repo.create_task(task).unwrap();
    }

    let ids: Vec<Uuid> = repo
        .list_reminder_candidates()
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(ids, vec![sooner.id, later.id]);
}

#[test]
fn list_filters_by_category_client_and_completion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let mut business = Task::new("quote");
    business.category = TaskCategory::Business;
    business.client = Some("Initech".to_string());
    let personal = Task::new("groceries");
    let mut finished = Task::new("taxes");
    finished.completed = true;
    for task in [&business, &personal, &finished] {
        repo.create_task(task).unwrap();
    }

    assert_eq!(repo.list_tasks(&TaskListQuery::default()).unwrap().len(), 2);
    let all = TaskListQuery {
        include_completed: true,
        ..TaskListQuery::default()
    };
    assert_eq!(repo.list_tasks(&all).unwrap().len(), 3);

    let by_client = TaskListQuery {
        client: Some("Initech".to_string()),
        category: Some(TaskCategory::Business),
        ..TaskListQuery::default()
    };
    let found = repo.list_tasks(&by_client).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, business.id);
}

#[test]
fn corrupted_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (id, title) VALUES ('not-a-uuid', 'broken');",
        [],
    )
    .unwrap();
    let repo = SqliteTaskRepository::new(&conn);

    let err = repo.list_tasks(&TaskListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn service_lifecycle_updates_reminder_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let id = service
        .add_task(NewTask {
            title: "renew lease".to_string(),
            ..NewTask::default()
        })
        .unwrap();
    assert!(service.reminder_snapshot().unwrap().is_empty());

    service
        .set_due(id, NOW + 60 * MINUTE, Some("America/New_York".to_string()))
        .unwrap();
    assert_eq!(service.reminder_snapshot().unwrap().len(), 1);

    let completed = service.complete(id).unwrap();
    assert!(completed.completed);
    assert!(service.reminder_snapshot().unwrap().is_empty());

    service.reopen(id).unwrap();
    let cleared = service.clear_due(id).unwrap();
    assert_eq!(cleared.due_at, None);
    assert_eq!(cleared.due_timezone, None);

    service.delete(id).unwrap();
    assert!(matches!(
        service.get(id),
        Err(TaskServiceError::TaskNotFound(missing)) if missing == id
    ));
    assert!(matches!(
        service.delete(id),
        Err(TaskServiceError::TaskNotFound(_))
    ));
}

#[test]
fn export_then_import_into_fresh_store_upserts() {
    let source_conn = open_db_in_memory().unwrap();
    let source = TaskService::new(SqliteTaskRepository::new(&source_conn));
    let id = source
        .add_task(NewTask {
            title: "ship v2".to_string(),
            due_at: Some(NOW + 30 * MINUTE),
            client: Some("Globex".to_string()),
            category: TaskCategory::Business,
            ..NewTask::default()
        })
        .unwrap();
    let exported = source.export_json().unwrap();

    let target_conn = open_db_in_memory().unwrap();
    let target = TaskService::new(SqliteTaskRepository::new(&target_conn));
    let first = target.import_json(&exported).unwrap();
    assert_eq!((first.created, first.updated), (1, 0));

    let second = target.import_json(&exported).unwrap();
    assert_eq!((second.created, second.updated), (0, 1));
    assert_eq!(target.get(id).unwrap(), source.get(id).unwrap());
}

#[test]
fn import_rejects_invalid_records_and_unknown_versions() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let blank_title = r#"{"version":1,"tasks":[{"id":"11111111-2222-4333-8444-555555555555","title":" "}]}"#;
    assert!(matches!(
        service.import_json(blank_title),
        Err(TaskServiceError::Import(_))
    ));

    let future = r#"{"version":7,"tasks":[]}"#;
    assert!(matches!(
        service.import_json(future),
        Err(TaskServiceError::UnsupportedExportVersion(7))
    ));
    assert!(service
        .list(&TaskListQuery {
            include_completed: true,
            ..TaskListQuery::default()
        })
        .unwrap()
        .is_empty());
}

#[test]
fn failed_import_rolls_back_earlier_records() {
    let target_conn = open_db_in_memory().unwrap();
    let target = TaskService::new(SqliteTaskRepository::new(&target_conn));
    let existing = target
        .add_task(NewTask {
            title: "draft budget".to_string(),
            due_at: Some(NOW + 45 * MINUTE),
            ..NewTask::default()
        })
        .unwrap();

    let source_conn = open_db_in_memory().unwrap();
    let source_repo = SqliteTaskRepository::new(&source_conn);
    let mut renamed = target.get(existing).unwrap();
    renamed.title = "final budget".to_string();
    source_repo.create_task(&renamed).unwrap();
    source_repo
        .create_task(&Task::new("rejected by store"))
        .unwrap();
    let exported = TaskService::new(source_repo).export_json().unwrap();

    target_conn
        .execute_batch(
            "CREATE TRIGGER reject_title BEFORE INSERT ON tasks
             WHEN NEW.title = 'rejected by store'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

    assert!(matches!(
        target.import_json(&exported),
        Err(TaskServiceError::Repo(RepoError::Db(_)))
    ));

    let tasks = target
        .list(&TaskListQuery {
            include_completed: true,
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "draft budget");

    // The connection is usable again once the batch rolled back.
    target.complete(existing).unwrap();
}
