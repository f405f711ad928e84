//! Checklist end-to-end behavior over the bundled SQLite backend.

use std::sync::Arc;
use vowly_core::model::task::DEFAULT_TASK_CATEGORY;
use vowly_core::service::task_service::{TaskBoard, TaskError};
use vowly_core::store::{RemoteStore, SessionContext, SqliteStore};

fn open_board(store: &Arc<SqliteStore>, user_id: &str) -> TaskBoard {
    let ctx = SessionContext::new(user_id).unwrap();
    TaskBoard::open(Arc::clone(store) as Arc<dyn RemoteStore>, ctx).unwrap()
}

#[test]
fn add_task_defaults_category_and_starts_uncompleted() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-add");

    let id = board.add_task("book florist", None, None).unwrap();

    let task = board
        .tasks()
        .into_iter()
        .find(|task| task.id == id)
        .expect("task should be mirrored");
    assert_eq!(task.category, DEFAULT_TASK_CATEGORY);
    assert!(!task.completed);
    assert!(task.created_at > 0);
}

#[test]
fn blank_task_text_is_rejected() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-blank");

    let err = board.add_task("   ", None, None).unwrap_err();
    assert!(matches!(err, TaskError::Invalid(_)));
    assert!(board.tasks().is_empty());
}

#[test]
fn toggle_flips_completion_both_ways() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-toggle");

    let id = board.add_task("send invites", None, None).unwrap();

    board.toggle_task(&id).unwrap();
    assert!(board.tasks()[0].completed);

    board.toggle_task(&id).unwrap();
    assert!(!board.tasks()[0].completed);
}

#[test]
fn toggle_of_unknown_task_is_a_typed_not_found() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-unknown");

    let err = board.toggle_task("no-such-task").unwrap_err();
    assert!(matches!(err, TaskError::NotFound(_)));
}

#[test]
fn category_filter_and_completion_ratio() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-filter");

    let venue_task = board.add_task("visit venue", Some("Venue"), None).unwrap();
    board.add_task("choose menu", Some("Catering"), None).unwrap();
    board.add_task("fit the dress", Some("Attire"), None).unwrap();

    assert_eq!(board.tasks_in_category(None).len(), 3);
    assert_eq!(board.tasks_in_category(Some("Venue")).len(), 1);
    assert!(board.tasks_in_category(Some("Music")).is_empty());

    assert_eq!(board.completion_ratio(), 0.0);
    board.toggle_task(&venue_task).unwrap();
    let ratio = board.completion_ratio();
    assert!((ratio - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn completion_ratio_of_empty_board_is_zero() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-empty-ratio");
    assert_eq!(board.completion_ratio(), 0.0);
}

#[test]
fn delete_removes_the_task_and_tolerates_absent_ids() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-delete");

    let id = board.add_task("order cake", None, None).unwrap();
    board.delete_task(&id).unwrap();
    assert!(board.tasks().is_empty());

    // Deleting the same id again is a no-op, not an error.
    board.delete_task(&id).unwrap();
}

#[test]
fn deadline_survives_the_write_path() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let board = open_board(&store, "uid-deadline");

    let deadline = 1_900_000_000_000;
    let id = board
        .add_task("final payment", Some("Venue"), Some(deadline))
        .unwrap();

    let task = board
        .tasks()
        .into_iter()
        .find(|task| task.id == id)
        .expect("task should be mirrored");
    assert_eq!(task.deadline, Some(deadline));
    assert!(!task.is_overdue(deadline - 1));
    assert!(task.is_overdue(deadline + 1));
}
