use outline_core::db::open_db_in_memory;
use outline_core::{
    Item, ItemChanges, NoteChanges, NoteRecord, OutlineRepository, RepoError,
    SqliteOutlineRepository,
};
use rusqlite::Connection;

fn note_record(id: &str, date: i64) -> NoteRecord {
    NoteRecord {
        id: id.to_string(),
        title: format!("note {id}"),
        date,
    }
}

fn item(id: &str, note_id: &str, title: &str, level: u32, position: f64) -> Item {
    let mut item = Item::new(id.to_string(), note_id.to_string(), level, position);
    item.title = title.to_string();
    item
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteOutlineRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert!(expected_version > 0);
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection was accepted"),
    }
}

#[test]
fn notes_load_in_ascending_date_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();

    repo.add_note(&note_record("late", 300)).unwrap();
    repo.add_note(&note_record("early", 100)).unwrap();
    repo.add_note(&note_record("middle", 200)).unwrap();

    let ids: Vec<String> = repo
        .load_notes()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(ids, vec!["early", "middle", "late"]);
}

#[test]
fn duplicate_note_id_maps_to_already_exists() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();

    repo.add_note(&note_record("n1", 1)).unwrap();
    let err = repo.add_note(&note_record("n1", 2)).unwrap_err();

    assert!(matches!(err, RepoError::NoteAlreadyExists(id) if id == "n1"));
    assert_eq!(repo.load_notes().unwrap().len(), 1);
}

#[test]
fn patch_note_updates_title_and_reports_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    repo.add_note(&note_record("n1", 1)).unwrap();

    repo.patch_note(
        "n1",
        &NoteChanges {
            title: "Groceries".to_string(),
        },
    )
    .unwrap();
    assert_eq!(repo.load_notes().unwrap()[0].title, "Groceries");

    let err = repo
        .patch_note(
            "missing",
            &NoteChanges {
                title: "x".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NoteNotFound(id) if id == "missing"));
}

#[test]
fn items_load_by_note_in_position_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();

    repo.add_item(&item("b", "n1", "second", 0, 2000.0)).unwrap();
    repo.add_item(&item("a", "n1", "first", 0, 500.0)).unwrap();
    repo.add_item(&item("c", "n1", "third", 1, 2500.0)).unwrap();
    repo.add_item(&item("x", "n2", "other note", 0, 1.0)).unwrap();

    let items = repo.load_items("n1").unwrap();
    let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(items[2].level, 1);
    assert!(items.iter().all(|item| item.note_id == "n1"));
}

#[test]
fn patch_item_overwrites_mutable_fields_and_keeps_collapsed_subtree() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    repo.add_item(&item("root", "n1", "Chores", 0, 1000.0))
        .unwrap();

    let mut hidden = item("child", "n1", "Laundry", 1, 1500.0);
    hidden.collapsed = vec![item("grandchild", "n1", "Socks", 1, 1750.0)];
    let changes = ItemChanges {
        title: "Weekend chores".to_string(),
        level: 2,
        position: 1200.0,
        done: Some(true),
        collapsed: vec![hidden.clone()],
    };
    repo.patch_item("root", &changes).unwrap();

    let stored = repo.load_items("n1").unwrap().remove(0);
    assert_eq!(stored.title, "Weekend chores");
    assert_eq!(stored.level, 2);
    assert_eq!(stored.position, 1200.0);
    assert_eq!(stored.done, Some(true));
    assert_eq!(stored.collapsed, vec![hidden]);
}

#[test]
fn patch_missing_item_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let changes = ItemChanges::from(&item("ghost", "n1", "gone", 0, 1.0));

    let err = repo.patch_item("ghost", &changes).unwrap_err();
    assert!(matches!(err, RepoError::ItemNotFound(id) if id == "ghost"));
}

#[test]
fn deletes_ignore_missing_rows_and_report_item_counts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    repo.add_note(&note_record("n1", 1)).unwrap();
    repo.add_item(&item("a", "n1", "a", 0, 1000.0)).unwrap();
    repo.add_item(&item("b", "n1", "b", 0, 2000.0)).unwrap();
    repo.add_item(&item("c", "n2", "c", 0, 1000.0)).unwrap();

    repo.delete_item("a").unwrap();
    repo.delete_item("a").unwrap();
    assert_eq!(repo.delete_items_of_note("n1").unwrap(), 1);
    assert_eq!(repo.delete_items_of_note("n1").unwrap(), 0);
    repo.delete_note("n1").unwrap();
    repo.delete_note("n1").unwrap();

    assert!(repo.load_notes().unwrap().is_empty());
    assert!(repo.load_items("n1").unwrap().is_empty());
    assert_eq!(repo.load_items("n2").unwrap().len(), 1);
}

#[test]
fn malformed_done_value_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO items (id, note_id, title, level, position, done)
         VALUES ('bad', 'n1', 'broken', 0, 1000, 7);",
    )
    .unwrap();
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();

    let err = repo.load_items("n1").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("done")));
}
