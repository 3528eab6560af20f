use rusqlite::Connection;
use todolist_core::db::open_db_in_memory;
use todolist_core::{
    ProcedureError, Session, SqliteTodoRepository, SqliteUserRepository, TodoService,
    TodoValidationError, UserId, UserRepository,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn sign_in(conn: &Connection, user: &str) -> Session {
    let user_id = UserId::parse(user).unwrap();
    SqliteUserRepository::new(conn)
        .ensure_user(&user_id)
        .unwrap();
    Session::authenticated(user_id)
}

fn service(conn: &Connection) -> TodoService<SqliteTodoRepository<'_>> {
    TodoService::new(SqliteTodoRepository::try_new(conn).unwrap())
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn groceries_scenario_hides_done_items_only_in_overview() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Groceries").unwrap();
    assert_eq!(list.name, "Groceries");

    let milk = service.add_item(&alice, "Milk", list.id).unwrap();
    assert!(!milk.done);
    assert_eq!(milk.todo_list_id, list.id);

    let completion = service.set_item_completion(&alice, milk.id, true).unwrap();
    assert!(completion.item.done);
    assert_eq!(completion.list.list.id, list.id);
    assert_eq!(completion.list.items.len(), 1);

    let overview = service.list_todo_lists(&alice).unwrap();
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].list.name, "Groceries");
    assert!(overview[0].items.is_empty());

    let detail = service.get_list(&alice, list.id).unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].name, "Milk");
    assert!(detail.items[0].done);
}

#[test]
fn other_user_cannot_see_list() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let bob = sign_in(&conn, "user-b");
    let service = service(&conn);

    let list = service.add_list(&alice, "Groceries").unwrap();

    let err = service.get_list(&bob, list.id).unwrap_err();
    assert!(matches!(err, ProcedureError::NotFound));
    assert!(service.list_todo_lists(&bob).unwrap().is_empty());
}

#[test]
fn add_list_then_overview_contains_empty_list() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    for name in ["Work", "  Home  ", "Ünïcødé ✓"] {
        let created = service.add_list(&alice, name).unwrap();
        let overview = service.list_todo_lists(&alice).unwrap();
        let found = overview
            .iter()
            .find(|entry| entry.list.id == created.id)
            .unwrap();
        assert_eq!(found.list.name, name);
        assert!(found.items.is_empty());
    }
}

#[test]
fn padded_item_names_are_stored_as_given() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Groceries").unwrap();
    let item = service.add_item(&alice, "  Milk\t", list.id).unwrap();
    assert_eq!(item.name, "  Milk\t");

    let overview = service.list_todo_lists(&alice).unwrap();
    assert_eq!(overview[0].items[0].name, "  Milk\t");
    let detail = service.get_list(&alice, list.id).unwrap();
    assert_eq!(detail.items[0].name, "  Milk\t");
}

#[test]
fn overview_keeps_insertion_order_and_only_open_items() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let first = service.add_list(&alice, "First").unwrap();
    let second = service.add_list(&alice, "Second").unwrap();
    let open = service.add_item(&alice, "open", first.id).unwrap();
    let closed = service.add_item(&alice, "closed", first.id).unwrap();
    service.set_item_completion(&alice, closed.id, true).unwrap();

    let overview = service.list_todo_lists(&alice).unwrap();
    let ids: Vec<Uuid> = overview.iter().map(|entry| entry.list.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(overview
        .iter()
        .flat_map(|entry| entry.items.iter())
        .all(|item| !item.done));
    assert_eq!(overview[0].items.len(), 1);
    assert_eq!(overview[0].items[0].id, open.id);

    let detail = service.get_list(&alice, first.id).unwrap();
    let detail_ids: Vec<Uuid> = detail.items.iter().map(|item| item.id).collect();
    assert_eq!(detail_ids, vec![open.id, closed.id]);
}

#[test]
fn set_item_completion_is_idempotent_and_reversible() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Chores").unwrap();
    let item = service.add_item(&alice, "Dishes", list.id).unwrap();

    let first = service.set_item_completion(&alice, item.id, true).unwrap();
    let second = service.set_item_completion(&alice, item.id, true).unwrap();
    assert!(first.item.done);
    assert!(second.item.done);

    let reopened = service.set_item_completion(&alice, item.id, false).unwrap();
    assert!(!reopened.item.done);
    let overview = service.list_todo_lists(&alice).unwrap();
    assert_eq!(overview[0].items.len(), 1);
}

#[test]
fn remove_list_cascades_to_items() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Trip").unwrap();
    let passport = service.add_item(&alice, "Passport", list.id).unwrap();
    let tickets = service.add_item(&alice, "Tickets", list.id).unwrap();
    let keep = service.add_list(&alice, "Keep").unwrap();
    service.add_item(&alice, "Stays", keep.id).unwrap();

    service.remove_list(&alice, list.id).unwrap();

    assert!(matches!(
        service.get_list(&alice, list.id).unwrap_err(),
        ProcedureError::NotFound
    ));
    for item_id in [passport.id, tickets.id] {
        assert!(matches!(
            service
                .set_item_completion(&alice, item_id, true)
                .unwrap_err(),
            ProcedureError::NotFound
        ));
        assert!(matches!(
            service.remove_item(&alice, item_id).unwrap_err(),
            ProcedureError::NotFound
        ));
    }
    assert_eq!(count_rows(&conn, "todo_items"), 1);
}

#[test]
fn removing_absent_targets_is_not_found() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Once").unwrap();
    let item = service.add_item(&alice, "Only", list.id).unwrap();

    service.remove_item(&alice, item.id).unwrap();
    assert!(matches!(
        service.remove_item(&alice, item.id).unwrap_err(),
        ProcedureError::NotFound
    ));

    service.remove_list(&alice, list.id).unwrap();
    assert!(matches!(
        service.remove_list(&alice, list.id).unwrap_err(),
        ProcedureError::NotFound
    ));
}

#[test]
fn rename_list_updates_name_for_owner_only() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let bob = sign_in(&conn, "user-b");
    let service = service(&conn);

    let list = service.add_list(&alice, "Draft").unwrap();

    let renamed = service.rename_list(&alice, list.id, "  Final ").unwrap();
    assert_eq!(renamed.id, list.id);
    assert_eq!(renamed.name, "  Final ");

    let err = service.rename_list(&bob, list.id, "Hijacked").unwrap_err();
    assert!(matches!(err, ProcedureError::NotFound));
    assert_eq!(
        service.get_list(&alice, list.id).unwrap().list.name,
        "  Final "
    );
}

#[test]
fn foreign_user_cannot_touch_items_or_lists() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let bob = sign_in(&conn, "user-b");
    let service = service(&conn);

    let list = service.add_list(&alice, "Private").unwrap();
    let item = service.add_item(&alice, "Secret", list.id).unwrap();

    let attempts = [
        service.add_item(&bob, "Intruder", list.id).map(|_| ()),
        service.set_item_completion(&bob, item.id, true).map(|_| ()),
        service.remove_item(&bob, item.id),
        service.remove_list(&bob, list.id),
    ];
    for attempt in attempts {
        assert!(matches!(attempt.unwrap_err(), ProcedureError::NotFound));
    }

    let detail = service.get_list(&alice, list.id).unwrap();
    assert_eq!(detail.items.len(), 1);
    assert!(!detail.items[0].done);
}

#[test]
fn padded_user_id_is_a_distinct_owner() {
    let conn = setup();
    let plain = sign_in(&conn, "u-1");
    let padded = sign_in(&conn, " u-1");
    let service = service(&conn);

    let list = service.add_list(&plain, "Mine").unwrap();

    assert!(service.list_todo_lists(&padded).unwrap().is_empty());
    assert!(matches!(
        service.get_list(&padded, list.id).unwrap_err(),
        ProcedureError::NotFound
    ));
    assert_eq!(count_rows(&conn, "users"), 2);
}

#[test]
fn not_found_is_identical_for_missing_and_foreign_targets() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let bob = sign_in(&conn, "user-b");
    let service = service(&conn);

    let list = service.add_list(&alice, "Mine").unwrap();

    let foreign = service.get_list(&bob, list.id).unwrap_err();
    let missing = service.get_list(&bob, Uuid::new_v4()).unwrap_err();
    assert_eq!(foreign.code(), missing.code());
    assert_eq!(foreign.to_string(), missing.to_string());
}

#[test]
fn blank_item_name_is_rejected_without_creating_rows() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    let list = service.add_list(&alice, "Groceries").unwrap();

    let err = service.add_item(&alice, "", list.id).unwrap_err();
    assert!(matches!(
        err,
        ProcedureError::Validation(TodoValidationError::BlankItemName)
    ));
    let err = service.add_item(&alice, " \t ", list.id).unwrap_err();
    assert_eq!(err.code(), "validation_error");

    assert_eq!(count_rows(&conn, "todo_items"), 0);
}

#[test]
fn blank_list_names_are_rejected() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);

    assert!(matches!(
        service.add_list(&alice, "   ").unwrap_err(),
        ProcedureError::Validation(TodoValidationError::BlankListName)
    ));
    let list = service.add_list(&alice, "Keep").unwrap();
    assert!(matches!(
        service.rename_list(&alice, list.id, "").unwrap_err(),
        ProcedureError::Validation(TodoValidationError::BlankListName)
    ));
    assert_eq!(count_rows(&conn, "todo_lists"), 1);
}

#[test]
fn anonymous_session_is_rejected_before_store_access() {
    let conn = setup();
    let alice = sign_in(&conn, "user-a");
    let service = service(&conn);
    let list = service.add_list(&alice, "Groceries").unwrap();
    let item = service.add_item(&alice, "Milk", list.id).unwrap();

    let anonymous = Session::anonymous();
    let results = [
        service.list_todo_lists(&anonymous).map(|_| ()),
        service.get_list(&anonymous, list.id).map(|_| ()),
        service.add_list(&anonymous, "").map(|_| ()),
        service.rename_list(&anonymous, list.id, "x").map(|_| ()),
        service.remove_list(&anonymous, list.id),
        service.add_item(&anonymous, "Eggs", list.id).map(|_| ()),
        service
            .set_item_completion(&anonymous, item.id, true)
            .map(|_| ()),
        service.remove_item(&anonymous, item.id),
    ];
    for result in results {
        assert!(matches!(result.unwrap_err(), ProcedureError::Unauthenticated));
    }

    assert_eq!(count_rows(&conn, "todo_lists"), 1);
    assert_eq!(count_rows(&conn, "todo_items"), 1);
    assert!(!service.get_list(&alice, list.id).unwrap().items[0].done);
}

#[test]
fn add_list_for_unregistered_user_is_store_error() {
    let conn = setup();
    let service = service(&conn);
    let ghost = Session::authenticated(UserId::parse("never-signed-in").unwrap());

    let err = service.add_list(&ghost, "Orphan").unwrap_err();
    assert_eq!(err.code(), "store_error");
    assert_eq!(count_rows(&conn, "todo_lists"), 0);
}
