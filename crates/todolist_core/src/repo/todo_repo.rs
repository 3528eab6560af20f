//! Todo list/item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over `todo_lists` and `todo_items`.
//! - Run the ownership check and the statement it guards in one transaction.
//!
//! # Invariants
//! - Every list/item-scoped call passes through `ensure_owned_by` first.
//! - Deleting a list removes its items in the same statement (FK cascade).
//! - Read paths reject invalid persisted state instead of masking it.
//! - Lists and items are returned in insertion order.

use crate::db::DbError;
use crate::model::todo::{
    validate_list_name, TodoItem, TodoItemId, TodoList, TodoListId, TodoListWithItems,
    TodoValidationError,
};
use crate::model::user::UserId;
use crate::repo::ownership::{ensure_owned_by, OwnedResource};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    id,
    name,
    user_id
FROM todo_lists";

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    done,
    todo_list_id
FROM todo_items";

const REQUIRED_TABLES: [&str; 3] = ["users", "todo_lists", "todo_items"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    /// Missing, or owned by another user.
    NotFound(OwnedResource),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(resource) => write!(f, "{resource} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Authoritative state after a completion toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCompletion {
    /// The item as stored after the update.
    pub item: TodoItem,
    /// Its parent list with every item, read in the same transaction.
    pub list: TodoListWithItems,
}

/// Repository interface for owner-scoped todo operations.
pub trait TodoRepository {
    /// Lists `owner`'s lists, each carrying only items with `done = false`.
    fn list_lists_with_open_items(&self, owner: &UserId) -> RepoResult<Vec<TodoListWithItems>>;
    /// Gets one owned list with all of its items.
    fn get_list_with_items(
        &self,
        owner: &UserId,
        list_id: TodoListId,
    ) -> RepoResult<TodoListWithItems>;
    /// Inserts a list for `list.user_id`.
    fn create_list(&self, list: &TodoList) -> RepoResult<()>;
    /// Renames an owned list and returns the stored row.
    fn rename_list(&self, owner: &UserId, list_id: TodoListId, name: &str)
        -> RepoResult<TodoList>;
    /// Deletes an owned list together with its items.
    fn delete_list(&self, owner: &UserId, list_id: TodoListId) -> RepoResult<()>;
    /// Inserts an item under a list owned by `owner`.
    fn create_item(&self, owner: &UserId, item: &TodoItem) -> RepoResult<()>;
    /// Sets the done flag of an owned item.
    fn set_item_done(
        &self,
        owner: &UserId,
        item_id: TodoItemId,
        done: bool,
    ) -> RepoResult<ItemCompletion>;
    /// Deletes an owned item.
    fn delete_item(&self, owner: &UserId, item_id: TodoItemId) -> RepoResult<()>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails with `MissingRequiredTable` when the schema has not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    /// Runs `op` in a write transaction after the ownership check passes.
    ///
    /// Any early return drops the transaction, which rolls it back.
    fn with_owned<T>(
        &self,
        owner: &UserId,
        resource: OwnedResource,
        op: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_owned_by(&tx, owner, resource)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_lists_with_open_items(&self, owner: &UserId) -> RepoResult<Vec<TodoListWithItems>> {
        let tx = self.conn.unchecked_transaction()?;
        let lists = {
            let mut stmt = tx.prepare(&format!(
                "{LIST_SELECT_SQL}
                 WHERE user_id = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            ))?;
            let mut rows = stmt.query([owner.as_str()])?;
            let mut lists = Vec::new();
            while let Some(row) = rows.next()? {
                lists.push(parse_list_row(row)?);
            }
            lists
        };

        let mut result = Vec::with_capacity(lists.len());
        for list in lists {
            let items = load_items(&tx, list.id, true)?;
            result.push(TodoListWithItems { list, items });
        }
        tx.commit()?;
        Ok(result)
    }

    fn get_list_with_items(
        &self,
        owner: &UserId,
        list_id: TodoListId,
    ) -> RepoResult<TodoListWithItems> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_owned_by(&tx, owner, OwnedResource::List(list_id))?;
        let view = load_list_with_items(&tx, list_id)?;
        tx.commit()?;
        Ok(view)
    }

    fn create_list(&self, list: &TodoList) -> RepoResult<()> {
        list.validate()?;

        self.conn.execute(
            "INSERT INTO todo_lists (id, name, user_id) VALUES (?1, ?2, ?3);",
            params![list.id.to_string(), list.name.as_str(), list.user_id.as_str()],
        )?;
        Ok(())
    }

    fn rename_list(
        &self,
        owner: &UserId,
        list_id: TodoListId,
        name: &str,
    ) -> RepoResult<TodoList> {
        validate_list_name(name)?;

        let resource = OwnedResource::List(list_id);
        self.with_owned(owner, resource, |tx| {
            let changed = tx.execute(
                "UPDATE todo_lists
                 SET
                    name = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND user_id = ?3;",
                params![list_id.to_string(), name, owner.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(resource));
            }
            load_list(tx, list_id)
        })
    }

    fn delete_list(&self, owner: &UserId, list_id: TodoListId) -> RepoResult<()> {
        let resource = OwnedResource::List(list_id);
        self.with_owned(owner, resource, |tx| {
            let changed = tx.execute(
                "DELETE FROM todo_lists WHERE id = ?1 AND user_id = ?2;",
                params![list_id.to_string(), owner.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(resource));
            }
            Ok(())
        })
    }

    fn create_item(&self, owner: &UserId, item: &TodoItem) -> RepoResult<()> {
        item.validate()?;

        self.with_owned(owner, OwnedResource::List(item.todo_list_id), |tx| {
            tx.execute(
                "INSERT INTO todo_items (id, name, done, todo_list_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    item.id.to_string(),
                    item.name.as_str(),
                    bool_to_int(item.done),
                    item.todo_list_id.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    fn set_item_done(
        &self,
        owner: &UserId,
        item_id: TodoItemId,
        done: bool,
    ) -> RepoResult<ItemCompletion> {
        let resource = OwnedResource::Item(item_id);
        self.with_owned(owner, resource, |tx| {
            let changed = tx.execute(
                "UPDATE todo_items
                 SET
                    done = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![item_id.to_string(), bool_to_int(done)],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(resource));
            }

            let item = load_item(tx, item_id)?;
            let list = load_list_with_items(tx, item.todo_list_id)?;
            Ok(ItemCompletion { item, list })
        })
    }

    fn delete_item(&self, owner: &UserId, item_id: TodoItemId) -> RepoResult<()> {
        let resource = OwnedResource::Item(item_id);
        self.with_owned(owner, resource, |tx| {
            let changed = tx.execute(
                "DELETE FROM todo_items WHERE id = ?1;",
                [item_id.to_string()],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(resource));
            }
            Ok(())
        })
    }
}

fn load_list(conn: &Connection, list_id: TodoListId) -> RepoResult<TodoList> {
    let mut stmt = conn.prepare(&format!("{LIST_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([list_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_list_row(row);
    }
    Err(RepoError::NotFound(OwnedResource::List(list_id)))
}

fn load_list_with_items(conn: &Connection, list_id: TodoListId) -> RepoResult<TodoListWithItems> {
    let list = load_list(conn, list_id)?;
    let items = load_items(conn, list_id, false)?;
    Ok(TodoListWithItems { list, items })
}

fn load_item(conn: &Connection, item_id: TodoItemId) -> RepoResult<TodoItem> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([item_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_item_row(row);
    }
    Err(RepoError::NotFound(OwnedResource::Item(item_id)))
}

fn load_items(conn: &Connection, list_id: TodoListId, open_only: bool) -> RepoResult<Vec<TodoItem>> {
    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL}
         WHERE todo_list_id = ?1
           AND (?2 = 0 OR done = 0)
         ORDER BY created_at ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query(params![list_id.to_string(), bool_to_int(open_only)])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }
    Ok(items)
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<TodoList> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let user_id = UserId::parse(user_text)
        .map_err(|_| RepoError::InvalidData("blank user id in todo_lists.user_id".to_string()))?;

    let list = TodoList {
        id: parse_uuid(&id_text, "todo_lists.id")?,
        name: row.get("name")?,
        user_id,
    };
    list.validate()?;
    Ok(list)
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<TodoItem> {
    let id_text: String = row.get("id")?;
    let list_text: String = row.get("todo_list_id")?;
    let done = match row.get::<_, i64>("done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid done value `{other}` in todo_items.done"
            )));
        }
    };

    let item = TodoItem {
        id: parse_uuid(&id_text, "todo_items.id")?,
        name: row.get("name")?,
        done,
        todo_list_id: parse_uuid(&list_text, "todo_items.todo_list_id")?,
    };
    item.validate()?;
    Ok(item)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
