//! Todo operations over a [`Store`].
//!
//! Each todo lives under its own key, and an ordered index of every live id is
//! kept under [`INDEX_KEY`]. Operations that touch the index hold the service
//! write lock for their whole read-modify-write sequence, so concurrent
//! creates and deletes never lose index entries.

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU64, Ordering},
};

use tracing::{debug, info};

use crate::{
    clock::Clock,
    store::{Store, StoreError, StoreExt},
    todo::{NewTodo, Todo, TodoId, TodoPatch},
};

/// Well-known key holding the ordered list of live todo ids.
pub const INDEX_KEY: &str = "TODOS";

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: usize = 3;

pub struct TodoService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    // Ids are unique only for the lifetime of this service instance.
    next_id: AtomicU64,
    writes: Mutex<()>,
}

impl TodoService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            next_id: AtomicU64::new(0),
            writes: Mutex::new(()),
        }
    }

    /// Number of live todos. Zero when nothing was ever created.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.index()?.len())
    }

    /// Every todo in creation order.
    pub fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let mut todos = Vec::new();
        for id in self.index()? {
            if let Some(todo) = self.store.load::<Todo>(&id.record_key())? {
                todos.push(todo);
            }
        }
        Ok(todos)
    }

    /// Most recently updated todos first.
    ///
    /// `cursor` names a todo; when it resolves, only todos updated strictly
    /// before it are returned. An unknown cursor is ignored rather than
    /// rejected.
    pub fn page(&self, cursor: Option<&str>, limit: usize) -> Result<Vec<Todo>, StoreError> {
        let mut todos = self.list()?;
        todos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        if let Some(cursor) = cursor {
            match self.find(cursor)? {
                Some(anchor) => todos.retain(|todo| todo.updated_at < anchor.updated_at),
                None => debug!(cursor, "cursor does not resolve, returning first page"),
            }
        }

        todos.truncate(limit);
        Ok(todos)
    }

    pub fn get(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        self.find(id)
    }

    pub fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let _guard = self.lock_writes()?;

        let id = TodoId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = self.clock.now();
        let todo = Todo {
            id,
            title: new.title,
            content: new.content,
            created_at: now,
            updated_at: now,
        };

        self.store.save(&id.record_key(), &todo)?;
        let mut index = self.index()?;
        index.push(id);
        self.store.save(INDEX_KEY, &index)?;

        info!(id = %todo.id, title = %todo.title, "todo created");
        Ok(todo)
    }

    /// Returns `None` when no todo has this id; the index is never touched.
    pub fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>, StoreError> {
        let _guard = self.lock_writes()?;

        let Some(current) = self.find(id)? else {
            debug!(id, "update skipped, todo not found");
            return Ok(None);
        };

        let updated = current.patched(patch, self.clock.now());
        self.store.save(&updated.id.record_key(), &updated)?;

        info!(id = %updated.id, "todo updated");
        Ok(Some(updated))
    }

    /// Removes the todo from the index and the store, echoing `id` back.
    ///
    /// Deleting an unknown id, or deleting before anything was created, is a
    /// no-op.
    pub fn delete(&self, id: &str) -> Result<String, StoreError> {
        let _guard = self.lock_writes()?;

        let Some(target) = canonical_id(id) else {
            debug!(id, "delete skipped, id is not a todo id");
            return Ok(id.to_string());
        };

        if let Some(mut index) = self.store.load::<Vec<TodoId>>(INDEX_KEY)? {
            index.retain(|existing| *existing != target);
            self.store.save(INDEX_KEY, &index)?;
        }
        self.store.clear(&target.record_key())?;

        info!(id = %target, "todo deleted");
        Ok(id.to_string())
    }

    fn index(&self) -> Result<Vec<TodoId>, StoreError> {
        Ok(self.store.load(INDEX_KEY)?.unwrap_or_default())
    }

    fn find(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        match canonical_id(id) {
            Some(id) => self.store.load(&id.record_key()),
            None => Ok(None),
        }
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.writes.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Resolves `id` only when it is spelled exactly as the todo's key, so
/// `"07"`, `"+7"` or `" 7"` never match todo 7.
fn canonical_id(id: &str) -> Option<TodoId> {
    let parsed = id.parse::<TodoId>().ok()?;
    (parsed.record_key() == id).then_some(parsed)
}
