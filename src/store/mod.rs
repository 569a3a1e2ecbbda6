//! Durable keyed storage for notes, folders and tasks.
//!
//! Every call is atomic for the id it touches. A call that returns `Ok` has
//! completed its write; callers rely on that before notifying widgets.

pub mod memory;
pub mod org;

use std::future::Future;
use std::path::PathBuf;

use crate::core::{Folder, Id, Note, Task};

pub use memory::MemoryStore;
pub use org::OrgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("{0} has no id; it was never inserted")]
    Unpersisted(&'static str),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write task aborted: {0}")]
    Aborted(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub trait NoteStore: Send + Sync {
    /// Insert a note and return its new id. Any id on `note` is ignored.
    fn insert_note(&self, note: Note) -> impl Future<Output = Result<Id, StoreError>> + Send;

    /// Overwrite the persisted note with the same id.
    fn update_note(&self, note: Note) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_note(&self, note: &Note) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_note(&self, id: Id) -> impl Future<Output = Result<Option<Note>, StoreError>> + Send;

    fn get_all_notes(&self) -> impl Future<Output = Result<Vec<Note>, StoreError>> + Send;

    fn insert_folder(&self, folder: Folder)
    -> impl Future<Output = Result<Id, StoreError>> + Send;

    fn update_folder(&self, folder: Folder)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_folder(&self, folder: &Folder)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_folder(&self, id: Id) -> impl Future<Output = Result<Option<Folder>, StoreError>> + Send;

    /// All folders in store order.
    fn get_all_folders(&self) -> impl Future<Output = Result<Vec<Folder>, StoreError>> + Send;
}

pub trait TaskStore: Send + Sync {
    fn insert_task(&self, task: Task) -> impl Future<Output = Result<Id, StoreError>> + Send;

    fn update_task(&self, task: Task) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_task(&self, task: &Task) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_task(&self, id: Id) -> impl Future<Output = Result<Option<Task>, StoreError>> + Send;

    fn get_all_tasks(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;
}
