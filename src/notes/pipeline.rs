use std::future::Future;
use std::sync::Arc;

use super::decision::SaveAction;
use crate::core::{Folder, Note};
use crate::store::{NoteStore, StoreError};
use crate::widget::{self, Widget, WidgetNotifier};

/// A write the store confirmed, or a save that had nothing to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Committed {
    /// The inserted note, carrying its new id.
    Inserted(Note),
    Updated(Note),
    Unchanged,
}

/// Runs note writes against a store and refreshes the notes widget once
/// each write has completed.
///
/// Writes run on a spawned task: if the caller stops waiting (its screen
/// closed), the write and its widget refresh still finish.
pub struct NotePipeline<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> Clone for NotePipeline<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S, N> NotePipeline<S, N>
where
    S: NoteStore + 'static,
    N: WidgetNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Carry out a save decision. `NoOp` touches neither store nor widget.
    pub async fn commit(&self, action: SaveAction) -> Result<Committed, StoreError> {
        match action {
            SaveAction::NoOp => {
                log::debug!("Note unchanged, skipping write");
                Ok(Committed::Unchanged)
            }
            SaveAction::Insert(note) => {
                let task = insert_then_refresh(self.store.clone(), self.notifier.clone(), note);
                detached(task).await.map(Committed::Inserted)
            }
            SaveAction::Update(note) => {
                let task = update_then_refresh(self.store.clone(), self.notifier.clone(), note);
                detached(task).await.map(Committed::Updated)
            }
        }
    }

    /// Write only the pin flag of a persisted note.
    pub async fn set_pinned(&self, note: &Note, pinned: bool) -> Result<Note, StoreError> {
        let note = Note {
            pinned,
            ..note.clone()
        };
        detached(update_then_refresh(
            self.store.clone(),
            self.notifier.clone(),
            note,
        ))
        .await
    }

    pub async fn delete(&self, note: Note) -> Result<(), StoreError> {
        detached(delete_then_refresh(
            self.store.clone(),
            self.notifier.clone(),
            note,
        ))
        .await
    }

    /// All folders, in store order.
    pub async fn folders(&self) -> Result<Vec<Folder>, StoreError> {
        self.store.get_all_folders().await
    }
}

/// Run `task` to completion on the runtime regardless of whether the
/// returned future is polled to the end.
async fn detached<T, F>(task: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|e| StoreError::Aborted(e.to_string()))?
}

// The refresh below each write is only reached once the store confirmed it.

async fn insert_then_refresh<S: NoteStore, N: WidgetNotifier>(
    store: Arc<S>,
    notifier: Arc<N>,
    mut note: Note,
) -> Result<Note, StoreError> {
    let id = store.insert_note(note.clone()).await?;
    log::info!("Inserted note {}", id);
    note.id = Some(id);
    widget::refresh(&*notifier, Widget::Notes).await;
    Ok(note)
}

async fn update_then_refresh<S: NoteStore, N: WidgetNotifier>(
    store: Arc<S>,
    notifier: Arc<N>,
    note: Note,
) -> Result<Note, StoreError> {
    store.update_note(note.clone()).await?;
    log::info!("Updated note {:?}", note.id);
    widget::refresh(&*notifier, Widget::Notes).await;
    Ok(note)
}

async fn delete_then_refresh<S: NoteStore, N: WidgetNotifier>(
    store: Arc<S>,
    notifier: Arc<N>,
    note: Note,
) -> Result<(), StoreError> {
    store.delete_note(&note).await?;
    log::info!("Deleted note {:?}", note.id);
    widget::refresh(&*notifier, Widget::Notes).await;
    Ok(())
}
