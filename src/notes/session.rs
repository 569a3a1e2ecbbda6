use chrono::NaiveDateTime;

use super::decision::{SaveAction, decide};
use super::pipeline::{Committed, NotePipeline};
use crate::core::date::format_depending_on_day;
use crate::core::note::word_count;
use crate::core::{Folder, Id, Note};
use crate::store::{NoteStore, StoreError};
use crate::widget::WidgetNotifier;

/// In-progress edit of one note.
///
/// Edits stay local until [`EditSession::save`]. Saving takes `&mut self`,
/// so one session can never run two saves at once. An `Ok` from `save` or
/// `delete` means the editor should close; an `Err` leaves every edit in
/// place and queues a one-shot message for [`EditSession::take_error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    title: String,
    content: String,
    pinned: bool,
    folder: Option<Folder>,
    original: Option<Note>,
    reading_mode: bool,
    error: Option<String>,
}

impl EditSession {
    /// A session for a note that does not exist yet.
    pub fn draft(folder: Option<Folder>) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            pinned: false,
            folder,
            original: None,
            reading_mode: false,
            error: None,
        }
    }

    /// A session editing the persisted `note`, shown in `folder`.
    pub fn editing(note: Note, folder: Option<Folder>) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            pinned: note.pinned,
            folder,
            original: Some(note),
            reading_mode: false,
            error: None,
        }
    }

    /// Load the session the editor opens with.
    ///
    /// With a `note_id` the note and its own folder are loaded; otherwise a
    /// draft is started in `folder_id`. Folder ids that no longer resolve
    /// mean "no folder".
    pub async fn open<S: NoteStore>(
        store: &S,
        note_id: Option<Id>,
        folder_id: Option<Id>,
    ) -> Result<Self, StoreError> {
        match note_id {
            Some(id) => {
                let note = store
                    .get_note(id)
                    .await?
                    .ok_or(StoreError::NotFound { entity: "note", id })?;
                let folder = lookup_folder(store, note.folder_id).await?;
                Ok(Self::editing(note, folder))
            }
            None => Ok(Self::draft(lookup_folder(store, folder_id).await?)),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn folder(&self) -> Option<&Folder> {
        self.folder.as_ref()
    }

    pub fn original(&self) -> Option<&Note> {
        self.original.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn reading_mode(&self) -> bool {
        self.reading_mode
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn select_folder(&mut self, folder: Option<Folder>) {
        self.folder = folder;
    }

    pub fn toggle_reading_mode(&mut self) {
        self.reading_mode = !self.reading_mode;
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    /// When the persisted note was last written, labelled relative to `now`.
    pub fn last_modified(&self, now: NaiveDateTime) -> Option<String> {
        self.original
            .as_ref()
            .map(|note| format_depending_on_day(note.updated, now))
    }

    /// Take the pending error message, if any. Each message is returned once.
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// The current edits as a note.
    pub fn candidate(&self) -> Note {
        Note {
            pinned: self.pinned,
            folder_id: self.folder.as_ref().and_then(|f| f.id),
            ..Note::new(self.title.clone(), self.content.clone())
        }
    }

    pub fn decision(&self) -> SaveAction {
        decide(self.candidate(), self.original.as_ref())
    }

    /// Save the current edits. After a write the session tracks the written
    /// note, so saving again without further edits is a no-op.
    pub async fn save<S, N>(
        &mut self,
        pipeline: &NotePipeline<S, N>,
    ) -> Result<Committed, StoreError>
    where
        S: NoteStore + 'static,
        N: WidgetNotifier + 'static,
    {
        match pipeline.commit(self.decision()).await {
            Ok(committed) => {
                if let Committed::Inserted(note) | Committed::Updated(note) = &committed {
                    self.original = Some(note.clone());
                }
                Ok(committed)
            }
            Err(e) => Err(self.fail("save", e)),
        }
    }

    /// Flip the pin flag. A persisted note is written immediately; a draft
    /// carries the flag into its eventual insert.
    pub async fn toggle_pinned<S, N>(
        &mut self,
        pipeline: &NotePipeline<S, N>,
    ) -> Result<(), StoreError>
    where
        S: NoteStore + 'static,
        N: WidgetNotifier + 'static,
    {
        let pinned = !self.pinned;
        if let Some(original) = &self.original {
            match pipeline.set_pinned(original, pinned).await {
                Ok(note) => self.original = Some(note),
                Err(e) => return Err(self.fail("pin", e)),
            }
        }
        self.pinned = pinned;
        Ok(())
    }

    /// Delete the persisted note. Deleting a draft has nothing to remove.
    pub async fn delete<S, N>(&mut self, pipeline: &NotePipeline<S, N>) -> Result<(), StoreError>
    where
        S: NoteStore + 'static,
        N: WidgetNotifier + 'static,
    {
        let Some(original) = self.original.clone() else {
            return Ok(());
        };
        match pipeline.delete(original).await {
            Ok(()) => {
                self.original = None;
                Ok(())
            }
            Err(e) => Err(self.fail("delete", e)),
        }
    }

    fn fail(&mut self, action: &str, e: StoreError) -> StoreError {
        log::error!("Failed to {} note: {}", action, e);
        self.error = Some(format!("Could not {} note: {}", action, e));
        e
    }
}

async fn lookup_folder<S: NoteStore>(
    store: &S,
    folder_id: Option<Id>,
) -> Result<Option<Folder>, StoreError> {
    match folder_id {
        Some(id) => store.get_folder(id).await,
        None => Ok(None),
    }
}
