use std::collections::BTreeMap;

use tokio::sync::Mutex;

use super::{NoteStore, StoreError, TaskStore};
use crate::core::{Folder, Id, Note, Task};

#[derive(Default)]
struct Tables {
    notes: BTreeMap<Id, Note>,
    folders: BTreeMap<Id, Folder>,
    tasks: BTreeMap<Id, Task>,
    next_note: Id,
    next_folder: Id,
    next_task: Id,
}

/// Process-local store. Ids start at 0 and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl NoteStore for MemoryStore {
    async fn insert_note(&self, mut note: Note) -> Result<Id, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_note;
        tables.next_note += 1;
        note.id = Some(id);
        note.updated = now();
        tables.notes.insert(id, note);
        Ok(id)
    }

    async fn update_note(&self, mut note: Note) -> Result<(), StoreError> {
        let id = note.id.ok_or(StoreError::Unpersisted("note"))?;
        let mut tables = self.tables.lock().await;
        let slot = tables
            .notes
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "note", id })?;
        note.updated = now();
        *slot = note;
        Ok(())
    }

    async fn delete_note(&self, note: &Note) -> Result<(), StoreError> {
        let id = note.id.ok_or(StoreError::Unpersisted("note"))?;
        self.tables.lock().await.notes.remove(&id);
        Ok(())
    }

    async fn get_note(&self, id: Id) -> Result<Option<Note>, StoreError> {
        Ok(self.tables.lock().await.notes.get(&id).cloned())
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.tables.lock().await.notes.values().cloned().collect())
    }

    async fn insert_folder(&self, mut folder: Folder) -> Result<Id, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_folder;
        tables.next_folder += 1;
        folder.id = Some(id);
        tables.folders.insert(id, folder);
        Ok(id)
    }

    async fn update_folder(&self, folder: Folder) -> Result<(), StoreError> {
        let id = folder.id.ok_or(StoreError::Unpersisted("folder"))?;
        let mut tables = self.tables.lock().await;
        let slot = tables
            .folders
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "folder", id })?;
        *slot = folder;
        Ok(())
    }

    async fn delete_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        let id = folder.id.ok_or(StoreError::Unpersisted("folder"))?;
        self.tables.lock().await.folders.remove(&id);
        Ok(())
    }

    async fn get_folder(&self, id: Id) -> Result<Option<Folder>, StoreError> {
        Ok(self.tables.lock().await.folders.get(&id).cloned())
    }

    async fn get_all_folders(&self) -> Result<Vec<Folder>, StoreError> {
        Ok(self.tables.lock().await.folders.values().cloned().collect())
    }
}

impl TaskStore for MemoryStore {
    async fn insert_task(&self, mut task: Task) -> Result<Id, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_task;
        tables.next_task += 1;
        task.id = Some(id);
        task.updated = now();
        tables.tasks.insert(id, task);
        Ok(id)
    }

    async fn update_task(&self, mut task: Task) -> Result<(), StoreError> {
        let id = task.id.ok_or(StoreError::Unpersisted("task"))?;
        let mut tables = self.tables.lock().await;
        let slot = tables
            .tasks
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "task", id })?;
        task.updated = now();
        *slot = task;
        Ok(())
    }

    async fn delete_task(&self, task: &Task) -> Result<(), StoreError> {
        let id = task.id.ok_or(StoreError::Unpersisted("task"))?;
        self.tables.lock().await.tasks.remove(&id);
        Ok(())
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.lock().await.tasks.get(&id).cloned())
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tables.lock().await.tasks.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_allocated_in_order() {
        let store = MemoryStore::new();
        let first = store.insert_note(Note::new("a", "")).await.unwrap();
        let second = store.insert_note(Note::new("b", "")).await.unwrap();
        assert_eq!((first, second), (0, 1));

        let stored = store.get_note(second).await.unwrap().unwrap();
        assert_eq!(stored.id, Some(1));
        assert_eq!(stored.title, "b");
    }

    #[tokio::test]
    async fn update_requires_an_existing_id() {
        let store = MemoryStore::new();
        let draft = Note::new("draft", "");
        assert!(matches!(
            store.update_note(draft.clone()).await,
            Err(StoreError::Unpersisted("note"))
        ));

        let ghost = Note { id: Some(42), ..draft };
        assert!(matches!(
            store.update_note(ghost).await,
            Err(StoreError::NotFound { entity: "note", id: 42 })
        ));
    }

    #[tokio::test]
    async fn update_refreshes_the_updated_stamp() {
        let store = MemoryStore::new();
        let mut note = Note::new("a", "");
        note.updated = chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let id = store.insert_note(note.clone()).await.unwrap();
        let stored = store.get_note(id).await.unwrap().unwrap();
        assert!(stored.updated > note.updated);
        assert_eq!(stored.created, note.created);
    }

    #[tokio::test]
    async fn folders_list_in_insertion_order() {
        let store = MemoryStore::new();
        store.insert_folder(Folder::new("Work")).await.unwrap();
        let home = store.insert_folder(Folder::new("Home")).await.unwrap();
        let names: Vec<String> = store
            .get_all_folders()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["Work", "Home"]);

        let folder = store.get_folder(home).await.unwrap().unwrap();
        store.delete_folder(&folder).await.unwrap();
        assert_eq!(store.get_folder(home).await.unwrap(), None);
    }

    #[tokio::test]
    async fn tasks_round_trip() {
        let store = MemoryStore::new();
        let id = store.insert_task(Task::new("File taxes")).await.unwrap();
        let mut task = store.get_task(id).await.unwrap().unwrap();
        task.complete();
        store.update_task(task).await.unwrap();
        assert!(store.get_task(id).await.unwrap().unwrap().completed);
        assert_eq!(store.get_all_tasks().await.unwrap().len(), 1);
    }
}
