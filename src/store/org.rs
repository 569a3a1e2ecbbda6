use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{NoteStore, StoreError, TaskStore};
use crate::config::QuillConfig;
use crate::core::{Folder, Id, Note, Task};
use crate::org::convert;
use crate::org::writer::OrgWriter;

/// Next id to hand out per entity. Persisted so deleting the newest record
/// never frees its id for reuse.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
struct NextIds {
    note: Id,
    folder: Id,
    task: Id,
}

#[derive(Clone, Copy)]
enum Entity {
    Note,
    Folder,
    Task,
}

impl NextIds {
    fn slot(&mut self, entity: Entity) -> &mut Id {
        match entity {
            Entity::Note => &mut self.note,
            Entity::Folder => &mut self.folder,
            Entity::Task => &mut self.task,
        }
    }

    /// Never hand out an id at or below one already on disk.
    fn raise_to_cover(&mut self, notes: &BTreeMap<Id, Note>, folders: &[Folder], tasks: &[Task]) {
        self.note = self.note.max(next_id(notes.keys().copied()));
        self.folder = self.folder.max(next_id(folders.iter().filter_map(|f| f.id)));
        self.task = self.task.max(next_id(tasks.iter().filter_map(|t| t.id)));
    }
}

struct Index {
    notes: BTreeMap<Id, Note>,
    folders: Vec<Folder>,
    tasks: Vec<Task>,
    next: NextIds,
}

fn next_id(ids: impl Iterator<Item = Id>) -> Id {
    ids.max().map_or(0, |id| id + 1)
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Org-mode backed store: one `<id>.org` file per note, plus a single
/// `folders.org` and `tasks.org`. Id counters live in `ids.json`.
///
/// The files are read once at open and cached; every write hits disk before
/// the cache changes, so a failed write leaves the store as it was.
pub struct OrgStore {
    notes_dir: PathBuf,
    folders_path: PathBuf,
    tasks_path: PathBuf,
    ids_path: PathBuf,
    index: Mutex<Index>,
}

impl OrgStore {
    pub async fn open(config: &QuillConfig) -> Result<Self, StoreError> {
        let notes_dir = config.notes_dir();
        fs::create_dir_all(&notes_dir)
            .await
            .map_err(|e| StoreError::io(&notes_dir, e))?;

        let notes = load_notes_dir(&notes_dir).await?;
        let folders = convert::parse_folders(&read_or_empty(&config.folders_path()).await?);
        let tasks = convert::parse_tasks(&read_or_empty(&config.tasks_path()).await?);
        let mut next = load_next_ids(&config.ids_path()).await?;
        next.raise_to_cover(&notes, &folders, &tasks);

        log::info!(
            "Opened org store at {}: {} notes, {} folders, {} tasks",
            config.data_directory.display(),
            notes.len(),
            folders.len(),
            tasks.len()
        );

        Ok(Self {
            notes_dir,
            folders_path: config.folders_path(),
            tasks_path: config.tasks_path(),
            ids_path: config.ids_path(),
            index: Mutex::new(Index {
                notes,
                folders,
                tasks,
                next,
            }),
        })
    }

    fn note_path(&self, id: Id) -> PathBuf {
        self.notes_dir.join(format!("{}.org", id))
    }

    async fn write_note_file(&self, note: &Note, id: Id) -> Result<(), StoreError> {
        write_atomic(&self.note_path(id), &OrgWriter::write_note_file(note)).await
    }

    /// Reserve the next id for `entity`. The bumped counter reaches disk
    /// before the id is returned, so a crash can skip ids but never repeat one.
    async fn allocate(&self, index: &mut Index, entity: Entity) -> Result<Id, StoreError> {
        let mut next = index.next;
        let slot = next.slot(entity);
        let id = *slot;
        *slot += 1;
        let json = serde_json::to_string_pretty(&next)
            .map_err(|e| StoreError::io(&self.ids_path, e.into()))?;
        write_atomic(&self.ids_path, &json).await?;
        index.next = next;
        Ok(id)
    }
}

async fn load_next_ids(path: &Path) -> Result<NextIds, StoreError> {
    let content = read_or_empty(path).await?;
    if content.trim().is_empty() {
        return Ok(NextIds::default());
    }
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("Rebuilding id counters from data, {} is malformed: {}", path.display(), e);
        NextIds::default()
    }))
}

async fn read_or_empty(path: &Path) -> Result<String, StoreError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn load_notes_dir(dir: &Path) -> Result<BTreeMap<Id, Note>, StoreError> {
    let mut notes = BTreeMap::new();
    let mut entries = fs::read_dir(dir).await.map_err(|e| StoreError::io(dir, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(dir, e))?
    {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "org") {
            continue;
        }
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        let Some(mut note) = convert::parse_note(&content) else {
            log::warn!("Skipping note file without a heading: {}", path.display());
            continue;
        };
        // Fall back to the file name when the drawer lost its ID.
        if note.id.is_none() {
            note.id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok());
        }
        match note.id {
            Some(id) => {
                notes.insert(id, note);
            }
            None => log::warn!("Skipping note file without an id: {}", path.display()),
        }
    }
    Ok(notes)
}

/// Write to a sibling `.tmp` file, sync it, then rename over the target.
async fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = fs::File::create(&tmp)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().await.map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

async fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

impl NoteStore for OrgStore {
    async fn insert_note(&self, mut note: Note) -> Result<Id, StoreError> {
        let mut index = self.index.lock().await;
        let id = self.allocate(&mut index, Entity::Note).await?;
        note.id = Some(id);
        note.updated = now();
        self.write_note_file(&note, id).await?;
        index.notes.insert(id, note);
        log::debug!("Inserted note {}", id);
        Ok(id)
    }

    async fn update_note(&self, mut note: Note) -> Result<(), StoreError> {
        let id = note.id.ok_or(StoreError::Unpersisted("note"))?;
        let mut index = self.index.lock().await;
        if !index.notes.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "note", id });
        }
        note.updated = now();
        self.write_note_file(&note, id).await?;
        index.notes.insert(id, note);
        log::debug!("Updated note {}", id);
        Ok(())
    }

    async fn delete_note(&self, note: &Note) -> Result<(), StoreError> {
        let id = note.id.ok_or(StoreError::Unpersisted("note"))?;
        let mut index = self.index.lock().await;
        remove_if_present(&self.note_path(id)).await?;
        index.notes.remove(&id);
        log::debug!("Deleted note {}", id);
        Ok(())
    }

    async fn get_note(&self, id: Id) -> Result<Option<Note>, StoreError> {
        Ok(self.index.lock().await.notes.get(&id).cloned())
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.index.lock().await.notes.values().cloned().collect())
    }

    async fn insert_folder(&self, mut folder: Folder) -> Result<Id, StoreError> {
        let mut index = self.index.lock().await;
        let id = self.allocate(&mut index, Entity::Folder).await?;
        folder.id = Some(id);
        let mut folders = index.folders.clone();
        folders.push(folder);
        write_atomic(&self.folders_path, &OrgWriter::write_folders_file(&folders)).await?;
        index.folders = folders;
        Ok(id)
    }

    async fn update_folder(&self, folder: Folder) -> Result<(), StoreError> {
        let id = folder.id.ok_or(StoreError::Unpersisted("folder"))?;
        let mut index = self.index.lock().await;
        let mut folders = index.folders.clone();
        let slot = folders
            .iter_mut()
            .find(|f| f.id == Some(id))
            .ok_or(StoreError::NotFound { entity: "folder", id })?;
        *slot = folder;
        write_atomic(&self.folders_path, &OrgWriter::write_folders_file(&folders)).await?;
        index.folders = folders;
        Ok(())
    }

    async fn delete_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        let id = folder.id.ok_or(StoreError::Unpersisted("folder"))?;
        let mut index = self.index.lock().await;
        let folders: Vec<Folder> = index
            .folders
            .iter()
            .filter(|f| f.id != Some(id))
            .cloned()
            .collect();
        write_atomic(&self.folders_path, &OrgWriter::write_folders_file(&folders)).await?;
        index.folders = folders;
        Ok(())
    }

    async fn get_folder(&self, id: Id) -> Result<Option<Folder>, StoreError> {
        let index = self.index.lock().await;
        Ok(index.folders.iter().find(|f| f.id == Some(id)).cloned())
    }

    async fn get_all_folders(&self) -> Result<Vec<Folder>, StoreError> {
        Ok(self.index.lock().await.folders.clone())
    }
}

impl TaskStore for OrgStore {
    async fn insert_task(&self, mut task: Task) -> Result<Id, StoreError> {
        let mut index = self.index.lock().await;
        let id = self.allocate(&mut index, Entity::Task).await?;
        task.id = Some(id);
        task.updated = now();
        let mut tasks = index.tasks.clone();
        tasks.push(task);
        write_atomic(&self.tasks_path, &OrgWriter::write_tasks_file(&tasks)).await?;
        index.tasks = tasks;
        Ok(id)
    }

    async fn update_task(&self, mut task: Task) -> Result<(), StoreError> {
        let id = task.id.ok_or(StoreError::Unpersisted("task"))?;
        let mut index = self.index.lock().await;
        let mut tasks = index.tasks.clone();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or(StoreError::NotFound { entity: "task", id })?;
        task.updated = now();
        *slot = task;
        write_atomic(&self.tasks_path, &OrgWriter::write_tasks_file(&tasks)).await?;
        index.tasks = tasks;
        Ok(())
    }

    async fn delete_task(&self, task: &Task) -> Result<(), StoreError> {
        let id = task.id.ok_or(StoreError::Unpersisted("task"))?;
        let mut index = self.index.lock().await;
        let tasks: Vec<Task> = index
            .tasks
            .iter()
            .filter(|t| t.id != Some(id))
            .cloned()
            .collect();
        write_atomic(&self.tasks_path, &OrgWriter::write_tasks_file(&tasks)).await?;
        index.tasks = tasks;
        Ok(())
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        let index = self.index.lock().await;
        Ok(index.tasks.iter().find(|t| t.id == Some(id)).cloned())
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.index.lock().await.tasks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> QuillConfig {
        QuillConfig {
            data_directory: dir.to_path_buf(),
            ..QuillConfig::default()
        }
    }

    #[tokio::test]
    async fn notes_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let store = OrgStore::open(&config).await.unwrap();
        let mut note = Note::new("Groceries", "Milk, eggs\n* bread");
        note.folder_id = Some(3);
        let id = store.insert_note(note).await.unwrap();
        assert_eq!(id, 0);
        assert!(dir.path().join("notes/0.org").exists());

        let reopened = OrgStore::open(&config).await.unwrap();
        let loaded = reopened.get_note(id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Groceries");
        assert_eq!(loaded.content, "Milk, eggs\n* bread");
        assert_eq!(loaded.folder_id, Some(3));
        assert_eq!(reopened.insert_note(Note::new("next", "")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_rewrites_the_note_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrgStore::open(&config_in(dir.path())).await.unwrap();
        let id = store.insert_note(Note::new("Old", "Body")).await.unwrap();

        let mut note = store.get_note(id).await.unwrap().unwrap();
        note.title = "New".to_string();
        store.update_note(note).await.unwrap();

        let file = std::fs::read_to_string(dir.path().join(format!("notes/{}.org", id))).unwrap();
        assert!(file.contains("* New\n"));
        assert!(!dir.path().join(format!("notes/{}.org.tmp", id)).exists());
    }

    #[tokio::test]
    async fn update_of_unknown_note_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrgStore::open(&config_in(dir.path())).await.unwrap();
        let ghost = Note {
            id: Some(9),
            ..Note::new("ghost", "")
        };
        assert!(matches!(
            store.update_note(ghost).await,
            Err(StoreError::NotFound { entity: "note", id: 9 })
        ));
        assert!(!dir.path().join("notes/9.org").exists());
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrgStore::open(&config_in(dir.path())).await.unwrap();
        let id = store.insert_note(Note::new("bye", "")).await.unwrap();
        let note = store.get_note(id).await.unwrap().unwrap();

        store.delete_note(&note).await.unwrap();
        assert!(!dir.path().join("notes/0.org").exists());
        assert_eq!(store.get_note(id).await.unwrap(), None);
        store.delete_note(&note).await.unwrap();
    }

    #[tokio::test]
    async fn folders_and_tasks_share_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let store = OrgStore::open(&config).await.unwrap();

        store.insert_folder(Folder::new("Work")).await.unwrap();
        let home = store.insert_folder(Folder::new("Home")).await.unwrap();
        store
            .update_folder(Folder { id: Some(home), name: "House".to_string() })
            .await
            .unwrap();
        let task_id = store.insert_task(Task::new("File taxes")).await.unwrap();

        let reopened = OrgStore::open(&config).await.unwrap();
        let names: Vec<String> = reopened
            .get_all_folders()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["Work", "House"]);
        let task = reopened.get_task(task_id).await.unwrap().unwrap();
        assert_eq!(task.title, "File taxes");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn deleted_ids_are_never_handed_out_again() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let store = OrgStore::open(&config).await.unwrap();

        let first = store.insert_note(Note::new("A", "")).await.unwrap();
        let stale = store.get_note(first).await.unwrap().unwrap();
        store.delete_note(&stale).await.unwrap();

        let second = store.insert_note(Note::new("B", "precious")).await.unwrap();
        assert_ne!(second, first);
        let edit = Note {
            title: "stale edit".to_string(),
            content: String::new(),
            ..stale.clone()
        };
        assert!(matches!(
            store.update_note(edit).await,
            Err(StoreError::NotFound { entity: "note", id }) if id == first
        ));
        assert_eq!(store.get_note(second).await.unwrap().unwrap().content, "precious");

        // The counter survives a restart even once the newest note is gone.
        let newest = store.get_note(second).await.unwrap().unwrap();
        store.delete_note(&newest).await.unwrap();
        let reopened = OrgStore::open(&config).await.unwrap();
        assert_eq!(reopened.insert_note(Note::new("C", "")).await.unwrap(), second + 1);
        assert!(!dir.path().join("ids.json.tmp").exists());
    }

    #[tokio::test]
    async fn folder_and_task_ids_are_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrgStore::open(&config_in(dir.path())).await.unwrap();

        let work = store.insert_folder(Folder::new("Work")).await.unwrap();
        let folder = store.get_folder(work).await.unwrap().unwrap();
        store.delete_folder(&folder).await.unwrap();
        assert_eq!(store.insert_folder(Folder::new("Home")).await.unwrap(), work + 1);

        let chore = store.insert_task(Task::new("Chore")).await.unwrap();
        let task = store.get_task(chore).await.unwrap().unwrap();
        store.delete_task(&task).await.unwrap();
        assert_eq!(store.insert_task(Task::new("Errand")).await.unwrap(), chore + 1);
    }

    #[tokio::test]
    async fn counters_cover_files_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(config.notes_dir()).unwrap();
        std::fs::write(config.notes_dir().join("5.org"), "* Imported\n").unwrap();
        std::fs::write(config.ids_path(), r#"{ "note": 2, "folder": 4 }"#).unwrap();

        let store = OrgStore::open(&config).await.unwrap();
        assert_eq!(store.insert_note(Note::new("next", "")).await.unwrap(), 6);
        assert_eq!(store.insert_folder(Folder::new("Misc")).await.unwrap(), 4);
        assert_eq!(store.insert_task(Task::new("first")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn id_falls_back_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(config.notes_dir()).unwrap();
        std::fs::write(config.notes_dir().join("12.org"), "* Handwritten\n  Some text\n").unwrap();
        std::fs::write(config.notes_dir().join("README.txt"), "ignored").unwrap();

        let store = OrgStore::open(&config).await.unwrap();
        let note = store.get_note(12).await.unwrap().unwrap();
        assert_eq!(note.title, "Handwritten");
        assert_eq!(note.content, "Some text");
        assert_eq!(store.get_all_notes().await.unwrap().len(), 1);
    }
}
