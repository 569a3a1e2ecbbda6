use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for notes, folders and tasks.
pub type Id = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `None` until the note has been inserted into a store.
    pub id: Option<Id>,
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub folder_id: Option<Id>,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            pinned: false,
            folder_id: None,
            created: now,
            updated: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Whitespace-separated word count of the content.
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_is_a_draft() {
        let note = Note::new("Groceries", "Milk, eggs");
        assert!(!note.is_persisted());
        assert!(!note.pinned);
        assert_eq!(note.folder_id, None);
        assert_eq!(note.created, note.updated);
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("Milk,  eggs\nbread"), 3);
    }
}
