use crate::core::note::Note;

/// What saving an edit session should do to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAction {
    Insert(Note),
    Update(Note),
    NoOp,
}

/// True when a save would change what the store holds for `original`.
///
/// Only title, content and folder count. The pin flag is written through
/// its own toggle and is ignored here.
pub fn note_changed(candidate: &Note, original: &Note) -> bool {
    candidate.title != original.title
        || candidate.content != original.content
        || candidate.folder_id != original.folder_id
}

/// Decide the write for `candidate` given the persisted `original`, if any.
///
/// An update keeps the original's id, pin flag and timestamps and takes
/// title, content and folder from the candidate.
pub fn decide(candidate: Note, original: Option<&Note>) -> SaveAction {
    match original {
        None => SaveAction::Insert(candidate),
        Some(original) if note_changed(&candidate, original) => SaveAction::Update(Note {
            title: candidate.title,
            content: candidate.content,
            folder_id: candidate.folder_id,
            ..original.clone()
        }),
        Some(_) => SaveAction::NoOp,
    }
}
