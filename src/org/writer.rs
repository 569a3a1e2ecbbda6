use chrono::NaiveDateTime;

use super::parser::BODY_INDENT;
use crate::core::folder::Folder;
use crate::core::note::Note;
use crate::core::task::Task;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %a %H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Writes notes, folders and tasks to org-mode format.
pub struct OrgWriter;

impl OrgWriter {
    /// Write a single note as a standalone org file (one file per note).
    pub fn write_note_file(note: &Note) -> String {
        let mut out = String::new();
        out.push_str(&format!("#+TITLE: {}\n\n", single_line(&note.title)));
        out.push_str(&Self::write_note(note));
        out
    }

    /// Write a single note as an org heading.
    pub fn write_note(note: &Note) -> String {
        let mut out = String::new();
        let indent = BODY_INDENT;

        out.push_str(&format!("* {}\n", single_line(&note.title)));

        out.push_str(&format!("{indent}:PROPERTIES:\n"));
        if let Some(id) = note.id {
            out.push_str(&format!("{indent}:ID: {}\n", id));
        }
        push_timestamps(&mut out, note.created, note.updated);
        if note.pinned {
            out.push_str(&format!("{indent}:PINNED: t\n"));
        }
        if let Some(folder_id) = note.folder_id {
            out.push_str(&format!("{indent}:FOLDER: {}\n", folder_id));
        }
        out.push_str(&format!("{indent}:END:\n"));

        push_body(&mut out, &note.content);
        out
    }

    pub fn write_folders_file(folders: &[Folder]) -> String {
        let mut out = String::from("#+TITLE: Folders\n\n");
        for folder in folders {
            out.push_str(&format!("* {}\n", single_line(&folder.name)));
            if let Some(id) = folder.id {
                out.push_str(&format!("{BODY_INDENT}:PROPERTIES:\n"));
                out.push_str(&format!("{BODY_INDENT}:ID: {}\n", id));
                out.push_str(&format!("{BODY_INDENT}:END:\n"));
            }
        }
        out
    }

    pub fn write_tasks_file(tasks: &[Task]) -> String {
        let mut out = String::from("#+TITLE: Tasks\n#+TODO: TODO | DONE\n\n");
        for task in tasks {
            out.push_str(&Self::write_task(task));
        }
        out
    }

    /// Write a task as `* TODO [#P] Title` with its properties and description.
    pub fn write_task(task: &Task) -> String {
        let mut out = String::new();
        let indent = BODY_INDENT;

        out.push_str("* ");
        out.push_str(if task.completed { "DONE" } else { "TODO" });
        out.push(' ');
        out.push_str(task.priority.as_org());
        out.push(' ');
        out.push_str(&single_line(&task.title));
        out.push('\n');

        out.push_str(&format!("{indent}:PROPERTIES:\n"));
        if let Some(id) = task.id {
            out.push_str(&format!("{indent}:ID: {}\n", id));
        }
        push_timestamps(&mut out, task.created, task.updated);
        if let Some(due) = task.due {
            out.push_str(&format!("{indent}:DUE: {}\n", due.format(DATE_FORMAT)));
        }
        out.push_str(&format!("{indent}:END:\n"));

        push_body(&mut out, &task.description);
        out
    }
}

fn push_timestamps(out: &mut String, created: NaiveDateTime, updated: NaiveDateTime) {
    out.push_str(&format!(
        "{BODY_INDENT}:CREATED: [{}]\n",
        created.format(TIMESTAMP_FORMAT)
    ));
    out.push_str(&format!(
        "{BODY_INDENT}:UPDATED: [{}]\n",
        updated.format(TIMESTAMP_FORMAT)
    ));
}

/// Indent every body line. Splitting on `\n` rather than `lines()` keeps a
/// trailing newline in the content as a final empty line.
fn push_body(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    for line in text.split('\n') {
        out.push_str(BODY_INDENT);
        out.push_str(line);
        out.push('\n');
    }
}

/// Headlines hold one line; embedded newlines become spaces.
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}
