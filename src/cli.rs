use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use quill::core::{Folder, Id, Priority, Task};
use quill::notes::{Committed, EditSession, NotePipeline};
use quill::store::{NoteStore, StoreError, TaskStore};
use quill::tasks;
use quill::widget::WidgetNotifier;

/// Notes, folders and tasks kept in org files.
#[derive(Debug, Parser)]
#[command(name = "quill", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Work with a single note
    #[command(subcommand)]
    Note(NoteCommand),
    /// List notes, pinned first
    Notes,
    /// List folders
    Folders,
    #[command(subcommand)]
    Folder(FolderCommand),
    #[command(subcommand)]
    Task(TaskCommand),
    /// List tasks; `!` marks the ones due
    Tasks,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum NoteCommand {
    New {
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        folder: Option<Id>,
        #[arg(long)]
        pinned: bool,
    },
    Edit {
        id: Id,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Folder id, or `none` to move the note out of its folder
        #[arg(long, value_parser = parse_folder_choice)]
        folder: Option<FolderChoice>,
    },
    Show {
        id: Id,
    },
    /// Flip the pinned flag
    Pin {
        id: Id,
    },
    Delete {
        id: Id,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum FolderCommand {
    Add { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum TaskCommand {
    Add {
        title: String,
        /// low, medium or high
        #[arg(long, value_parser = parse_priority, default_value = "low")]
        priority: Priority,
        /// YYYY-MM-DD
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,
    },
    /// Mark a task done
    Done { id: Id },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderChoice {
    Unfiled,
    Folder(Id),
}

fn parse_folder_choice(value: &str) -> Result<FolderChoice, String> {
    if value == "none" {
        return Ok(FolderChoice::Unfiled);
    }
    value
        .parse()
        .map(FolderChoice::Folder)
        .map_err(|_| format!("expected a folder id or `none`, got `{}`", value))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value).ok_or_else(|| format!("expected low, medium or high, got `{}`", value))
}

fn parse_due(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("{}: `{}`", e, value))
}

async fn resolve_folder<S: NoteStore>(store: &S, id: Id) -> Result<Folder, StoreError> {
    store
        .get_folder(id)
        .await?
        .ok_or(StoreError::NotFound { entity: "folder", id })
}

pub async fn run<S, N>(command: Command, store: Arc<S>, notifier: Arc<N>) -> Result<(), Box<dyn Error>>
where
    S: NoteStore + TaskStore + 'static,
    N: WidgetNotifier + 'static,
{
    let pipeline = NotePipeline::new(Arc::clone(&store), Arc::clone(&notifier));
    let now = chrono::Local::now().naive_local();

    match command {
        Command::Note(NoteCommand::New {
            title,
            content,
            folder,
            pinned,
        }) => {
            let mut session = EditSession::open(&*store, None, folder).await?;
            if let (Some(folder_id), None) = (folder, session.folder()) {
                println!("Folder {} not found, creating note without a folder", folder_id);
            }
            session.set_title(title);
            session.set_content(content.unwrap_or_default());
            if pinned {
                session.toggle_pinned(&pipeline).await?;
            }
            if let Committed::Inserted(note) = session.save(&pipeline).await? {
                println!("Created note {}", note.id.unwrap_or_default());
            }
        }
        Command::Note(NoteCommand::Edit {
            id,
            title,
            content,
            folder,
        }) => {
            let mut session = EditSession::open(&*store, Some(id), None).await?;
            if let Some(title) = title {
                session.set_title(title);
            }
            if let Some(content) = content {
                session.set_content(content);
            }
            match folder {
                Some(FolderChoice::Folder(folder_id)) => {
                    session.select_folder(Some(resolve_folder(&*store, folder_id).await?))
                }
                Some(FolderChoice::Unfiled) => session.select_folder(None),
                None => {}
            }
            match session.save(&pipeline).await? {
                Committed::Unchanged => println!("No changes to note {}", id),
                _ => println!("Updated note {}", id),
            }
        }
        Command::Note(NoteCommand::Show { id }) => {
            let session = EditSession::open(&*store, Some(id), None).await?;
            println!("# {}", session.title());
            if let Some(folder) = session.folder() {
                println!("Folder: {}", folder.name);
            }
            if session.pinned() {
                println!("Pinned");
            }
            if let Some(modified) = session.last_modified(now) {
                println!("Modified: {}", modified);
            }
            println!("Words: {}\n", session.word_count());
            println!("{}", session.content());
        }
        Command::Note(NoteCommand::Pin { id }) => {
            let mut session = EditSession::open(&*store, Some(id), None).await?;
            session.toggle_pinned(&pipeline).await?;
            println!(
                "Note {} {}",
                id,
                if session.pinned() { "pinned" } else { "unpinned" }
            );
        }
        Command::Note(NoteCommand::Delete { id }) => {
            let mut session = EditSession::open(&*store, Some(id), None).await?;
            session.delete(&pipeline).await?;
            println!("Deleted note {}", id);
        }
        Command::Notes => {
            let mut notes = store.get_all_notes().await?;
            notes.sort_by(|a, b| b.pinned.cmp(&a.pinned).then(b.updated.cmp(&a.updated)));
            for note in notes {
                println!(
                    "{:>4} {} {}",
                    note.id.unwrap_or_default(),
                    if note.pinned { "*" } else { " " },
                    note.title
                );
            }
        }
        Command::Folders => {
            for folder in pipeline.folders().await? {
                println!("{:>4} {}", folder.id.unwrap_or_default(), folder.name);
            }
        }
        Command::Folder(FolderCommand::Add { name }) => {
            let id = store.insert_folder(Folder::new(name)).await?;
            println!("Created folder {}", id);
        }
        Command::Task(TaskCommand::Add {
            title,
            priority,
            due,
        }) => {
            let task = Task {
                priority,
                due,
                ..Task::new(title)
            };
            let id = tasks::add_task(&*store, &*notifier, task).await?;
            println!("Created task {}", id);
        }
        Command::Task(TaskCommand::Done { id }) => {
            let task = tasks::complete_task(&*store, &*notifier, id).await?;
            println!("Completed: {}", task.title);
        }
        Command::Tasks => {
            let today = now.date();
            for task in store.get_all_tasks().await? {
                let marker = if task.completed {
                    "x"
                } else if task.is_due(today) {
                    "!"
                } else {
                    " "
                };
                println!(
                    "{:>4} [{}] {} {}",
                    task.id.unwrap_or_default(),
                    marker,
                    task.priority.as_org(),
                    task.title
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(line: &str) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("quill").chain(line.split_whitespace()))
            .map(|cli| cli.command)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_note_new() {
        assert_eq!(
            parse("note new Groceries --content Milk --folder 3 --pinned").unwrap(),
            Command::Note(NoteCommand::New {
                title: "Groceries".to_string(),
                content: Some("Milk".to_string()),
                folder: Some(3),
                pinned: true,
            })
        );
    }

    #[test]
    fn pinned_flag_takes_no_value() {
        let Command::Note(NoteCommand::New { title, pinned, .. }) =
            parse("note new --pinned Groceries").unwrap()
        else {
            panic!("expected note new");
        };
        assert_eq!(title, "Groceries");
        assert!(pinned);
    }

    #[test]
    fn parse_note_edit_folder_none() {
        assert_eq!(
            parse("note edit 7 --title New --folder none").unwrap(),
            Command::Note(NoteCommand::Edit {
                id: 7,
                title: Some("New".to_string()),
                content: None,
                folder: Some(FolderChoice::Unfiled),
            })
        );
        assert_eq!(
            parse("note edit 7 --folder 2").unwrap(),
            Command::Note(NoteCommand::Edit {
                id: 7,
                title: None,
                content: None,
                folder: Some(FolderChoice::Folder(2)),
            })
        );
    }

    #[test]
    fn parse_task_add() {
        assert_eq!(
            parse("task add Taxes --priority high --due 2026-04-15").unwrap(),
            Command::Task(TaskCommand::Add {
                title: "Taxes".to_string(),
                priority: Priority::High,
                due: NaiveDate::from_ymd_opt(2026, 4, 15),
            })
        );
        let Command::Task(TaskCommand::Add { priority, due, .. }) = parse("task add Chores").unwrap()
        else {
            panic!("expected task add");
        };
        assert_eq!(priority, Priority::Low);
        assert_eq!(due, None);
    }

    #[test]
    fn stray_words_and_misspelled_flags_are_rejected() {
        assert_eq!(
            parse("note new Buy milk").unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert_eq!(
            parse("note new Buy --contnet eggs").unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert!(parse("note new Buy milk --contnet eggs").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            parse("note show seven").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse("note edit 7 --folder elsewhere").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse("task add Taxes --priority urgent").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse("task add Taxes --due 15/04/2026").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert!(parse("note edit 7 --title").is_err());
        assert!(parse("").is_err());
        assert!(parse("archive everything").is_err());
    }

    #[tokio::test]
    async fn run_creates_and_edits_notes() {
        let store = Arc::new(quill::store::MemoryStore::new());
        let notifier = Arc::new(quill::widget::ChannelNotifier::new(4));

        for line in [
            "folder add Work",
            "note new Groceries --folder 0",
            "note edit 0 --content Milk --folder none",
        ] {
            run(parse(line).unwrap(), store.clone(), notifier.clone())
                .await
                .unwrap();
        }

        let note = store.get_note(0).await.unwrap().unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "Milk");
        assert_eq!(note.folder_id, None);
    }
}
