use chrono::{NaiveDate, NaiveDateTime};

use super::parser::{OrgParser, ParsedHeading};
use super::writer::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::core::folder::Folder;
use crate::core::note::{Id, Note};
use crate::core::task::{Priority, Task};

fn property_id(heading: &ParsedHeading, key: &str) -> Option<Id> {
    OrgParser::get_property(&heading.properties, key).and_then(|s| s.trim().parse().ok())
}

fn property_timestamp(heading: &ParsedHeading, key: &str) -> Option<NaiveDateTime> {
    OrgParser::get_property(&heading.properties, key).and_then(|s| {
        // Format: [2026-02-23 Mon 14:00]
        let s = s.trim_matches(|c| c == '[' || c == ']');
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
    })
}

pub fn heading_to_note(heading: &ParsedHeading) -> Note {
    let now = chrono::Local::now().naive_local();
    let created = property_timestamp(heading, "CREATED").unwrap_or(now);
    Note {
        id: property_id(heading, "ID"),
        // Note titles are free text, so a leading TODO is part of the title.
        title: heading.raw_title.clone(),
        content: heading.body.clone(),
        pinned: OrgParser::get_property(&heading.properties, "PINNED")
            .is_some_and(|v| v == "t"),
        folder_id: property_id(heading, "FOLDER"),
        created,
        updated: property_timestamp(heading, "UPDATED").unwrap_or(created),
    }
}

pub fn heading_to_folder(heading: &ParsedHeading) -> Folder {
    Folder {
        id: property_id(heading, "ID"),
        name: heading.raw_title.clone(),
    }
}

pub fn heading_to_task(heading: &ParsedHeading) -> Task {
    let now = chrono::Local::now().naive_local();
    let created = property_timestamp(heading, "CREATED").unwrap_or(now);
    Task {
        id: property_id(heading, "ID"),
        title: heading.title.clone(),
        description: heading.body.clone(),
        priority: heading.priority.unwrap_or(Priority::Low),
        completed: heading.done.unwrap_or(false),
        due: OrgParser::get_property(&heading.properties, "DUE")
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()),
        created,
        updated: property_timestamp(heading, "UPDATED").unwrap_or(created),
    }
}

/// Parse a per-note org file. The first top-level heading is the note.
pub fn parse_note(input: &str) -> Option<Note> {
    OrgParser::parse(input)
        .iter()
        .find(|h| h.level == 1)
        .map(heading_to_note)
}

pub fn parse_folders(input: &str) -> Vec<Folder> {
    OrgParser::parse(input)
        .iter()
        .filter(|h| h.level == 1)
        .map(heading_to_folder)
        .collect()
}

pub fn parse_tasks(input: &str) -> Vec<Task> {
    OrgParser::parse(input)
        .iter()
        .filter(|h| h.level == 1)
        .map(heading_to_task)
        .collect()
}
