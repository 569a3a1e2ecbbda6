use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::note::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Org cookie, `[#A]` being the most urgent.
    pub fn as_org(&self) -> &'static str {
        match self {
            Self::High => "[#A]",
            Self::Medium => "[#B]",
            Self::Low => "[#C]",
        }
    }

    pub fn from_org(s: &str) -> Option<Self> {
        match s {
            "A" | "#A" | "[#A]" => Some(Self::High),
            "B" | "#B" | "[#B]" => Some(Self::Medium),
            "C" | "#C" | "[#C]" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "l" => Some(Self::Low),
            "medium" | "med" | "m" => Some(Self::Medium),
            "high" | "h" => Some(Self::High),
            _ => Self::from_org(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<Id>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
    pub due: Option<NaiveDate>,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            priority: Priority::Low,
            completed: false,
            due: None,
            created: now,
            updated: now,
        }
    }

    pub fn complete(&mut self) {
        self.completed = true;
    }

    /// Due today or overdue, and still open.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        !self.completed && self.due.is_some_and(|due| due <= today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_org_cookies() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_org(p.as_org()), Some(p));
        }
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn completed_tasks_are_never_due() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut task = Task::new("File taxes");
        assert!(!task.is_due(today));

        task.due = Some(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert!(task.is_due(today));

        task.complete();
        assert!(!task.is_due(today));
    }
}
