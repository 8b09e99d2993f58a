use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{DateRange, iso_date_serde};
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TaskId {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|err| CalendarError::validation(format!("invalid task id {s}: {err}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ToDo,
    InProgress,
    Review,
    Completed,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ToDo,
        Category::InProgress,
        Category::Review,
        Category::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::ToDo => "To Do",
            Category::InProgress => "In Progress",
            Category::Review => "Review",
            Category::Completed => "Completed",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::ToDo => "to-do",
            Category::InProgress => "in-progress",
            Category::Review => "review",
            Category::Completed => "completed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CalendarError::validation(format!("unknown category: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub name: String,

    #[serde(with = "iso_date_serde")]
    pub start: NaiveDate,

    #[serde(with = "iso_date_serde")]
    pub end: NaiveDate,

    pub category: Category,
}

impl Task {
    /// Caller guarantees a trimmed, non-empty name and an ordered range.
    pub(crate) fn new(name: String, category: Category, range: DateRange) -> Self {
        Self {
            id: TaskId::new(),
            name,
            start: range.start,
            end: range.end,
            category,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn duration_days(&self) -> i64 {
        self.range().duration_days()
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.range().contains(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_labels_and_keys() {
        assert_eq!("To Do".parse::<Category>().expect("label"), Category::ToDo);
        assert_eq!("in-progress".parse::<Category>().expect("key"), Category::InProgress);
        assert_eq!("REVIEW".parse::<Category>().expect("case"), Category::Review);
        assert!("Blocked".parse::<Category>().is_err());
    }

    #[test]
    fn task_serializes_iso_dates() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date"),
            NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date"),
        );
        let task = Task::new("Design Review".to_string(), Category::ToDo, range);
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["start"], "2024-06-10");
        assert_eq!(json["end"], "2024-06-12");
        assert_eq!(json["category"], "to-do");
        assert_eq!(json["id"], task.id.to_string());

        let back: Task = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, task);
    }

    #[test]
    fn task_id_round_trips_through_text() {
        let id = TaskId::new();
        assert_eq!(id.to_string().parse::<TaskId>().expect("parse"), id);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }
}
