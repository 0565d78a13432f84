use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kanban column a task lives in.
///
/// Ordering matters: anything past `Todo` counts as worked on, anything
/// before `Done` is carried over into the next session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];

    /// Column index on the board.
    pub fn index(self) -> usize {
        match self {
            Status::Todo => 0,
            Status::Doing => 1,
            Status::Done => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Status> {
        Status::ALL.get(index).copied()
    }

    /// Column heading shown on the board.
    pub fn title(self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::Doing => "Doing",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        };
        f.write_str(s)
    }
}

/// A single card on the board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Task {
    /// Column the task is in.
    pub status: Status,
    /// Short summary shown in the column.
    pub name: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Last time the task was saved from the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(status: Status, name: impl Into<String>, notes: impl Into<String>) -> Task {
        Task {
            status,
            name: name.into(),
            notes: notes.into(),
            updated_at: None,
        }
    }
}

/// A pomodoro record.
///
/// Used both for the current session (which may hold a pending break, an
/// active work interval or nothing at all) and for sealed history entries.
/// The lifecycle phase is never stored; see [`crate::lifecycle::derive_state`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Session {
    /// Drops the start and end markers, leaving the tasks alone.
    pub fn clear_times(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Length of the work interval, if both ends are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
