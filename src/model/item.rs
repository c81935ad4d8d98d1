// File: ./src/model/item.rs
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::model::matcher::{CompiledMatcher, matches_any};

/// A stored task. Field names serialise in camelCase so exported files keep
/// the layout users already have on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due_date: String,
    /// Minutes.
    pub duration: f64,
    pub tag: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw form values as typed by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub date: String,
    pub duration: String,
    pub tag: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Timestamp in the same shape browsers emit (`2024-01-01T10:00:00.000Z`).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn generate_id() -> String {
    format!(
        "task_{}_{}",
        Utc::now().timestamp_millis(),
        fastrand::u32(..10000)
    )
}

impl Task {
    /// Builds a new task from already validated form values.
    pub fn from_input(input: &TaskInput) -> Self {
        let now = now_timestamp();
        let mut task = Self {
            id: generate_id(),
            title: String::new(),
            due_date: String::new(),
            duration: 0.0,
            tag: String::new(),
            notes: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        task.apply_input(input);
        task
    }

    /// Copies form values onto the task, normalising them the way they are
    /// stored: trimmed title and notes, lowercase tag.
    pub fn apply_input(&mut self, input: &TaskInput) {
        self.title = input.title.trim().to_string();
        self.due_date = input.date.clone();
        self.duration = input.duration.trim().parse::<f64>().unwrap_or(0.0);
        self.tag = input.tag.trim().to_lowercase();
        self.notes = input
            .notes
            .as_deref()
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
    }

    /// Inverse of `apply_input`, used to prefill an edit form.
    pub fn to_input(&self) -> TaskInput {
        TaskInput {
            title: self.title.clone(),
            date: self.due_date.clone(),
            duration: format_minutes(self.duration),
            tag: self.tag.clone(),
            notes: if self.notes.is_empty() {
                None
            } else {
                Some(self.notes.clone())
            },
        }
    }

    pub fn due_naive(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due_date, "%Y-%m-%d").ok()
    }

    /// True if any searchable field (title, tag, notes, due date) matches.
    pub fn matches(&self, matcher: &CompiledMatcher) -> bool {
        matches_any(matcher, &self.title)
            || matches_any(matcher, &self.tag)
            || matches_any(matcher, &self.notes)
            || matches_any(matcher, &self.due_date)
    }
}

/// Formats minutes without a trailing `.0` for whole numbers.
pub fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{}", minutes)
    }
}
