// File: src/store.rs
// In-memory task list: CRUD, sorting, regex filtering and weekly statistics.
use crate::config::Config;
use crate::model::item::now_timestamp;
use crate::model::matcher::{CompileError, CompiledMatcher, compile_query};
use crate::model::validator::check_import_data;
use crate::model::{Task, TaskInput};
use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

pub const NO_TOP_TAG: &str = "None";
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    DateAsc,
    #[default]
    DateDesc,
    TitleAsc,
    TitleDesc,
    DurationAsc,
    DurationDesc,
}

impl SortKey {
    fn is_ascending(&self) -> bool {
        matches!(self, Self::DateAsc | Self::TitleAsc | Self::DurationAsc)
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ord = match self {
            Self::DateAsc | Self::DateDesc => a.due_naive().cmp(&b.due_naive()),
            Self::TitleAsc | Self::TitleDesc => {
                a.title.to_lowercase().cmp(&b.title.to_lowercase())
            }
            Self::DurationAsc | Self::DurationDesc => a.duration.total_cmp(&b.duration),
        };
        if self.is_ascending() {
            ord
        } else {
            ord.reverse()
        }
    }
}

pub struct FilterOptions<'a> {
    /// `None` keeps every task.
    pub matcher: Option<&'a CompiledMatcher>,
    pub sort: SortKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_tasks: usize,
    pub total_hours: f64,
    pub top_tag: String,
    pub recent_tasks: usize,
    pub weekly_hours: f64,
    pub cap_percentage: f64,
    pub cap_target: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub day: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    pub tasks: Vec<Task>,
    pub settings: Config,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>, settings: Config) -> Self {
        Self { tasks, settings }
    }

    pub fn add_task(&mut self, input: &TaskInput) -> Task {
        let task = Task::from_input(input);
        self.tasks.push(task.clone());
        task
    }

    pub fn update_task(&mut self, id: &str, input: &TaskInput) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.apply_input(input);
        task.updated_at = now_timestamp();
        Some(task.clone())
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self, options: &FilterOptions) -> Vec<&Task> {
        let mut result: Vec<&Task> = match options.matcher {
            Some(m) => self.tasks.iter().filter(|t| t.matches(m)).collect(),
            None => self.tasks.iter().collect(),
        };
        result.sort_by(|a, b| options.sort.compare(a, b));
        log::debug!(
            "Filter pass kept {} of {} task(s)",
            result.len(),
            self.tasks.len()
        );
        result
    }

    /// Compiles `pattern` and filters with it. An empty pattern lists
    /// everything.
    pub fn search(
        &self,
        pattern: &str,
        case_sensitive: bool,
        sort: SortKey,
    ) -> Result<Vec<&Task>, CompileError> {
        let matcher = compile_query(pattern, case_sensitive)?;
        Ok(self.filter(&FilterOptions {
            matcher: matcher.as_ref(),
            sort,
        }))
    }

    pub fn stats(&self) -> Stats {
        self.stats_at(Local::now().date_naive())
    }

    pub fn stats_at(&self, today: NaiveDate) -> Stats {
        let total_minutes: f64 = self.tasks.iter().map(|t| t.duration).sum();

        let mut tag_counts: HashMap<&str, usize> = HashMap::new();
        for task in &self.tasks {
            *tag_counts.entry(task.tag.as_str()).or_default() += 1;
        }
        // Ties go to the tag seen first.
        let mut top_tag: Option<(&str, usize)> = None;
        for task in &self.tasks {
            let count = tag_counts[task.tag.as_str()];
            if top_tag.is_none_or(|(_, best)| count > best) {
                top_tag = Some((task.tag.as_str(), count));
            }
        }

        let week_ago = today - Duration::days(7);
        let recent_tasks = self
            .tasks
            .iter()
            .filter(|t| t.due_naive().is_some_and(|d| d >= week_ago))
            .count();

        let weekly_hours = self.weekly_hours_at(today);

        Stats {
            total_tasks: self.tasks.len(),
            total_hours: total_minutes / 60.0,
            top_tag: top_tag
                .map(|(tag, _)| tag.to_string())
                .unwrap_or_else(|| NO_TOP_TAG.to_string()),
            recent_tasks,
            weekly_hours,
            cap_percentage: self.settings.cap_percentage(weekly_hours),
            cap_target: self.settings.weekly_cap,
        }
    }

    /// Hours scheduled in the week (Sunday to Saturday) containing `today`.
    pub fn weekly_hours_at(&self, today: NaiveDate) -> f64 {
        let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        let week_end = week_start + Duration::days(7);

        let minutes: f64 = self
            .tasks
            .iter()
            .filter(|t| {
                t.due_naive()
                    .is_some_and(|d| d >= week_start && d < week_end)
            })
            .map(|t| t.duration)
            .sum();
        minutes / 60.0
    }

    /// Task counts for the next seven days, bucketed by weekday (Sun..Sat).
    pub fn activity_at(&self, today: NaiveDate) -> Vec<DayActivity> {
        let mut counts = [0usize; 7];
        for task in &self.tasks {
            let Some(due) = task.due_naive() else {
                continue;
            };
            let diff = (due - today).num_days();
            if (0..7).contains(&diff) {
                let day = (today.weekday().num_days_from_sunday() as i64 + diff) % 7;
                counts[day as usize] += 1;
            }
        }
        WEEKDAY_LABELS
            .into_iter()
            .zip(counts)
            .map(|(day, count)| DayActivity { day, count })
            .collect()
    }

    /// Replaces every task with the imported records after a structural
    /// check. On error the store is left untouched.
    pub fn import_tasks(&mut self, data: serde_json::Value) -> Result<usize> {
        check_import_data(&data)?;
        let tasks: Vec<Task> = serde_json::from_value(data)?;
        self.tasks = tasks;
        log::info!("Imported {} task(s)", self.tasks.len());
        Ok(self.tasks.len())
    }

    pub fn export_tasks(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tasks)?)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.settings = Config::default();
    }
}
