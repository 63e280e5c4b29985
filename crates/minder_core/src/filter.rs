//! Filter predicates for the task list.

use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::reminder::instant::{parse_date, parse_time};
use std::str::FromStr;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        TaskStatus::parse(raw)
            .map(Self::Only)
            .ok_or_else(|| AppError::invalid_input("status must be all, pending or completed"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayFilter {
    #[default]
    All,
    Today,
    Tomorrow,
    /// From the start of today through the end of the seventh day after it.
    Week,
}

impl DayFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Week => "week",
        }
    }
}

impl FromStr for DayFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "tomorrow" => Ok(Self::Tomorrow),
            "week" => Ok(Self::Week),
            _ => Err(AppError::invalid_input(
                "day must be all, today, tomorrow or week",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub date: Option<String>,
    pub day: DayFilter,
    pub priority: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, now: OffsetDateTime) -> bool {
        self.matches_search(task)
            && self.matches_status(task)
            && self.matches_date(task)
            && self.matches_day(task, now)
            && self.matches_priority(task)
    }

    pub fn apply(&self, tasks: &[Task], now: OffsetDateTime) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task, now))
            .cloned()
            .collect()
    }

    /// Labels for every filter narrowing the list; search text is not listed.
    pub fn active_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if let StatusFilter::Only(status) = self.status {
            labels.push(format!("Status: {}", status.label()));
        }
        if let Some(date) = non_empty(self.date.as_deref()) {
            labels.push(format!("Date: {date}"));
        }
        if self.day != DayFilter::All {
            labels.push(format!("Day: {}", self.day.label()));
        }
        if let Some(priority) = non_empty(self.priority.as_deref()) {
            labels.push(format!("Priority: {priority}"));
        }
        labels
    }

    fn matches_search(&self, task: &Task) -> bool {
        match non_empty(self.search.as_deref()) {
            Some(needle) => task
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }

    fn matches_status(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status == status,
        }
    }

    fn matches_date(&self, task: &Task) -> bool {
        match non_empty(self.date.as_deref()) {
            Some(date) => task.date.as_deref() == Some(date),
            None => true,
        }
    }

    fn matches_day(&self, task: &Task, now: OffsetDateTime) -> bool {
        if self.day == DayFilter::All {
            return true;
        }
        let Some(date) = task.date.as_deref().and_then(parse_date) else {
            return false;
        };
        let time = match task.time.as_deref() {
            Some(raw) => match parse_time(raw) {
                Some(time) => time,
                None => return false,
            },
            None => Time::MIDNIGHT,
        };
        let instant = PrimitiveDateTime::new(date, time).assume_offset(now.offset());
        let today = now.date();

        match self.day {
            DayFilter::All => true,
            DayFilter::Today => date == today,
            DayFilter::Tomorrow => today.next_day() == Some(date),
            DayFilter::Week => {
                let start = today.midnight().assume_offset(now.offset());
                let end = start + Duration::days(8) - Duration::milliseconds(1);
                instant >= start && instant <= end
            }
        }
    }

    fn matches_priority(&self, task: &Task) -> bool {
        match non_empty(self.priority.as_deref()) {
            Some(priority) => task.priority.eq_ignore_ascii_case(priority),
            None => true,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
