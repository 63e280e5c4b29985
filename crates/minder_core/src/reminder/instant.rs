use crate::model::{Task, TaskStatus};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute][optional [:[second]]]");

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(raw: &str) -> Option<Time> {
    Time::parse(raw.trim(), TIME_FORMAT).ok()
}

/// Combines a task's date and time into an instant at `offset`.
/// `None` when either part is missing or does not parse.
pub fn task_instant(task: &Task, offset: UtcOffset) -> Option<OffsetDateTime> {
    let date = parse_date(task.date.as_deref()?)?;
    let time = parse_time(task.time.as_deref()?)?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// The instant a reminder for `task` should be delivered, or `None` when the
/// task is not reminder-eligible.
pub fn reminder_target(task: &Task, offset: UtcOffset, lead: Duration) -> Option<OffsetDateTime> {
    if task.status == TaskStatus::Completed {
        return None;
    }
    task_instant(task, offset)?.checked_sub(lead)
}

/// Human wording of a lead time, e.g. `15 minutes`.
pub fn lead_time_text(lead: Duration) -> String {
    let minutes = lead.whole_minutes();
    if minutes % 60 == 0 && minutes >= 60 {
        let hours = minutes / 60;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        }
    } else if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

#[cfg(test)]
mod tests {
    use super::{lead_time_text, reminder_target, task_instant};
    use crate::model::{Task, TaskStatus};
    use time::macros::{datetime, offset};
    use time::{Duration, UtcOffset};

    fn task(date: Option<&str>, time: Option<&str>) -> Task {
        Task {
            id: "task-1".to_string(),
            title: "call the bank".to_string(),
            date: date.map(str::to_string),
            time: time.map(str::to_string),
            status: TaskStatus::Pending,
            priority: "high".to_string(),
            created_at: "2029-12-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn combines_date_and_time_in_offset() {
        let instant = task_instant(&task(Some("2030-01-01"), Some("10:00")), offset!(+1)).unwrap();
        assert_eq!(instant, datetime!(2030-01-01 10:00 +1));
    }

    #[test]
    fn accepts_seconds() {
        let instant =
            task_instant(&task(Some("2030-01-01"), Some("10:00:30")), UtcOffset::UTC).unwrap();
        assert_eq!(instant, datetime!(2030-01-01 10:00:30 UTC));
    }

    #[test]
    fn missing_or_invalid_parts_are_not_eligible() {
        assert!(task_instant(&task(None, Some("10:00")), UtcOffset::UTC).is_none());
        assert!(task_instant(&task(Some("2030-01-01"), None), UtcOffset::UTC).is_none());
        assert!(task_instant(&task(Some("2030-02-30"), Some("10:00")), UtcOffset::UTC).is_none());
        assert!(task_instant(&task(Some("2030-01-01"), Some("25:00")), UtcOffset::UTC).is_none());
        assert!(task_instant(&task(Some("soon"), Some("10:00")), UtcOffset::UTC).is_none());
    }

    #[test]
    fn target_subtracts_lead_time() {
        let target = reminder_target(
            &task(Some("2030-01-01"), Some("10:00")),
            UtcOffset::UTC,
            Duration::minutes(15),
        );
        assert_eq!(target, Some(datetime!(2030-01-01 09:45 UTC)));
    }

    #[test]
    fn completed_tasks_have_no_target() {
        let mut done = task(Some("2030-01-01"), Some("10:00"));
        done.status = TaskStatus::Completed;
        assert!(reminder_target(&done, UtcOffset::UTC, Duration::minutes(15)).is_none());
    }

    #[test]
    fn lead_time_wording() {
        assert_eq!(lead_time_text(Duration::minutes(15)), "15 minutes");
        assert_eq!(lead_time_text(Duration::minutes(1)), "1 minute");
        assert_eq!(lead_time_text(Duration::minutes(60)), "1 hour");
        assert_eq!(lead_time_text(Duration::minutes(120)), "2 hours");
    }
}
