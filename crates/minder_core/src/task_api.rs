use crate::error::AppError;
use crate::filter::TaskFilter;
use crate::model::{Task, TaskStatus};
use crate::reminder::instant::{parse_date, parse_time};
use crate::store::TaskStore;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub priority: String,
}

/// Field changes for [`edit_task`]. `None` keeps the current value; an empty
/// date or time clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub task: Task,
    /// The date or time changed.
    pub schedule_changed: bool,
    pub status_changed: bool,
}

impl EditOutcome {
    /// Whether the task's reminder has to be armed again.
    pub fn needs_rearm(&self) -> bool {
        self.schedule_changed || self.status_changed
    }
}

pub fn add_task<S: TaskStore + ?Sized>(
    store: &mut S,
    input: NewTask,
    now: OffsetDateTime,
) -> Result<Task, AppError> {
    let title = required(&input.title, "title is required")?;
    let priority = required(&input.priority, "priority is required")?;
    let date = normalize_date(input.date.as_deref())?;
    let time = normalize_time(input.time.as_deref())?;

    let created_at = now
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let id = format!("task-{}", now.unix_timestamp_nanos());

    let task = Task {
        id,
        title,
        date,
        time,
        status: TaskStatus::Pending,
        priority,
        created_at,
    };

    store.insert(task.clone())?;
    Ok(task)
}

pub fn edit_task<S: TaskStore + ?Sized>(
    store: &mut S,
    id: &str,
    edit: TaskEdit,
) -> Result<EditOutcome, AppError> {
    let mut task = get_task(store, id)?;
    let previous_date = task.date.clone();
    let previous_time = task.time.clone();
    let previous_status = task.status;

    if let Some(title) = edit.title.as_deref() {
        task.title = required(title, "title is required")?;
    }
    if let Some(priority) = edit.priority.as_deref() {
        task.priority = required(priority, "priority is required")?;
    }
    if let Some(date) = edit.date.as_deref() {
        task.date = normalize_date(Some(date))?;
    }
    if let Some(time) = edit.time.as_deref() {
        task.time = normalize_time(Some(time))?;
    }
    if let Some(status) = edit.status {
        task.status = status;
    }

    let schedule_changed = task.date != previous_date || task.time != previous_time;
    let status_changed = task.status != previous_status;
    store.update(task.clone())?;

    Ok(EditOutcome {
        task,
        schedule_changed,
        status_changed,
    })
}

pub fn set_status<S: TaskStore + ?Sized>(
    store: &mut S,
    id: &str,
    status: TaskStatus,
) -> Result<Task, AppError> {
    let mut task = get_task(store, id)?;
    if task.status == status {
        return Err(AppError::invalid_input(format!(
            "task already {}",
            status.label()
        )));
    }
    task.status = status;
    store.update(task.clone())?;
    Ok(task)
}

pub fn delete_task<S: TaskStore + ?Sized>(store: &mut S, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    store
        .remove(trimmed_id)?
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

pub fn get_task<S: TaskStore + ?Sized>(store: &S, id: &str) -> Result<Task, AppError> {
    let trimmed_id = required_id(id)?;
    store
        .get(trimmed_id)?
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

pub fn list_tasks<S: TaskStore + ?Sized>(
    store: &S,
    filter: &TaskFilter,
    now: OffsetDateTime,
) -> Result<Vec<Task>, AppError> {
    Ok(filter.apply(&store.list()?, now))
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn required(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(message));
    }
    Ok(trimmed.to_string())
}

fn normalize_date(value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(|_| Some(raw.to_string()))
            .ok_or_else(|| AppError::invalid_input("date must be YYYY-MM-DD")),
    }
}

fn normalize_time(value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_time(raw)
            .map(|_| Some(raw.to_string()))
            .ok_or_else(|| AppError::invalid_input("time must be HH:MM or HH:MM:SS")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        NewTask, TaskEdit, add_task, delete_task, edit_task, get_task, list_tasks, set_status,
    };
    use crate::filter::{StatusFilter, TaskFilter};
    use crate::model::{Task, TaskStatus};
    use crate::store::{JsonTaskStore, MemoryTaskStore, TaskStore};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("minder-{nanos}-{file_name}"))
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            date: Some("2030-01-01".to_string()),
            time: Some("10:00".to_string()),
            priority: "high".to_string(),
        }
    }

    fn stored(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: "stored".to_string(),
            date: Some("2030-01-01".to_string()),
            time: Some("10:00".to_string()),
            status: TaskStatus::Pending,
            priority: "low".to_string(),
            created_at: "2029-12-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let mut store = MemoryTaskStore::new();
        let err = add_task(
            &mut store,
            new_task("  "),
            datetime!(2029-12-01 00:00 UTC),
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.message(), "title is required");
    }

    #[test]
    fn add_task_requires_priority() {
        let mut store = MemoryTaskStore::new();
        let input = NewTask {
            priority: " ".to_string(),
            ..new_task("demo")
        };
        let err = add_task(&mut store, input, datetime!(2029-12-01 00:00 UTC)).unwrap_err();

        assert_eq!(err.message(), "priority is required");
    }

    #[test]
    fn add_task_rejects_malformed_schedule() {
        let mut store = MemoryTaskStore::new();
        let bad_date = NewTask {
            date: Some("01/02/2030".to_string()),
            ..new_task("demo")
        };
        let bad_time = NewTask {
            time: Some("ten".to_string()),
            ..new_task("demo")
        };
        let now = datetime!(2029-12-01 00:00 UTC);

        assert!(add_task(&mut store, bad_date, now).is_err());
        assert!(add_task(&mut store, bad_time, now).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn add_task_writes_to_store() {
        let path = temp_path("add-task.json");
        let mut store = JsonTaskStore::new(&path);
        let input = NewTask {
            time: Some(" ".to_string()),
            ..new_task("  demo ")
        };

        let task = add_task(&mut store, input, datetime!(2029-12-01 00:00 UTC)).unwrap();
        let loaded = store.list().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(task.title, "demo");
        assert_eq!(task.time, None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, "2029-12-01T00:00:00Z");
        assert_eq!(loaded, vec![task]);
    }

    #[test]
    fn edit_task_reports_schedule_change() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1")]);

        let retitled = edit_task(
            &mut store,
            "task-1",
            TaskEdit {
                title: Some("renamed".to_string()),
                ..TaskEdit::default()
            },
        )
        .unwrap();
        assert!(!retitled.schedule_changed);
        assert!(!retitled.needs_rearm());
        assert_eq!(retitled.task.title, "renamed");

        let moved = edit_task(
            &mut store,
            "task-1",
            TaskEdit {
                time: Some("11:30".to_string()),
                ..TaskEdit::default()
            },
        )
        .unwrap();
        assert!(moved.schedule_changed);
        assert_eq!(
            store.get("task-1").unwrap().unwrap().time.as_deref(),
            Some("11:30")
        );
    }

    #[test]
    fn edit_task_reports_status_change() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1")]);

        let completed = edit_task(
            &mut store,
            "task-1",
            TaskEdit {
                status: Some(TaskStatus::Completed),
                ..TaskEdit::default()
            },
        )
        .unwrap();
        assert!(completed.status_changed);
        assert!(!completed.schedule_changed);
        assert!(completed.needs_rearm());

        let unchanged = edit_task(
            &mut store,
            "task-1",
            TaskEdit {
                status: Some(TaskStatus::Completed),
                ..TaskEdit::default()
            },
        )
        .unwrap();
        assert!(!unchanged.status_changed);
    }

    #[test]
    fn edit_task_clears_date_with_empty_value() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1")]);

        let outcome = edit_task(
            &mut store,
            "task-1",
            TaskEdit {
                date: Some(String::new()),
                ..TaskEdit::default()
            },
        )
        .unwrap();

        assert!(outcome.schedule_changed);
        assert_eq!(outcome.task.date, None);
    }

    #[test]
    fn edit_task_rejects_blank_title_and_unknown_id() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1")]);
        let blank = TaskEdit {
            title: Some(" ".to_string()),
            ..TaskEdit::default()
        };

        assert_eq!(
            edit_task(&mut store, "task-1", blank).unwrap_err().message(),
            "title is required"
        );
        assert_eq!(
            edit_task(&mut store, "task-2", TaskEdit::default())
                .unwrap_err()
                .message(),
            "task not found"
        );
        assert_eq!(
            edit_task(&mut store, " ", TaskEdit::default())
                .unwrap_err()
                .message(),
            "id is required"
        );
    }

    #[test]
    fn set_status_toggles_and_rejects_noop() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1")]);

        let done = set_status(&mut store, "task-1", TaskStatus::Completed).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        let err = set_status(&mut store, "task-1", TaskStatus::Completed).unwrap_err();
        assert_eq!(err.message(), "task already completed");

        let reopened = set_status(&mut store, "task-1", TaskStatus::Pending).unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
    }

    #[test]
    fn delete_task_removes_task() {
        let mut store = MemoryTaskStore::with_tasks(vec![stored("task-1"), stored("task-2")]);

        let removed = delete_task(&mut store, "task-1").unwrap();

        assert_eq!(removed.id, "task-1");
        assert_eq!(get_task(&store, "task-1").unwrap_err().code(), "invalid_input");
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(delete_task(&mut store, "task-1").is_err());
    }

    #[test]
    fn list_tasks_applies_filter() {
        let mut done = stored("task-2");
        done.status = TaskStatus::Completed;
        let store = MemoryTaskStore::with_tasks(vec![stored("task-1"), done]);
        let filter = TaskFilter {
            status: StatusFilter::Only(TaskStatus::Completed),
            ..TaskFilter::default()
        };

        let listed = list_tasks(&store, &filter, datetime!(2030-01-01 00:00 UTC)).unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "task-2");
    }
}
