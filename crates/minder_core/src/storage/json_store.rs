use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "MINDER_STORE_PATH";
const CORRUPT_SUFFIX: &str = "corrupt";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("minder").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("minder")
            .join(STORE_FILE_NAME))
    }
}

/// Loads the task list, treating a missing or empty file as empty.
///
/// A file that is not valid JSON is moved aside to `<name>.corrupt` and an
/// empty list is returned, so a damaged store never blocks the task list.
/// A readable file with an unknown schema version is an error.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let stored: StoredTasks = match serde_json::from_str(&content) {
        Ok(stored) => stored,
        Err(err) => {
            let backup = corrupt_path(path);
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %err,
                "task store is unreadable, starting with an empty list"
            );
            std::fs::rename(path, &backup)?;
            return Ok(Vec::new());
        }
    };

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    Ok(stored.tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    // Readers only ever see the old file or the complete new one.
    let staging = staging_path(path);
    std::fs::write(&staging, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&staging, permissions)?;
    }

    if let Err(err) = std::fs::rename(&staging, path) {
        std::fs::remove_file(&staging).ok();
        return Err(err.into());
    }

    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(
        path.file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| STORE_FILE_NAME.into()),
    );
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| STORE_FILE_NAME.into());
    name.push(".");
    name.push(CORRUPT_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_VERSION, corrupt_path, load_tasks, save_tasks, staging_path};
    use crate::model::{Task, TaskStatus};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("minder-{nanos}-{file_name}"))
    }

    fn sample_task() -> Task {
        Task {
            id: "task-1".to_string(),
            title: "water the plants".to_string(),
            date: Some("2030-01-01".to_string()),
            time: Some("10:00".to_string()),
            status: TaskStatus::Pending,
            priority: "low".to_string(),
            created_at: "2029-12-20T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn save_and_load_keeps_schedule_fields() {
        let path = temp_path("tasks.json");
        let task = sample_task();

        save_tasks(&path, std::slice::from_ref(&task)).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, vec![task]);
    }

    #[test]
    fn missing_file_is_empty() {
        let path = temp_path("missing.json");
        assert!(load_tasks(&path).unwrap().is_empty());
    }

    #[test]
    fn accepts_tasks_without_date_time_or_priority() {
        let path = temp_path("sparse.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": \"task-1\",\n      \"title\": \"demo\",\n      \"status\": \"pending\",\n      \"created_at\": \"2025-12-20T00:00:00Z\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].date, None);
        assert_eq!(loaded[0].time, None);
        assert!(loaded[0].priority.is_empty());
    }

    #[test]
    fn unreadable_store_is_moved_aside() {
        let path = temp_path("garbage.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = load_tasks(&path).unwrap();
        let backup = corrupt_path(&path);
        let backup_exists = backup.exists();
        fs::remove_file(&backup).ok();

        assert!(loaded.is_empty());
        assert!(!path.exists());
        assert!(backup_exists);
    }

    #[test]
    fn schema_version_must_match() {
        let path = temp_path("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn save_replaces_file_without_leaving_staging_copy() {
        let path = temp_path("replace.json");
        let mut task = sample_task();
        save_tasks(&path, std::slice::from_ref(&task)).unwrap();

        task.title = "repot the plants".to_string();
        save_tasks(&path, std::slice::from_ref(&task)).unwrap();
        let loaded = load_tasks(&path).unwrap();
        let staging_left = staging_path(&path).exists();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, vec![task]);
        assert!(!staging_left);
    }

    #[test]
    fn empty_file_is_left_in_place() {
        let path = temp_path("empty.json");
        fs::write(&path, "").unwrap();

        let loaded = load_tasks(&path).unwrap();
        let still_there = path.exists();
        let moved_aside = corrupt_path(&path).exists();
        fs::remove_file(&path).ok();

        assert!(loaded.is_empty());
        assert!(still_there);
        assert!(!moved_aside);
    }
}
