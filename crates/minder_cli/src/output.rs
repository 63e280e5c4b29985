use minder_core::config::Styles;
use minder_core::filter::TaskFilter;
use minder_core::model::Task;
use minder_core::reminder::ArmOutcome;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            date: task.date.clone().unwrap_or_else(|| "-".to_string()),
            time: task.time.clone().unwrap_or_else(|| "-".to_string()),
            status: task.status.label().to_string(),
            priority: task.priority.clone(),
        }
    }
}

pub fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "date": task.date,
        "time": task.time,
        "status": task.status,
        "priority": task.priority,
        "created_at": task.created_at,
    })
}

pub fn print_task_json(task: &Task) {
    println!("{}", task_json(task));
}

pub fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

pub fn print_tasks_plain(tasks: &[Task], filter: &TaskFilter, styles: &Styles) {
    if tasks.is_empty() {
        println!("{}", styles.hint(&empty_list_message(filter)));
        return;
    }

    let mut table = Table::new(tasks.iter().map(TaskRow::from));
    table.with(Style::rounded());
    println!("{table}");
}

pub fn empty_list_message(filter: &TaskFilter) -> String {
    let labels = filter.active_labels();
    if labels.is_empty() {
        "No tasks match your filters".to_string()
    } else {
        format!("No tasks with these filters → {}", labels.join(", "))
    }
}

pub fn print_task_details(task: &Task, styles: &Styles) {
    println!("{}", styles.title(&task.title));
    println!("  id:       {}", task.id);
    println!("  date:     {}", task.date.as_deref().unwrap_or("-"));
    println!("  time:     {}", task.time.as_deref().unwrap_or("-"));
    println!("  status:   {}", task.status.label());
    println!("  priority: {}", task.priority);
    println!("  created:  {}", styles.hint(&task.created_at));
}

/// One-line summary of what arming did, or `None` when there is nothing
/// worth telling.
pub fn reminder_note(outcome: ArmOutcome) -> Option<String> {
    match outcome {
        ArmOutcome::Armed { target } | ArmOutcome::Chained { target, .. } => {
            Some(format!("Reminder at {}", format_instant(target)))
        }
        ArmOutcome::Passed => Some("Reminder time has already passed".to_string()),
        ArmOutcome::NotEligible | ArmOutcome::AlreadyArmed => None,
    }
}

pub fn reminder_at(outcome: ArmOutcome) -> Option<String> {
    match outcome {
        ArmOutcome::Armed { target } | ArmOutcome::Chained { target, .. } => {
            Some(format_instant(target))
        }
        _ => None,
    }
}

fn format_instant(instant: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    instant
        .format(&format)
        .unwrap_or_else(|_| instant.to_string())
}
