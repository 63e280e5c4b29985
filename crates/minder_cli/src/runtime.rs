//! Command dispatch and the two long-running loops: the interactive session
//! and `watch`. Both run on a current-thread tokio runtime and sleep until
//! the next queued hop.

use crate::cli::{Cli, Command};
use crate::output;
use crate::session::Session;
use clap::{CommandFactory, Parser};
use minder_core::error::AppError;
use minder_core::filter::TaskFilter;
use minder_core::model::TaskStatus;
use minder_core::notify::Notifier;
use minder_core::reminder::{Clock, HopOutcome, HopReport};
use minder_core::store::TaskStore;
use minder_core::task_api::{NewTask, TaskEdit};
use std::time::Duration as StdDuration;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub fn run_command<S, N, C>(session: &mut Session<S, N, C>, cli: Cli) -> Result<(), AppError>
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };
    let styles = session.styles();

    match command {
        Command::Add {
            title,
            date,
            time,
            priority,
        } => {
            let (task, outcome) = session.add(NewTask {
                title,
                date,
                time,
                priority: priority.unwrap_or_default(),
            })?;
            if cli.json {
                let mut json = output::task_json(&task);
                json["reminder_at"] = serde_json::json!(output::reminder_at(outcome));
                println!("{json}");
            } else {
                println!(
                    "Added task: {} ({})",
                    styles.title(&task.title),
                    task.id
                );
                if let Some(note) = output::reminder_note(outcome) {
                    println!("{}", styles.hint(&note));
                }
            }
        }
        Command::Edit {
            id,
            title,
            date,
            time,
            status,
            priority,
        } => {
            let status = status
                .as_deref()
                .map(|raw| {
                    TaskStatus::parse(raw)
                        .ok_or_else(|| AppError::invalid_input("status must be pending or completed"))
                })
                .transpose()?;
            let outcome = session.edit(
                &id,
                TaskEdit {
                    title,
                    date,
                    time,
                    status,
                    priority,
                },
            )?;
            if cli.json {
                output::print_task_json(&outcome.task);
            } else {
                println!("Updated task: {} ({})", outcome.task.title, outcome.task.id);
            }
        }
        Command::Delete { id } => {
            let task = session.delete(&id)?;
            if cli.json {
                output::print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = session.show(&id)?;
            if cli.json {
                output::print_task_json(&task);
            } else {
                output::print_task_details(&task, &styles);
            }
        }
        Command::Done { id } => {
            let task = session.set_status(&id, TaskStatus::Completed)?;
            if cli.json {
                output::print_task_json(&task);
            } else {
                println!("Completed task: {} ({})", task.title, task.id);
            }
        }
        Command::Undo { id } => {
            let task = session.set_status(&id, TaskStatus::Pending)?;
            if cli.json {
                output::print_task_json(&task);
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::List {
            search,
            status,
            date,
            day,
            priority,
        } => {
            let filter = TaskFilter {
                search,
                status: status.parse()?,
                date,
                day: day.parse()?,
                priority,
            };
            let tasks = session.list(&filter)?;
            if cli.json {
                output::print_tasks_json(&tasks);
            } else {
                output::print_tasks_plain(&tasks, &filter, &styles);
            }
        }
        Command::Watch { .. } => {
            return Err(AppError::invalid_input(
                "watch is not available inside the interactive session",
            ));
        }
    }

    Ok(())
}

/// Reads commands from stdin until EOF or `exit`, delivering reminders as
/// they fall due in between.
pub async fn run_interactive<S, N, C>(session: &mut Session<S, N, C>) -> Result<(), AppError>
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    let report = session.reconcile()?;
    debug!(
        armed = report.armed,
        chained = report.chained,
        "interactive session started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let wait = wait_for(session.next_due(), session.now());
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(session, &line) {
                    break;
                }
            }
            _ = wait => {
                log_reports(&session.fire_due());
            }
        }
    }

    Ok(())
}

/// Delivers reminders until interrupted. The store is re-read every
/// `rescan` so tasks added by other `minder` processes are picked up; with
/// `None` only the start-up scan happens.
pub async fn run_watch<S, N, C>(
    session: &mut Session<S, N, C>,
    rescan: Option<StdDuration>,
    exit_when_idle: bool,
) -> Result<(), AppError>
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    let report = session.reconcile()?;
    info!(
        armed = report.armed,
        chained = report.chained,
        skipped = report.skipped,
        "watching for reminders"
    );

    let mut rescan_timer = match rescan {
        Some(period) => {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await;
            Some(timer)
        }
        None => None,
    };

    loop {
        if exit_when_idle && session.active_reminders() == 0 {
            debug!("no reminders pending, leaving watch");
            break;
        }

        let wait = wait_for(session.next_due(), session.now());
        tokio::select! {
            _ = wait => {
                log_reports(&session.fire_due());
            }
            _ = next_rescan(rescan_timer.as_mut()) => {
                if let Err(err) = session.reconcile() {
                    warn!(error = %err, "rescan failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    Ok(())
}

fn handle_line<S, N, C>(session: &mut Session<S, N, C>, input: &str) -> bool
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    let line = input.trim();
    if line.is_empty() {
        return true;
    }

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return false;
    }

    if line == "help" || line == "?" {
        print_help();
        return true;
    }

    let args = match split_command_line(line) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            return true;
        }
    };

    if args.is_empty() {
        return true;
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("minder".to_string());
    argv.extend(args);

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            return true;
        }
    };

    if !cli.config_override.is_empty() {
        eprintln!(
            "ERROR: {}",
            AppError::invalid_input("--config-override is only read at start-up")
        );
        return true;
    }

    if let Err(err) = run_command(session, cli) {
        eprintln!("ERROR: {}", err);
    }
    true
}

async fn wait_for(due: Option<OffsetDateTime>, now: OffsetDateTime) {
    match due {
        Some(due) => tokio::time::sleep(remaining(due, now)).await,
        None => std::future::pending::<()>().await,
    }
}

async fn next_rescan(timer: Option<&mut Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn remaining(due: OffsetDateTime, now: OffsetDateTime) -> StdDuration {
    let delay = due - now;
    if delay.is_positive() {
        delay.unsigned_abs()
    } else {
        StdDuration::ZERO
    }
}

fn log_reports(reports: &[HopReport]) {
    for report in reports {
        match report.outcome {
            HopOutcome::DeliveryFailed => {
                warn!(task_id = %report.task_id, "reminder could not be delivered")
            }
            outcome => debug!(task_id = %report.task_id, outcome = ?outcome, "hop handled"),
        }
    }
}

pub fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

pub fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}
