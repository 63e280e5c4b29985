//! One running `minder` process: the task store, the reminder scheduler and
//! the effective configuration.

use minder_core::config::{Config, Styles};
use minder_core::error::AppError;
use minder_core::filter::TaskFilter;
use minder_core::model::{Task, TaskStatus};
use minder_core::notify::Notifier;
use minder_core::reminder::{
    ArmOutcome, Clock, HopReport, ReconcileReport, ReminderScheduler, ReminderState, SystemClock,
};
use minder_core::store::{JsonTaskStore, TaskStore};
use minder_core::task_api::{self, EditOutcome, NewTask, TaskEdit};
use time::OffsetDateTime;
use tracing::debug;

pub type AppSession = Session<JsonTaskStore, Box<dyn Notifier>, SystemClock>;

pub struct Session<S, N, C> {
    scheduler: ReminderScheduler<S, N, C>,
    config: Config,
}

impl AppSession {
    pub fn open(config: Config, clock: SystemClock) -> Result<Self, AppError> {
        let store = JsonTaskStore::from_env()?;
        debug!(path = %store.path().display(), "opening task store");
        Session::new(store, minder_core::notify::notifier_from_env(), clock, config)
    }
}

impl<S, N, C> Session<S, N, C>
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    pub fn new(store: S, notifier: N, clock: C, config: Config) -> Result<Self, AppError> {
        let scheduler = ReminderScheduler::new(store, notifier, clock, config.reminder)?;
        Ok(Self { scheduler, config })
    }

    pub fn styles(&self) -> Styles {
        self.config.theme.styles()
    }

    pub fn now(&self) -> OffsetDateTime {
        self.scheduler.clock().now()
    }

    pub fn add(&mut self, input: NewTask) -> Result<(Task, ArmOutcome), AppError> {
        let now = self.now();
        let task = task_api::add_task(self.scheduler.store_mut(), input, now)?;
        let outcome = self.scheduler.arm(&task);
        Ok((task, outcome))
    }

    /// Applies `edit`; the reminder is re-armed when the date, time or status
    /// changed.
    pub fn edit(&mut self, id: &str, edit: TaskEdit) -> Result<EditOutcome, AppError> {
        let outcome = task_api::edit_task(self.scheduler.store_mut(), id, edit)?;
        if outcome.needs_rearm() {
            self.scheduler.arm(&outcome.task);
        }
        Ok(outcome)
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task, AppError> {
        let task = task_api::set_status(self.scheduler.store_mut(), id, status)?;
        self.scheduler.arm(&task);
        Ok(task)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, AppError> {
        let task = task_api::delete_task(self.scheduler.store_mut(), id)?;
        self.scheduler.forget(&task.id);
        Ok(task)
    }

    pub fn show(&self, id: &str) -> Result<Task, AppError> {
        task_api::get_task(self.scheduler.store(), id)
    }

    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        task_api::list_tasks(self.scheduler.store(), filter, self.now())
    }

    pub fn reminder_state(&self, id: &str) -> ReminderState {
        self.scheduler.state(id)
    }

    pub fn reconcile(&mut self) -> Result<ReconcileReport, AppError> {
        self.scheduler.reconcile()
    }

    pub fn fire_due(&mut self) -> Vec<HopReport> {
        self.scheduler.fire_due()
    }

    pub fn next_due(&self) -> Option<OffsetDateTime> {
        self.scheduler.next_due()
    }

    pub fn active_reminders(&self) -> usize {
        self.scheduler.active_count()
    }
}
