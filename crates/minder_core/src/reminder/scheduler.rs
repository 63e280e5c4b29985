use crate::error::AppError;
use crate::model::Task;
use crate::notify::Notifier;
use crate::reminder::ReminderSettings;
use crate::reminder::clock::Clock;
use crate::reminder::instant::{lead_time_text, reminder_target};
use crate::reminder::timer::{Hop, HopKind, QueuedHop, TimerQueue};
use crate::store::TaskStore;
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const REMINDER_TITLE: &str = "⏰ Task Reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Idle,
    /// Waiting on re-arm hops; `hops` counts the hops armed so far.
    Chained { hops: u32 },
    Armed,
    Fired,
}

/// The in-flight reminder of one task. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub task_id: String,
    pub target_instant: OffsetDateTime,
    pub pending_until: OffsetDateTime,
    pub state: ReminderState,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Missing or unparseable date/time, or the task is completed.
    NotEligible,
    /// The reminder instant is not in the future.
    Passed,
    /// A reminder for the same instant is already pending.
    AlreadyArmed,
    Armed {
        target: OffsetDateTime,
    },
    Chained {
        target: OffsetDateTime,
        pending_until: OffsetDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    Desktop,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    /// Superseded by a later `arm` for the same task.
    Stale,
    /// The task no longer exists (or could not be read).
    Vanished,
    NotEligible,
    Passed,
    Rechained { pending_until: OffsetDateTime },
    Rearmed { target: OffsetDateTime },
    Delivered(DeliveryChannel),
    DeliveryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopReport {
    pub task_id: String,
    pub due: OffsetDateTime,
    pub outcome: HopOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub armed: usize,
    pub chained: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

pub struct ReminderScheduler<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
    settings: ReminderSettings,
    queue: TimerQueue,
    reminders: HashMap<String, ScheduledReminder>,
    next_generation: u64,
}

impl<S, N, C> ReminderScheduler<S, N, C>
where
    S: TaskStore,
    N: Notifier,
    C: Clock,
{
    pub fn new(
        store: S,
        notifier: N,
        clock: C,
        settings: ReminderSettings,
    ) -> Result<Self, AppError> {
        settings.validate()?;
        Ok(Self {
            store,
            notifier,
            clock,
            settings,
            queue: TimerQueue::new(settings.max_delay()),
            reminders: HashMap::new(),
            next_generation: 0,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    pub fn queue(&self) -> &TimerQueue {
        &self.queue
    }

    pub fn reminder(&self, task_id: &str) -> Option<&ScheduledReminder> {
        self.reminders.get(task_id)
    }

    pub fn state(&self, task_id: &str) -> ReminderState {
        self.reminders
            .get(task_id)
            .map_or(ReminderState::Idle, |reminder| reminder.state)
    }

    /// Number of reminders still waiting to fire.
    pub fn active_count(&self) -> usize {
        self.reminders
            .values()
            .filter(|reminder| {
                matches!(
                    reminder.state,
                    ReminderState::Armed | ReminderState::Chained { .. }
                )
            })
            .count()
    }

    pub fn next_due(&self) -> Option<OffsetDateTime> {
        self.queue.next_due()
    }

    /// (Re)arms the reminder for `task`. Any reminder armed earlier for the
    /// same task is superseded unless it already targets the same instant.
    pub fn arm(&mut self, task: &Task) -> ArmOutcome {
        let now = self.clock.now();
        let outcome = self.arm_at(task, now, 0, true);
        match outcome {
            ArmOutcome::Armed { target } => {
                info!(task_id = %task.id, target = %target, "reminder armed");
            }
            ArmOutcome::Chained {
                target,
                pending_until,
            } => {
                info!(
                    task_id = %task.id,
                    target = %target,
                    pending_until = %pending_until,
                    "reminder chained past the timer limit"
                );
            }
            other => debug!(task_id = %task.id, outcome = ?other, "nothing to arm"),
        }
        outcome
    }

    /// Drops the in-memory reminder of a deleted task.
    pub fn forget(&mut self, task_id: &str) {
        if self.reminders.remove(task_id).is_some() {
            debug!(task_id, "reminder forgotten");
        }
    }

    /// Arms every task in the store once and drops reminders that are over.
    /// Used at start-up, where it is the only way reminders come back after a
    /// restart, and on every rescan.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, AppError> {
        let tasks = self.store.list()?;
        let mut report = ReconcileReport::default();

        for task in &tasks {
            match self.arm(task) {
                ArmOutcome::Armed { .. } => report.armed += 1,
                ArmOutcome::Chained { .. } => report.chained += 1,
                ArmOutcome::AlreadyArmed => report.unchanged += 1,
                ArmOutcome::NotEligible | ArmOutcome::Passed => report.skipped += 1,
            }
        }

        // Fired reminders and tasks deleted elsewhere are done with.
        let live: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        self.reminders.retain(|task_id, reminder| {
            reminder.state != ReminderState::Fired && live.contains(task_id.as_str())
        });

        debug!(
            armed = report.armed,
            chained = report.chained,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "reconciled reminders"
        );
        Ok(report)
    }

    /// Runs every hop due at the clock's current instant.
    pub fn fire_due(&mut self) -> Vec<HopReport> {
        let now = self.clock.now();
        let mut reports = Vec::new();

        while let Some(queued) = self.queue.pop_due(now) {
            let QueuedHop { due, hop, .. } = queued;
            let task_id = hop.task_id.clone();
            let outcome = self.run_hop(hop, now);
            debug!(task_id = %task_id, due = %due, outcome = ?outcome, "hop fired");
            reports.push(HopReport {
                task_id,
                due,
                outcome,
            });
        }

        reports
    }

    fn arm_at(
        &mut self,
        task: &Task,
        now: OffsetDateTime,
        hops: u32,
        reuse_pending: bool,
    ) -> ArmOutcome {
        let Some(target) = reminder_target(task, now.offset(), self.settings.lead_time()) else {
            self.reminders.remove(&task.id);
            return ArmOutcome::NotEligible;
        };
        if target <= now {
            self.reminders.remove(&task.id);
            return ArmOutcome::Passed;
        }

        if reuse_pending
            && let Some(existing) = self.reminders.get(&task.id)
            && existing.target_instant == target
            && matches!(
                existing.state,
                ReminderState::Armed | ReminderState::Chained { .. }
            )
        {
            return ArmOutcome::AlreadyArmed;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let delay = target - now;
        let (kind, wait, state) = if delay > self.settings.max_delay() {
            (
                HopKind::Rearm,
                self.settings.chain_step(),
                ReminderState::Chained { hops: hops + 1 },
            )
        } else {
            (HopKind::Deliver { target }, delay, ReminderState::Armed)
        };

        let hop = Hop {
            task_id: task.id.clone(),
            generation,
            kind,
        };
        if let Err(err) = self.queue.after(now, wait, hop) {
            warn!(task_id = %task.id, error = %err, "could not queue reminder");
            self.reminders.remove(&task.id);
            return ArmOutcome::NotEligible;
        }

        let pending_until = now + wait;
        self.reminders.insert(
            task.id.clone(),
            ScheduledReminder {
                task_id: task.id.clone(),
                target_instant: target,
                pending_until,
                state,
                generation,
            },
        );

        match state {
            ReminderState::Chained { .. } => ArmOutcome::Chained {
                target,
                pending_until,
            },
            _ => ArmOutcome::Armed { target },
        }
    }

    fn run_hop(&mut self, hop: Hop, now: OffsetDateTime) -> HopOutcome {
        let hops = match self.reminders.get(&hop.task_id) {
            Some(current) if current.generation == hop.generation => match current.state {
                ReminderState::Chained { hops } => hops,
                _ => 0,
            },
            _ => return HopOutcome::Stale,
        };

        let task = match self.store.get(&hop.task_id) {
            Ok(Some(task)) => task,
            Ok(None) => {
                self.reminders.remove(&hop.task_id);
                return HopOutcome::Vanished;
            }
            Err(err) => {
                warn!(task_id = %hop.task_id, error = %err, "could not read task, dropping reminder");
                self.reminders.remove(&hop.task_id);
                return HopOutcome::Vanished;
            }
        };

        match hop.kind {
            HopKind::Rearm => self.continue_chain(&task, now, hops),
            HopKind::Deliver { target } => {
                match reminder_target(&task, now.offset(), self.settings.lead_time()) {
                    Some(live) if live == target => self.deliver(&task),
                    Some(live) if live > now => self.continue_chain(&task, now, 0),
                    Some(_) => {
                        self.reminders.remove(&task.id);
                        HopOutcome::Passed
                    }
                    None => {
                        self.reminders.remove(&task.id);
                        HopOutcome::NotEligible
                    }
                }
            }
        }
    }

    fn continue_chain(&mut self, task: &Task, now: OffsetDateTime, hops: u32) -> HopOutcome {
        match self.arm_at(task, now, hops, false) {
            ArmOutcome::Chained { pending_until, .. } => HopOutcome::Rechained { pending_until },
            ArmOutcome::Armed { target } => HopOutcome::Rearmed { target },
            ArmOutcome::NotEligible => HopOutcome::NotEligible,
            ArmOutcome::Passed => HopOutcome::Passed,
            ArmOutcome::AlreadyArmed => HopOutcome::Stale,
        }
    }

    fn deliver(&mut self, task: &Task) -> HopOutcome {
        if let Some(reminder) = self.reminders.get_mut(&task.id) {
            reminder.state = ReminderState::Fired;
        }

        let body = format!(
            "{} remaining for: {}",
            lead_time_text(self.settings.lead_time()),
            task.title
        );
        let result = if self.notifier.is_authorized() {
            self.notifier
                .deliver(REMINDER_TITLE, &body)
                .map(|_| DeliveryChannel::Desktop)
        } else {
            self.notifier
                .fallback_deliver(&format!("⏰ {body}"))
                .map(|_| DeliveryChannel::Fallback)
        };

        match result {
            Ok(channel) => {
                info!(task_id = %task.id, channel = ?channel, "reminder delivered");
                HopOutcome::Delivered(channel)
            }
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "reminder delivery failed");
                HopOutcome::DeliveryFailed
            }
        }
    }
}
