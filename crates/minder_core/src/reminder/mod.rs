//! Reminder scheduling: computes when a task's reminder is due, arms it on a
//! bounded timer queue (chaining re-arm hops past the queue's limit) and
//! delivers it through a [`Notifier`](crate::notify::Notifier).

pub mod clock;
pub mod instant;
pub mod scheduler;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{
    ArmOutcome, DeliveryChannel, HopOutcome, HopReport, ReconcileReport, ReminderScheduler,
    ReminderState, ScheduledReminder,
};
pub use timer::{Hop, HopHandle, HopKind, QueuedHop, TimerQueue};

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::Duration;

pub const DEFAULT_LEAD_MINUTES: i64 = 15;
/// Largest single wait a 32-bit millisecond timer accepts (~24.8 days).
pub const DEFAULT_MAX_DELAY_MS: i64 = 2_147_483_647;
pub const DEFAULT_SAFETY_MARGIN_MS: i64 = 1_000;
/// Longest accepted lead time: one leap year.
pub const MAX_LEAD_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub lead_minutes: i64,
    pub max_delay_ms: i64,
    pub safety_margin_ms: i64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lead_minutes: DEFAULT_LEAD_MINUTES,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            safety_margin_ms: DEFAULT_SAFETY_MARGIN_MS,
        }
    }
}

impl ReminderSettings {
    pub fn lead_time(&self) -> Duration {
        Duration::minutes(self.lead_minutes)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::milliseconds(self.max_delay_ms)
    }

    /// Length of one re-arm hop.
    pub fn chain_step(&self) -> Duration {
        Duration::milliseconds(self.max_delay_ms - self.safety_margin_ms)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_LEAD_MINUTES).contains(&self.lead_minutes) {
            return Err(AppError::invalid_data(format!(
                "reminder.lead_minutes must be between 0 and {MAX_LEAD_MINUTES}"
            )));
        }
        if self.max_delay_ms <= 0 {
            return Err(AppError::invalid_data(
                "reminder.max_delay_ms must be positive",
            ));
        }
        if self.safety_margin_ms < 0 || self.safety_margin_ms >= self.max_delay_ms {
            return Err(AppError::invalid_data(
                "reminder.safety_margin_ms must be between 0 and reminder.max_delay_ms",
            ));
        }
        Ok(())
    }
}
