use chrono::NaiveDateTime;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::expiry;
use crate::models::Settings;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Reminder store error: {0}")]
    Store(#[from] DatabaseError),
}

pub const REMINDER_TITLE: &str = "Expiry reminder";

/// Boundary to the local reminder subsystem.
///
/// `schedule` returns `Ok(None)` when the subsystem is unavailable (user
/// disabled it, permission withheld) — reminder absence is never fatal to
/// the save path. `cancel` of a missing or already-fired handle is a
/// no-op.
pub trait ReminderScheduler {
    fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: NaiveDateTime,
    ) -> Result<Option<String>, NotifyError>;

    fn cancel(&self, handle: &str) -> Result<(), NotifyError>;
}

/// Scheduler backed by the store's reminder queue; `validade remind`
/// (typically run from cron) delivers whatever has come due.
pub struct QueueScheduler<'a> {
    db: &'a Database,
    enabled: bool,
}

impl<'a> QueueScheduler<'a> {
    pub fn new(db: &'a Database, enabled: bool) -> Self {
        Self { db, enabled }
    }
}

impl ReminderScheduler for QueueScheduler<'_> {
    fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: NaiveDateTime,
    ) -> Result<Option<String>, NotifyError> {
        if !self.enabled {
            return Ok(None);
        }
        let id = self.db.insert_reminder(title, body, fire_at)?;
        Ok(Some(id.to_string()))
    }

    fn cancel(&self, handle: &str) -> Result<(), NotifyError> {
        // a handle that is not a queue id cannot name a live reminder
        let Ok(id) = handle.parse::<i64>() else {
            return Ok(());
        };
        self.db.delete_reminder(id)?;
        Ok(())
    }
}

/// Compute the trigger for a product's expiry and queue a reminder for it.
/// Returns the new handle, or `None` when no reminder applies (trigger in
/// the past, unreadable date, subsystem unavailable) or scheduling failed —
/// the caller proceeds either way.
pub fn schedule_expiry_reminder(
    scheduler: &dyn ReminderScheduler,
    product_name: &str,
    expiry_date: &str,
    settings: &Settings,
    now: NaiveDateTime,
) -> Option<String> {
    let trigger = expiry::compute_trigger_str(
        expiry_date,
        settings.lead_days,
        settings.alert_hour,
        settings.alert_minute,
        now,
    )?;

    let body = format!(
        "'{}' expires in {} day(s) ({})",
        product_name, settings.lead_days, expiry_date
    );
    match scheduler.schedule(REMINDER_TITLE, &body, trigger) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("failed to schedule reminder for '{product_name}': {e}");
            None
        }
    }
}

/// Cancel-then-reschedule, in that order, so an edited or re-saved record
/// never leaves an orphaned reminder behind.
pub fn replace_reminder(
    scheduler: &dyn ReminderScheduler,
    old_handle: Option<&str>,
    product_name: &str,
    expiry_date: &str,
    settings: &Settings,
    now: NaiveDateTime,
) -> Option<String> {
    if let Some(handle) = old_handle {
        if let Err(e) = scheduler.cancel(handle) {
            tracing::warn!("failed to cancel reminder {handle}: {e}");
        }
    }
    schedule_expiry_reminder(scheduler, product_name, expiry_date, settings, now)
}
