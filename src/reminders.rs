//! Daily reminder lifecycle: cancel the previous schedule, schedule one
//! repeating notification per pending task, and persist the id mapping so the
//! next run can cancel it again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{MonthlyTask, ReminderTime};
use crate::notify::Notifier;
use crate::storage::KeyValueStore;

const SCHEDULE_KEY_PREFIX: &str = "reminder_schedule";

fn schedule_key(owner: &str) -> String {
    format!("{}:{}", SCHEDULE_KEY_PREFIX, owner)
}

/// One scheduled reminder, keyed by task id in [`ReminderSchedule`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduledReminder {
    pub notification_id: String,
    /// Task title at scheduling time.
    pub title: String,
}

/// The active reminder schedule. Always replaced as a whole.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ReminderSchedule {
    pub time: ReminderTime,
    #[serde(default)]
    pub entries: BTreeMap<String, ScheduledReminder>,
}

impl ReminderSchedule {
    pub fn scheduled(&self) -> usize {
        self.entries.len()
    }
}

/// Reads `owner`'s persisted schedule, if any.
pub fn load_schedule(kv: &dyn KeyValueStore, owner: &str) -> Result<Option<ReminderSchedule>, AppError> {
    match kv.get(&schedule_key(owner))? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn save_schedule(kv: &dyn KeyValueStore, owner: &str, schedule: &ReminderSchedule) -> Result<(), AppError> {
    kv.set(&schedule_key(owner), &serde_json::to_string(schedule)?)
}

/// `owner`'s last chosen reminder time, 09:00 if none was ever saved.
pub fn saved_time(kv: &dyn KeyValueStore, owner: &str) -> Result<ReminderTime, AppError> {
    Ok(load_schedule(kv, owner)?.map(|s| s.time).unwrap_or_default())
}

/// Cancels every notification in `schedule`, logging and skipping failures.
fn cancel_entries(notifier: &dyn Notifier, schedule: &ReminderSchedule) {
    for (task_id, entry) in &schedule.entries {
        if let Err(e) = notifier.cancel(&entry.notification_id) {
            warn!(task_id = %task_id, notification_id = %entry.notification_id, "cancel failed: {}", e);
        }
    }
}

/// Replaces `owner`'s schedule with one daily reminder per pending task.
///
/// Scheduling is best-effort per task: a task whose notification cannot be
/// scheduled is left out of the returned schedule.
pub fn schedule_reminders(
    notifier: &dyn Notifier,
    kv: &dyn KeyValueStore,
    owner: &str,
    tasks: &[MonthlyTask],
    time: ReminderTime,
    title: &str,
) -> Result<ReminderSchedule, AppError> {
    if !notifier.request_permissions() {
        return Err(AppError::PermissionDenied);
    }

    let pending: Vec<&MonthlyTask> = tasks.iter().filter(|t| !t.completed).collect();
    if pending.is_empty() {
        return Err(AppError::NothingToSchedule);
    }

    if let Some(previous) = load_schedule(kv, owner)? {
        cancel_entries(notifier, &previous);
    }
    kv.remove(&schedule_key(owner))?;

    let mut entries = BTreeMap::new();
    for task in pending {
        let body = format!("Don't forget: {}", task.title);
        match notifier.schedule_repeating_daily(title, &body, time) {
            Ok(Some(notification_id)) => {
                entries.insert(
                    task.id.clone(),
                    ScheduledReminder {
                        notification_id,
                        title: task.title.clone(),
                    },
                );
            }
            Ok(None) => {
                info!(task_id = %task.id, platform = notifier.name(), "platform scheduled nothing");
            }
            Err(e) => {
                warn!(task_id = %task.id, "schedule failed: {}", e);
            }
        }
    }

    let schedule = ReminderSchedule { time, entries };
    save_schedule(kv, owner, &schedule)?;
    info!(owner, scheduled = schedule.scheduled(), %time, "reminders scheduled");
    Ok(schedule)
}

/// Cancels `owner`'s reminders and persists an empty schedule keeping the
/// last time. Other owners' reminders on the device are left alone.
pub fn clear_reminders(notifier: &dyn Notifier, kv: &dyn KeyValueStore, owner: &str) -> Result<usize, AppError> {
    let previous = load_schedule(kv, owner)?.unwrap_or_default();
    cancel_entries(notifier, &previous);
    save_schedule(
        kv,
        owner,
        &ReminderSchedule {
            time: previous.time,
            entries: BTreeMap::new(),
        },
    )?;
    info!(owner, cancelled = previous.scheduled(), "reminders cleared");
    Ok(previous.scheduled())
}
