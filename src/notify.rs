use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::models::ReminderTime;
use crate::store::write_atomic;

/// Local notification platform.
///
/// Platforms without notification support implement every call as a no-op
/// with a neutral result instead of failing.
pub trait Notifier {
    /// Human-readable platform name.
    fn name(&self) -> &str;

    fn request_permissions(&self) -> bool;

    /// Schedules a notification repeating every day at `time`.
    ///
    /// Returns `None` when the platform cannot schedule anything.
    fn schedule_repeating_daily(&self, title: &str, body: &str, time: ReminderTime) -> Result<Option<String>, AppError>;

    fn cancel(&self, notification_id: &str) -> Result<(), AppError>;

    fn cancel_all(&self) -> Result<(), AppError>;
}

/// Selects the platform once at startup.
pub fn detect(config: &Config, data_dir: &Path) -> Box<dyn Notifier> {
    if config.notifications.enabled {
        info!("notifications: spool at {}", data_dir.display());
        Box::new(SpoolNotifier::new(data_dir, config.notifications.allow))
    } else {
        info!("notifications disabled, using no-op platform");
        Box::new(NoopNotifier)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    fn request_permissions(&self) -> bool {
        true
    }

    fn schedule_repeating_daily(&self, _title: &str, _body: &str, _time: ReminderTime) -> Result<Option<String>, AppError> {
        Ok(None)
    }

    fn cancel(&self, _notification_id: &str) -> Result<(), AppError> {
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// A scheduled notification as recorded by the spool platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpooledNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub time: ReminderTime,
    pub scheduled_at: DateTime<Utc>,
}

/// Device-local platform that records schedules in `notifications.json`.
///
/// Delivery happens out of process: `monthly reminders fire` prints what is
/// due and is meant to be run by cron every minute.
pub struct SpoolNotifier {
    path: PathBuf,
    allow: bool,
}

impl SpoolNotifier {
    pub fn new(dir: &Path, allow: bool) -> Self {
        Self {
            path: dir.join("notifications.json"),
            allow,
        }
    }

    pub fn pending(&self) -> Result<Vec<SpooledNotification>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path).map_err(|e| self.platform_err(e))?;
        serde_json::from_slice(&bytes).map_err(|e| self.platform_err(e))
    }

    /// Notifications that fire at `time`.
    pub fn due_at(&self, time: ReminderTime) -> Result<Vec<SpooledNotification>, AppError> {
        Ok(self.pending()?.into_iter().filter(|n| n.time == time).collect())
    }

    fn save(&self, spool: &[SpooledNotification]) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.platform_err(e))?;
        }
        let bytes = serde_json::to_vec_pretty(spool).map_err(|e| self.platform_err(e))?;
        write_atomic(&self.path, &bytes).map_err(|e| self.platform_err(e))
    }

    fn platform_err(&self, e: impl std::fmt::Display) -> AppError {
        AppError::Platform(format!("{}: {}", self.path.display(), e))
    }
}

impl Notifier for SpoolNotifier {
    fn name(&self) -> &str {
        "spool"
    }

    fn request_permissions(&self) -> bool {
        self.allow
    }

    fn schedule_repeating_daily(&self, title: &str, body: &str, time: ReminderTime) -> Result<Option<String>, AppError> {
        let mut spool = self.pending()?;
        let id = uuid::Uuid::new_v4().to_string();
        spool.push(SpooledNotification {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            time,
            scheduled_at: Utc::now(),
        });
        self.save(&spool)?;
        debug!(%id, %time, "scheduled daily notification");
        Ok(Some(id))
    }

    fn cancel(&self, notification_id: &str) -> Result<(), AppError> {
        let mut spool = self.pending()?;
        let before = spool.len();
        spool.retain(|n| n.id != notification_id);
        if spool.len() == before {
            return Err(AppError::Platform(format!("no scheduled notification {}", notification_id)));
        }
        self.save(&spool)
    }

    fn cancel_all(&self) -> Result<(), AppError> {
        self.save(&[])
    }
}
