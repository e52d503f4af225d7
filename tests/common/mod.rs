#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use chrono::Utc;
use monthly::models::{Category, MonthlyTask, ReminderTime};
use monthly::notify::Notifier;
use monthly::store::{Filter, JsonStore, Row, Store, Table};
use monthly::AppError;

/// JsonStore wrapper that counts inserts and can be told to fail them.
pub struct CountingStore {
    pub inner: JsonStore,
    pub inserts: Cell<usize>,
    pub fail_insert: Cell<bool>,
}

impl CountingStore {
    pub fn new(inner: JsonStore) -> Self {
        Self {
            inner,
            inserts: Cell::new(0),
            fail_insert: Cell::new(false),
        }
    }
}

impl Store for CountingStore {
    fn select(&self, table: Table, filters: &[Filter], order_by: Option<&str>) -> Result<Vec<Row>, AppError> {
        self.inner.select(table, filters, order_by)
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<(), AppError> {
        self.inserts.set(self.inserts.get() + 1);
        if self.fail_insert.get() {
            return Err(AppError::Store("connection reset".into()));
        }
        self.inner.insert(table, rows)
    }

    fn update(&self, table: Table, patch: &Row, filters: &[Filter]) -> Result<usize, AppError> {
        self.inner.update(table, patch, filters)
    }

    fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, AppError> {
        self.inner.delete(table, filters)
    }
}

/// Notifier that records every call and hands out sequential ids.
pub struct RecordingNotifier {
    pub allow: bool,
    /// Bodies containing this text fail to schedule.
    pub fail_body: Option<String>,
    pub fail_cancel: bool,
    pub next_id: Cell<usize>,
    pub scheduled: RefCell<Vec<(String, String, ReminderTime)>>,
    pub cancelled: RefCell<Vec<String>>,
    pub cancel_all_calls: Cell<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            allow: true,
            fail_body: None,
            fail_cancel: false,
            next_id: Cell::new(0),
            scheduled: RefCell::new(Vec::new()),
            cancelled: RefCell::new(Vec::new()),
            cancel_all_calls: Cell::new(0),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn request_permissions(&self) -> bool {
        self.allow
    }

    fn schedule_repeating_daily(&self, _title: &str, body: &str, time: ReminderTime) -> Result<Option<String>, AppError> {
        if let Some(bad) = &self.fail_body {
            if body.contains(bad.as_str()) {
                return Err(AppError::Platform("quota exceeded".into()));
            }
        }
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = format!("n{}", n);
        self.scheduled.borrow_mut().push((id.clone(), body.to_string(), time));
        Ok(Some(id))
    }

    fn cancel(&self, notification_id: &str) -> Result<(), AppError> {
        if self.fail_cancel {
            return Err(AppError::Platform("busy".into()));
        }
        self.cancelled.borrow_mut().push(notification_id.to_string());
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), AppError> {
        self.cancel_all_calls.set(self.cancel_all_calls.get() + 1);
        Ok(())
    }
}

pub fn task(id: &str, title: &str, completed: bool) -> MonthlyTask {
    MonthlyTask {
        id: id.to_string(),
        task_template_id: Some(format!("tmpl-{}", id)),
        title: title.to_string(),
        category: Category::Reminder,
        month: 3,
        year: 2025,
        completed,
        notes: String::new(),
        user_id: "u1".to_string(),
        created_at: Utc::now(),
    }
}
