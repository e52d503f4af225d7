mod common;

use common::{task, RecordingNotifier};
use monthly::models::ReminderTime;
use monthly::notify::NoopNotifier;
use monthly::reminders::{clear_reminders, load_schedule, saved_time, schedule_reminders};
use monthly::storage::FileKv;
use monthly::AppError;
use tempfile::TempDir;

fn kv() -> (TempDir, FileKv) {
    let dir = tempfile::tempdir().unwrap();
    let kv = FileKv::open(dir.path()).unwrap();
    (dir, kv)
}

fn nine() -> ReminderTime {
    ReminderTime::new(9, 0).unwrap()
}

#[test]
fn test_only_pending_tasks_get_reminders() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    let tasks = vec![
        task("a", "Rent", false),
        task("b", "Gym", true),
        task("c", "Taxes", false),
        task("d", "Vet", false),
    ];

    let schedule = schedule_reminders(&notifier, &kv, "u1", &tasks, nine(), "Task reminder").unwrap();

    assert_eq!(schedule.scheduled(), 3);
    assert!(!schedule.entries.contains_key("b"));
    let scheduled = notifier.scheduled.borrow();
    assert_eq!(scheduled.len(), 3);
    assert!(scheduled.iter().all(|(_, _, time)| *time == nine()));
    assert!(scheduled.iter().any(|(_, body, _)| body == "Don't forget: Rent"));
    assert_eq!(load_schedule(&kv, "u1").unwrap(), Some(schedule.clone()));
}

#[test]
fn test_rescheduling_replaces_previous_schedule() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();

    let first = schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", false), task("b", "B", false)], nine(), "Task reminder").unwrap();
    let a_id = first.entries["a"].notification_id.clone();
    let b_old = first.entries["b"].notification_id.clone();

    let later = ReminderTime::new(20, 30).unwrap();
    let second = schedule_reminders(&notifier, &kv, "u1", &[task("b", "B", false), task("c", "C", false)], later, "Task reminder").unwrap();

    let keys: Vec<_> = second.entries.keys().cloned().collect();
    assert_eq!(keys, vec!["b".to_string(), "c".to_string()]);
    assert_ne!(second.entries["b"].notification_id, b_old);
    let cancelled = notifier.cancelled.borrow();
    assert!(cancelled.contains(&a_id));
    assert!(cancelled.contains(&b_old));
    assert_eq!(load_schedule(&kv, "u1").unwrap().unwrap(), second);
    assert_eq!(saved_time(&kv, "u1").unwrap(), later);
}

#[test]
fn test_permission_denied_leaves_schedule_untouched() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    let existing = schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", false)], nine(), "Task reminder").unwrap();

    let mut denied = RecordingNotifier::new();
    denied.allow = false;
    let result = schedule_reminders(&denied, &kv, "u1", &[task("b", "B", false)], nine(), "Task reminder");

    assert!(matches!(result, Err(AppError::PermissionDenied)));
    assert!(denied.cancelled.borrow().is_empty());
    assert!(denied.scheduled.borrow().is_empty());
    assert_eq!(load_schedule(&kv, "u1").unwrap(), Some(existing));
}

#[test]
fn test_all_completed_is_nothing_to_schedule() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    let result = schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", true)], nine(), "Task reminder");
    assert!(matches!(result, Err(AppError::NothingToSchedule)));
    assert!(result.unwrap_err().is_informational());
    assert_eq!(load_schedule(&kv, "u1").unwrap(), None);
}

#[test]
fn test_failed_schedule_omits_only_that_task() {
    let (_dir, kv) = kv();
    let mut notifier = RecordingNotifier::new();
    notifier.fail_body = Some("Gym".into());

    let tasks = vec![task("a", "Rent", false), task("b", "Gym", false), task("c", "Vet", false)];
    let schedule = schedule_reminders(&notifier, &kv, "u1", &tasks, nine(), "Task reminder").unwrap();

    assert_eq!(schedule.scheduled(), 2);
    assert!(schedule.entries.contains_key("a"));
    assert!(!schedule.entries.contains_key("b"));
    assert!(schedule.entries.contains_key("c"));
}

#[test]
fn test_failed_cancel_does_not_block_rescheduling() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", false)], nine(), "Task reminder").unwrap();

    let mut flaky = RecordingNotifier::new();
    flaky.fail_cancel = true;
    let schedule = schedule_reminders(&flaky, &kv, "u1", &[task("b", "B", false)], nine(), "Task reminder").unwrap();

    assert_eq!(schedule.scheduled(), 1);
    assert!(schedule.entries.contains_key("b"));
    assert!(!schedule.entries.contains_key("a"));
}

#[test]
fn test_noop_platform_schedules_nothing() {
    let (_dir, kv) = kv();
    let schedule = schedule_reminders(&NoopNotifier, &kv, "u1", &[task("a", "A", false)], nine(), "Task reminder").unwrap();
    assert_eq!(schedule.scheduled(), 0);
    assert_eq!(schedule.time, nine());
}

#[test]
fn test_clear_cancels_own_entries_and_keeps_time() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    let time = ReminderTime::new(7, 45).unwrap();
    schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", false), task("b", "B", false)], time, "Task reminder").unwrap();

    let cancelled = clear_reminders(&notifier, &kv, "u1").unwrap();

    assert_eq!(cancelled, 2);
    assert_eq!(notifier.cancelled.borrow().len(), 2);
    assert_eq!(notifier.cancel_all_calls.get(), 0);
    let schedule = load_schedule(&kv, "u1").unwrap().unwrap();
    assert!(schedule.entries.is_empty());
    assert_eq!(saved_time(&kv, "u1").unwrap(), time);
}

#[test]
fn test_saved_time_defaults_to_nine() {
    let (_dir, kv) = kv();
    assert_eq!(saved_time(&kv, "u1").unwrap(), nine());
}

#[test]
fn test_schedules_are_kept_per_owner() {
    let (_dir, kv) = kv();
    let notifier = RecordingNotifier::new();
    let early = ReminderTime::new(6, 15).unwrap();
    let mine = schedule_reminders(&notifier, &kv, "u1", &[task("a", "A", false)], early, "Task reminder").unwrap();
    let mine_id = mine.entries["a"].notification_id.clone();

    assert_eq!(load_schedule(&kv, "u2").unwrap(), None);
    assert_eq!(saved_time(&kv, "u2").unwrap(), nine());

    let theirs = schedule_reminders(&notifier, &kv, "u2", &[task("b", "B", false)], nine(), "Task reminder").unwrap();
    assert!(notifier.cancelled.borrow().is_empty());

    assert_eq!(clear_reminders(&notifier, &kv, "u2").unwrap(), 1);
    let cancelled = notifier.cancelled.borrow().clone();
    assert_eq!(cancelled, vec![theirs.entries["b"].notification_id.clone()]);
    assert!(!cancelled.contains(&mine_id));
    assert_eq!(load_schedule(&kv, "u1").unwrap(), Some(mine));
    assert_eq!(saved_time(&kv, "u1").unwrap(), early);
}
