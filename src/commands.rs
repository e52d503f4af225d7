use std::path::{Path, PathBuf};

use chrono::{Local, Timelike};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::auth::{Identity, LocalIdentity};
use crate::config::Config;
use crate::error::AppError;
use crate::materialize::materialize_month;
use crate::models::{Category, Period, ReminderTime, NOTES_MAX_CHARS};
use crate::notify::{self, Notifier, SpoolNotifier};
use crate::reminders::{clear_reminders, load_schedule, saved_time, schedule_reminders};
use crate::storage::FileKv;
use crate::store::{JsonStore, Store};
use crate::tasks;

/// Collaborators wired together for one CLI invocation.
pub struct App {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Box<dyn Store>,
    pub identity: Box<dyn Identity>,
    pub notifier: Box<dyn Notifier>,
    pub kv: FileKv,
}

impl App {
    pub fn with_config(data_dir: &Path, config: Config) -> Result<Self, AppError> {
        let store = JsonStore::open(data_dir)?;
        let identity = LocalIdentity::new(data_dir, FileKv::open(data_dir)?);
        let notifier = notify::detect(&config, data_dir);
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            store: Box::new(store),
            identity: Box::new(identity),
            notifier,
            kv: FileKv::open(data_dir)?,
            config,
        })
    }

    fn owner(&self) -> Result<String, AppError> {
        self.identity.require_user()
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn cmd_signup(app: &App, email: &str, password: &str, silent: bool) -> Result<(), AppError> {
    app.identity.sign_up(email, password)?;
    if !silent { println!("Account created. Sign in with `monthly signin`."); }
    Ok(())
}

pub fn cmd_signin(app: &App, email: &str, password: &str, silent: bool) -> Result<(), AppError> {
    app.identity.sign_in(email, password)?;
    if !silent { println!("Signed in as {}.", email.trim()); }
    Ok(())
}

pub fn cmd_signout(app: &App, silent: bool) -> Result<(), AppError> {
    app.identity.sign_out()?;
    if !silent { println!("Signed out."); }
    Ok(())
}

pub fn cmd_whoami(app: &App) -> Result<(), AppError> {
    let Some(id) = app.identity.current_user_id()? else {
        println!("Not signed in.");
        return Ok(());
    };
    match app.identity.current_email()? {
        Some(email) => println!("{} ({})", email, id),
        None => println!("{}", id),
    }
    Ok(())
}

/// Adds a new task template.
pub fn cmd_template_add(app: &App, title: &str, category: Category, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let template = tasks::add_template(app.store.as_ref(), &owner, title, category)?;
    if !silent { println!("Template '{}' added (id = {}).", template.title, short_id(&template.id)); }
    Ok(())
}

/// Lists all templates of the signed-in user.
pub fn cmd_template_list(app: &App) -> Result<(), AppError> {
    let owner = app.owner()?;
    let templates = tasks::list_templates(app.store.as_ref(), &owner)?;
    if templates.is_empty() {
        println!("No templates found. Create one with `monthly template add`.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Title", "Category"]);
    for t in templates {
        table.add_row(vec![short_id(&t.id), t.title, t.category.to_string()]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_template_edit(app: &App, id: &str, title: Option<&str>, category: Option<Category>, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let id = tasks::resolve_template_id(app.store.as_ref(), &owner, id)?;
    tasks::edit_template(app.store.as_ref(), &owner, &id, title, category)?;
    if !silent { println!("Template {} updated.", short_id(&id)); }
    Ok(())
}

/// Removes a template. Tasks already generated from it are kept.
pub fn cmd_template_remove(app: &App, id: &str, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let id = tasks::resolve_template_id(app.store.as_ref(), &owner, id)?;
    tasks::remove_template(app.store.as_ref(), &owner, &id)?;
    if !silent { println!("Template {} removed.", short_id(&id)); }
    Ok(())
}

/// Generates this month's tasks from the user's templates.
pub fn cmd_generate(app: &App, period: Period, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let outcome = materialize_month(app.store.as_ref(), &owner, period)?;
    if !silent { println!("Created {} task(s) for {}.", outcome.created, period); }
    Ok(())
}

/// Lists the tasks of a month with their completion state.
pub fn cmd_list(app: &App, period: Period) -> Result<(), AppError> {
    let owner = app.owner()?;
    let tasks = tasks::list_month(app.store.as_ref(), &owner, period)?;
    let done = tasks.iter().filter(|t| t.completed).count();
    println!("{}: {} of {} completed", period, done, tasks.len());
    if tasks.is_empty() {
        println!("No tasks for this month. Run `monthly generate` to create them from your templates.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Notes").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let status = if t.completed { "Done" } else { "Pending" };
        let status_color = if t.completed { Color::Green } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.title).fg(if t.completed { Color::Grey } else { Color::Reset }),
            Cell::new(t.category),
            Cell::new(&t.notes),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Toggles a task between done and pending.
pub fn cmd_complete(app: &App, id: &str, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let id = tasks::resolve_task_id(app.store.as_ref(), &owner, id)?;
    let completed = tasks::toggle_complete(app.store.as_ref(), &owner, &id)?;
    if !silent {
        let state = if completed { "complete" } else { "pending" };
        println!("Task {} marked as {}.", short_id(&id), state);
    }
    Ok(())
}

pub fn cmd_notes(app: &App, id: &str, notes: &str, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let id = tasks::resolve_task_id(app.store.as_ref(), &owner, id)?;
    tasks::update_notes(app.store.as_ref(), &owner, &id, notes)?;
    if !silent { println!("Notes saved ({}/{} characters).", notes.chars().count(), NOTES_MAX_CHARS); }
    Ok(())
}

pub fn cmd_remove(app: &App, id: &str, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let id = tasks::resolve_task_id(app.store.as_ref(), &owner, id)?;
    tasks::remove_task(app.store.as_ref(), &owner, &id)?;
    if !silent { println!("Task {} removed.", short_id(&id)); }
    Ok(())
}

/// Schedules daily reminders for this month's pending tasks.
///
/// Uses the last chosen time when `at` is not given.
pub fn cmd_remind(app: &App, at: Option<ReminderTime>, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let time = match at {
        Some(t) => t,
        None => saved_time(&app.kv, &owner)?,
    };
    let tasks = tasks::list_month(app.store.as_ref(), &owner, Period::current())?;
    let schedule = schedule_reminders(app.notifier.as_ref(), &app.kv, &owner, &tasks, time, &app.config.notifications.title)?;
    if !silent {
        println!("Daily reminders set for {} ({} task(s)).", schedule.time, schedule.scheduled());
    }
    Ok(())
}

pub fn cmd_reminders_list(app: &App) -> Result<(), AppError> {
    let owner = app.owner()?;
    let Some(schedule) = load_schedule(&app.kv, &owner)? else {
        println!("No reminders scheduled. Default time is {}.", ReminderTime::default());
        return Ok(());
    };
    if schedule.entries.is_empty() {
        println!("No reminders scheduled. Last time used: {}.", schedule.time);
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["Task", "Title", "Notification", "Time"]);
    for (task_id, entry) in &schedule.entries {
        table.add_row(vec![
            short_id(task_id),
            entry.title.clone(),
            short_id(&entry.notification_id),
            schedule.time.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_reminders_clear(app: &App, silent: bool) -> Result<(), AppError> {
    let owner = app.owner()?;
    let cancelled = clear_reminders(app.notifier.as_ref(), &app.kv, &owner)?;
    if !silent { println!("Cancelled {} reminder(s).", cancelled); }
    Ok(())
}

/// Prints the reminders due at `at` (now by default). Meant for cron.
pub fn cmd_reminders_fire(app: &App, at: Option<ReminderTime>) -> Result<(), AppError> {
    if !app.config.notifications.enabled {
        return Ok(());
    }
    let time = match at {
        Some(t) => t,
        None => {
            let now = Local::now();
            ReminderTime::new(now.hour() as u8, now.minute() as u8)?
        }
    };
    let spool = SpoolNotifier::new(&app.data_dir, app.config.notifications.allow);
    for n in spool.due_at(time)? {
        println!("{}: {}", n.title, n.body);
    }
    Ok(())
}
