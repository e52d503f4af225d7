use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{validate_notes, validate_title, Category, MonthlyTask, Period, TaskTemplate};
use crate::store::{Filter, Row, Store, Table};

pub(crate) fn to_row<T: Serialize>(value: &T) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Store(format!("expected an object row, got {}", other))),
    }
}

pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, AppError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(AppError::from))
        .collect()
}

fn patch(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn owned(owner: &str, id: &str) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner)]
}

fn expect_one(affected: usize, what: &str, id: &str) -> Result<(), AppError> {
    if affected == 0 {
        return Err(AppError::Validation(format!("{} {} not found", what, id)));
    }
    Ok(())
}

/// Finds the single id among `ids` starting with `prefix`.
fn resolve<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str, what: &str) -> Result<String, AppError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(AppError::Validation(format!("please give a {} id", what)));
    }
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Err(AppError::Validation(format!("no {} matches '{}'", what, prefix))),
        _ => Err(AppError::Validation(format!("{} id '{}' is ambiguous", what, prefix))),
    }
}

/// All templates of `owner`, oldest first.
pub fn list_templates(store: &dyn Store, owner: &str) -> Result<Vec<TaskTemplate>, AppError> {
    let rows = store.select(Table::TaskTemplates, &[Filter::eq("user_id", owner)], Some("created_at"))?;
    from_rows(rows)
}

pub fn add_template(store: &dyn Store, owner: &str, title: &str, category: Category) -> Result<TaskTemplate, AppError> {
    let template = TaskTemplate::new(owner, title, category)?;
    store.insert(Table::TaskTemplates, vec![to_row(&template)?])?;
    Ok(template)
}

/// Updates title and/or category. Existing monthly tasks keep their copies.
pub fn edit_template(
    store: &dyn Store,
    owner: &str,
    id: &str,
    title: Option<&str>,
    category: Option<Category>,
) -> Result<(), AppError> {
    let mut changes = Row::new();
    if let Some(t) = title {
        changes.insert("title".into(), Value::String(validate_title(t)?));
    }
    if let Some(c) = category {
        changes.insert("category".into(), serde_json::to_value(c)?);
    }
    if changes.is_empty() {
        return Err(AppError::Validation("nothing to change".into()));
    }
    let affected = store.update(Table::TaskTemplates, &changes, &owned(owner, id))?;
    expect_one(affected, "template", id)
}

pub fn remove_template(store: &dyn Store, owner: &str, id: &str) -> Result<(), AppError> {
    let affected = store.delete(Table::TaskTemplates, &owned(owner, id))?;
    expect_one(affected, "template", id)
}

pub fn resolve_template_id(store: &dyn Store, owner: &str, prefix: &str) -> Result<String, AppError> {
    let templates = list_templates(store, owner)?;
    resolve(templates.iter().map(|t| t.id.as_str()), prefix, "template")
}

/// Monthly tasks of `owner` for `period`, oldest first.
pub fn list_month(store: &dyn Store, owner: &str, period: Period) -> Result<Vec<MonthlyTask>, AppError> {
    let filters = [
        Filter::eq("month", period.month()),
        Filter::eq("year", period.year()),
        Filter::eq("user_id", owner),
    ];
    let rows = store.select(Table::MonthlyTasks, &filters, Some("created_at"))?;
    from_rows(rows)
}

fn load_task(store: &dyn Store, owner: &str, id: &str) -> Result<MonthlyTask, AppError> {
    let rows = store.select(Table::MonthlyTasks, &owned(owner, id), None)?;
    from_rows::<MonthlyTask>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation(format!("task {} not found", id)))
}

/// Flips the completed flag and returns the new value.
pub fn toggle_complete(store: &dyn Store, owner: &str, id: &str) -> Result<bool, AppError> {
    let task = load_task(store, owner, id)?;
    let completed = !task.completed;
    let affected = store.update(Table::MonthlyTasks, &patch(json!({ "completed": completed })), &owned(owner, id))?;
    expect_one(affected, "task", id)?;
    Ok(completed)
}

pub fn update_notes(store: &dyn Store, owner: &str, id: &str, notes: &str) -> Result<(), AppError> {
    validate_notes(notes)?;
    let affected = store.update(Table::MonthlyTasks, &patch(json!({ "notes": notes })), &owned(owner, id))?;
    expect_one(affected, "task", id)
}

pub fn remove_task(store: &dyn Store, owner: &str, id: &str) -> Result<(), AppError> {
    let affected = store.delete(Table::MonthlyTasks, &owned(owner, id))?;
    expect_one(affected, "task", id)
}

/// Resolves a task id prefix among all of `owner`'s tasks, any month.
pub fn resolve_task_id(store: &dyn Store, owner: &str, prefix: &str) -> Result<String, AppError> {
    let rows = store.select(Table::MonthlyTasks, &[Filter::eq("user_id", owner)], None)?;
    let ids: Vec<String> = rows
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
        .collect();
    resolve(ids.iter().map(String::as_str), prefix, "task")
}
