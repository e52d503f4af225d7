use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AppError;

/// A stored row: a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// Tables known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    TaskTemplates,
    MonthlyTasks,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::TaskTemplates => "task_templates",
            Table::MonthlyTasks => "monthly_tasks",
        }
    }
}

/// Equality predicate on a named field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.field) == Some(&self.value)
    }
}

/// Filtered CRUD over named tables.
///
/// `insert` must be all-or-nothing for the whole batch.
pub trait Store {
    fn select(&self, table: Table, filters: &[Filter], order_by: Option<&str>) -> Result<Vec<Row>, AppError>;

    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<(), AppError>;

    /// Merges `patch` into every matching row and returns how many matched.
    fn update(&self, table: Table, patch: &Row, filters: &[Filter]) -> Result<usize, AppError>;

    fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, AppError>;
}

/// Store keeping one JSON array per table inside a directory.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| AppError::Store(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn table_path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.json", table.name()))
    }

    fn load(&self, table: Table) -> Result<Vec<Row>, AppError> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&path).map_err(|e| store_err(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| store_err(&path, e))
    }

    fn save(&self, table: Table, rows: &[Row]) -> Result<(), AppError> {
        let path = self.table_path(table);
        let bytes = serde_json::to_vec_pretty(rows).map_err(|e| store_err(&path, e))?;
        write_atomic(&path, &bytes).map_err(|e| store_err(&path, e))
    }
}

impl Store for JsonStore {
    fn select(&self, table: Table, filters: &[Filter], order_by: Option<&str>) -> Result<Vec<Row>, AppError> {
        let mut rows: Vec<Row> = self
            .load(table)?
            .into_iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .collect();
        if let Some(field) = order_by {
            rows.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }
        debug!(table = table.name(), rows = rows.len(), "select");
        Ok(rows)
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<(), AppError> {
        let mut all = self.load(table)?;
        let mut ids: HashSet<String> = all
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
            .collect();
        for row in &rows {
            match row.get("id").and_then(Value::as_str) {
                Some(id) if !ids.insert(id.to_string()) => {
                    return Err(AppError::Store(format!("duplicate id {} in {}", id, table.name())));
                }
                Some(_) => {}
                None => return Err(AppError::Store(format!("row without id in {}", table.name()))),
            }
        }
        debug!(table = table.name(), rows = rows.len(), "insert");
        all.extend(rows);
        self.save(table, &all)
    }

    fn update(&self, table: Table, patch: &Row, filters: &[Filter]) -> Result<usize, AppError> {
        let mut all = self.load(table)?;
        let mut affected = 0;
        for row in all.iter_mut().filter(|row| filters.iter().all(|f| f.matches(row))) {
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
            affected += 1;
        }
        debug!(table = table.name(), affected, "update");
        if affected > 0 {
            self.save(table, &all)?;
        }
        Ok(affected)
    }

    fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, AppError> {
        let mut all = self.load(table)?;
        let before = all.len();
        all.retain(|row| !filters.iter().all(|f| f.matches(row)));
        let affected = before - all.len();
        debug!(table = table.name(), affected, "delete");
        if affected > 0 {
            self.save(table, &all)?;
        }
        Ok(affected)
    }
}

fn store_err(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::Store(format!("{}: {}", path.display(), e))
}

/// Writes to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Orders numbers numerically, RFC 3339 timestamps chronologically and other
/// strings lexically. Missing or null values sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
