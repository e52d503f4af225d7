//! Monthly task generation.
//!
//! Materialization runs as a three-step pipeline where each step consumes the
//! previous one's output, so the store calls can only happen in order:
//! templates, then existing tasks of the period, then the insert.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{error, info};

use crate::error::AppError;
use crate::models::{MonthlyTask, Period, TaskTemplate};
use crate::store::{Filter, Store, Table};
use crate::tasks::{list_templates, to_row};

/// Outcome of a successful materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materialized {
    pub created: usize,
}

/// A non-empty set of templates belonging to one owner.
pub struct OwnedTemplates<'a> {
    owner: &'a str,
    templates: Vec<TaskTemplate>,
}

/// Templates plus the ids already represented in a period.
pub struct CoveredPeriod<'a> {
    owned: OwnedTemplates<'a>,
    period: Period,
    represented: HashSet<String>,
}

/// Instances still missing for a period. Never empty.
pub struct CreationBatch {
    tasks: Vec<MonthlyTask>,
}

impl<'a> OwnedTemplates<'a> {
    pub fn fetch(store: &dyn Store, owner: &'a str) -> Result<Self, AppError> {
        let templates = list_templates(store, owner)?;
        if templates.is_empty() {
            return Err(AppError::NoTemplates);
        }
        Ok(Self { owner, templates })
    }

    /// Reads which templates already have an instance in `period`.
    pub fn fetch_existing(self, store: &dyn Store, period: Period) -> Result<CoveredPeriod<'a>, AppError> {
        let filters = [
            Filter::eq("month", period.month()),
            Filter::eq("year", period.year()),
            Filter::eq("user_id", self.owner),
        ];
        let represented = store
            .select(Table::MonthlyTasks, &filters, None)?
            .iter()
            .filter_map(|row| row.get("task_template_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        Ok(CoveredPeriod {
            owned: self,
            period,
            represented,
        })
    }
}

impl CoveredPeriod<'_> {
    pub fn plan(self) -> Result<CreationBatch, AppError> {
        let tasks: Vec<MonthlyTask> = self
            .owned
            .templates
            .iter()
            .filter(|t| !self.represented.contains(&t.id))
            .map(|t| MonthlyTask::from_template(t, self.period))
            .collect();
        if tasks.is_empty() {
            return Err(AppError::AlreadyMaterialized);
        }
        Ok(CreationBatch { tasks })
    }
}

impl CreationBatch {
    pub fn tasks(&self) -> &[MonthlyTask] {
        &self.tasks
    }

    /// Inserts the whole batch in one call.
    pub fn insert(self, store: &dyn Store) -> Result<Materialized, AppError> {
        let created = self.tasks.len();
        let rows = self.tasks.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        store.insert(Table::MonthlyTasks, rows).inspect_err(|e| {
            error!("inserting {} monthly tasks failed: {}", created, e);
        })?;
        Ok(Materialized { created })
    }
}

/// Creates this period's task for every template that does not have one yet.
pub fn materialize_month(store: &dyn Store, owner: &str, period: Period) -> Result<Materialized, AppError> {
    let outcome = OwnedTemplates::fetch(store, owner)?
        .fetch_existing(store, period)?
        .plan()?
        .insert(store)?;
    info!(owner, created = outcome.created, %period, "materialized monthly tasks");
    Ok(outcome)
}
