use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Maximum length of a task's notes, in characters.
pub const NOTES_MAX_CHARS: usize = 50;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Fixed set of categories a template can belong to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Payment,
    Reminder,
    Errand,
    Purchase,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Payment => "payment",
            Category::Reminder => "reminder",
            Category::Errand => "errand",
            Category::Purchase => "purchase",
            Category::Other => "other",
        };
        f.write_str(s)
    }
}

/// A reusable task definition, not tied to any month.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Non-empty, trimmed title.
    pub title: String,
    pub category: Category,
    /// Owner of the template.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl TaskTemplate {
    pub fn new(user_id: &str, title: &str, category: Category) -> Result<Self, AppError> {
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: validate_title(title)?,
            category,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// A concrete task for one month, materialized from a template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlyTask {
    pub id: String,
    /// Template this task was materialized from, if any.
    #[serde(default)]
    pub task_template_id: Option<String>,
    pub title: String,
    /// Copied from the template at creation time; never re-synced.
    pub category: Category,
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl MonthlyTask {
    /// Builds a fresh, incomplete instance of `template` for `period`.
    pub fn from_template(template: &TaskTemplate, period: Period) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_template_id: Some(template.id.clone()),
            title: template.title.clone(),
            category: template.category,
            month: period.month,
            year: period.year,
            completed: false,
            notes: String::new(),
            user_id: template.user_id.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A validated (month, year) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    month: u32,
    year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { month, year })
    }

    /// 1-based month.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The period containing today's local date.
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            month: today.month(),
            year: today.year(),
        }
    }

    /// Current period with either component overridden.
    pub fn current_or(month: Option<u32>, year: Option<i32>) -> Result<Self, AppError> {
        let now = Self::current();
        Self::new(month.unwrap_or(now.month), year.unwrap_or(now.year))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

/// Time of day a daily reminder fires.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, AppError> {
        if hour > 23 {
            return Err(AppError::Validation(format!("hour must be 0-23, got {}", hour)));
        }
        if minute > 59 {
            return Err(AppError::Validation(format!("minute must be 0-59, got {}", minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn increment_hour(self) -> Self {
        Self { hour: (self.hour + 1) % 24, ..self }
    }

    pub fn decrement_hour(self) -> Self {
        Self { hour: (self.hour + 23) % 24, ..self }
    }

    pub fn increment_minute(self) -> Self {
        Self { minute: (self.minute + 1) % 60, ..self }
    }

    pub fn decrement_minute(self) -> Self {
        Self { minute: (self.minute + 59) % 60, ..self }
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ReminderTime {
    type Err = AppError;

    /// Parses `HH:MM` (24-hour clock).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("invalid time '{}', use HH:MM", s));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// Trims `title` and rejects it if nothing is left.
pub fn validate_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("please enter a title for the task".into()));
    }
    Ok(trimmed.to_string())
}

pub fn validate_notes(notes: &str) -> Result<(), AppError> {
    if notes.chars().count() > NOTES_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "notes cannot exceed {} characters",
            NOTES_MAX_CHARS
        )));
    }
    Ok(())
}
