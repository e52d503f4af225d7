use thiserror::Error;

/// Top-level error type for the monthly checklist.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any I/O was attempted.
    #[error("{0}")]
    Validation(String),

    /// Materialization found no templates for the owner.
    #[error("no templates yet, create one with `monthly template add` first")]
    NoTemplates,

    /// Every template already has an instance for the period.
    #[error("tasks for this month already exist for all of your templates")]
    AlreadyMaterialized,

    /// Reminder scheduling found no pending tasks.
    #[error("no pending tasks to remind you about")]
    NothingToSchedule,

    /// The notification platform refused permission.
    #[error("notification permission denied, set `notifications.allow = true` in config.toml to enable reminders")]
    PermissionDenied,

    /// An owner-scoped operation was attempted without a session.
    #[error("not signed in, run `monthly signin` first")]
    NotSignedIn,

    /// Identity provider rejected the request.
    #[error("{0}")]
    Auth(String),

    /// Persistent store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Notification platform failure.
    #[error("platform error: {0}")]
    Platform(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Expected empty-set outcomes that are reported as information, not failure.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            AppError::NoTemplates | AppError::AlreadyMaterialized | AppError::NothingToSchedule
        )
    }
}
