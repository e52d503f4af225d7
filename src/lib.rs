pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod materialize;
pub mod models;
pub mod notify;
pub mod reminders;
pub mod storage;
pub mod store;
pub mod tasks;

pub use error::AppError;
