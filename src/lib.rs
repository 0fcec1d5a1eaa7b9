//! Recurrence and planning engine for the QuestPlan task manager.
//!
//! The crate materializes recurring-task templates into concrete instances,
//! analyzes workload across date ranges, scores scheduling suggestions, and
//! spreads bulk task batches over a date range with conflict detection. All
//! core computation is pure over in-memory collections; persistence goes
//! through the [`db::KvStore`] boundary.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
