use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::recurring_task::RecurrencePattern;
use crate::services::calendar::hhmm_option;

/// Fallback applied wherever a task carries no explicit duration.
pub const DEFAULT_TASK_DURATION_MINUTES: i64 = 30;

/// Flat XP default; gamification formulas live outside this crate.
pub const DEFAULT_XP_REWARD: i64 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Learning,
    Social,
    Creative,
    Maintenance,
}

impl TaskCategory {
    /// Declaration order, used for stable category breakdowns.
    pub const ALL: [TaskCategory; 7] = [
        TaskCategory::Work,
        TaskCategory::Personal,
        TaskCategory::Health,
        TaskCategory::Learning,
        TaskCategory::Social,
        TaskCategory::Creative,
        TaskCategory::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Work => "work",
            TaskCategory::Personal => "personal",
            TaskCategory::Health => "health",
            TaskCategory::Learning => "learning",
            TaskCategory::Social => "social",
            TaskCategory::Creative => "creative",
            TaskCategory::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "work" => Ok(TaskCategory::Work),
            "personal" => Ok(TaskCategory::Personal),
            "health" => Ok(TaskCategory::Health),
            "learning" => Ok(TaskCategory::Learning),
            "social" => Ok(TaskCategory::Social),
            "creative" => Ok(TaskCategory::Creative),
            "maintenance" => Ok(TaskCategory::Maintenance),
            other => Err(format!("unsupported task category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            other => Err(format!("unsupported task priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unsupported task status: {other}")),
        }
    }
}

/// A concrete scheduled task. Dates are local calendar dates; times of day
/// serialize as 24-hour `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub scheduled_date: NaiveDate,
    #[serde(with = "hhmm_option", default)]
    pub scheduled_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub is_recurring: bool,
    pub recurrence: Option<RecurrencePattern>,
    pub xp_reward: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn duration_or_default(&self) -> i64 {
        self.duration_minutes.unwrap_or(DEFAULT_TASK_DURATION_MINUTES)
    }
}

/// Input blueprint for a task that does not exist yet. Bulk planning and
/// scheduling suggestions operate on drafts before any id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    #[serde(with = "hhmm_option", default)]
    pub scheduled_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub xp_reward: Option<i64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, category: TaskCategory, priority: TaskPriority) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            priority,
            scheduled_time: None,
            duration_minutes: None,
            xp_reward: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_scheduled_time(mut self, scheduled_time: Option<NaiveTime>) -> Self {
        self.scheduled_time = scheduled_time;
        self
    }

    pub fn with_duration_minutes(mut self, duration_minutes: Option<i64>) -> Self {
        self.duration_minutes = duration_minutes;
        self
    }

    pub fn with_xp_reward(mut self, xp_reward: Option<i64>) -> Self {
        self.xp_reward = xp_reward;
        self
    }

    pub fn duration_or_default(&self) -> i64 {
        self.duration_minutes.unwrap_or(DEFAULT_TASK_DURATION_MINUTES)
    }

    /// Materialize a pending task on the given date with a fresh id.
    pub fn to_task(&self, date: NaiveDate) -> Task {
        let now = Utc::now();
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            priority: self.priority,
            status: TaskStatus::Pending,
            scheduled_date: date,
            scheduled_time: self.scheduled_time,
            duration_minutes: self.duration_minutes,
            is_recurring: false,
            recurrence: None,
            xp_reward: self.xp_reward.unwrap_or(DEFAULT_XP_REWARD),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}
