use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{Task, TaskCategory, TaskPriority, TaskStatus, DEFAULT_XP_REWARD};
use crate::services::calendar::hhmm_option;

/// Reusable one-shot task blueprint for quick creation. Distinct from
/// `RecurringTaskTemplate`: instantiating never schedules repeats, it just
/// stamps out a single task and bumps the usage counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    #[serde(with = "hhmm_option", default)]
    pub scheduled_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub xp_reward: i64,
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        category: TaskCategory,
        priority: TaskPriority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            title: title.into(),
            description: None,
            category,
            priority,
            scheduled_time: None,
            duration_minutes: None,
            xp_reward: DEFAULT_XP_REWARD,
            usage_count: 0,
            created_at: now,
            updated_at: now,
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

    pub fn with_xp_reward(mut self, xp_reward: i64) -> Self {
        self.xp_reward = xp_reward;
        self
    }

    /// Stamp out a pending task on the given date. The caller records usage
    /// through `record_usage` so the counter only moves when the task is kept.
    pub fn instantiate(&self, date: NaiveDate) -> Task {
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
            xp_reward: self.xp_reward,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn record_usage(&mut self) {
        self.usage_count += 1;
        self.updated_at = Utc::now();
    }
}
