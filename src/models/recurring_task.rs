use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{
    Task, TaskCategory, TaskPriority, TaskStatus, DEFAULT_TASK_DURATION_MINUTES, DEFAULT_XP_REWARD,
};
use crate::services::calendar::{hhmm_option, hhmm_patch};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Frequency {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unsupported frequency: {other}")),
        }
    }
}

/// How a template repeats. Weekdays are indexed 0=Sunday..6=Saturday and kept
/// sorted and deduplicated by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub weekdays: Option<Vec<u8>>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrencePattern {
    pub fn daily(interval: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            interval,
            weekdays: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn weekly(mut weekdays: Vec<u8>) -> Self {
        weekdays.sort_unstable();
        weekdays.dedup();
        Self {
            frequency: Frequency::Weekly,
            interval: 1,
            weekdays: Some(weekdays),
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn monthly() -> Self {
        Self {
            frequency: Frequency::Monthly,
            interval: 1,
            weekdays: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn with_end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_max_occurrences(mut self, max_occurrences: Option<u32>) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    /// A stored interval of 0 is treated as 1 rather than rejected.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }
}

/// Abstract recurring definition. Deactivation stops further generation but
/// never deletes instances that already materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTaskTemplate {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    #[serde(with = "hhmm_option", default)]
    pub scheduled_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub xp_reward: i64,
    pub pattern: RecurrencePattern,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTaskTemplate {
    pub fn new(title: impl Into<String>, category: TaskCategory, pattern: RecurrencePattern) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            category,
            priority: TaskPriority::Medium,
            scheduled_time: None,
            duration_minutes: None,
            xp_reward: DEFAULT_XP_REWARD,
            pattern,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
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

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn update(&mut self, patch: TemplatePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(scheduled_time) = patch.scheduled_time {
            self.scheduled_time = scheduled_time;
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(xp_reward) = patch.xp_reward {
            self.xp_reward = xp_reward;
        }
        if let Some(pattern) = patch.pattern {
            self.pattern = pattern;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }

    /// Copy under a new id, titled "<title> (Copy)", active by default.
    pub fn clone_template(&self) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("{} (Copy)", self.title),
            description: self.description.clone(),
            category: self.category,
            priority: self.priority,
            scheduled_time: self.scheduled_time,
            duration_minutes: self.duration_minutes,
            xp_reward: self.xp_reward,
            pattern: self.pattern.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a template. Double-`Option` fields distinguish
/// "leave unchanged" (absent) from "clear" (null).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<TaskCategory>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, with = "hhmm_patch")]
    pub scheduled_time: Option<Option<NaiveTime>>,
    #[serde(default)]
    pub duration_minutes: Option<Option<i64>>,
    #[serde(default)]
    pub xp_reward: Option<i64>,
    #[serde(default)]
    pub pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// One concrete materialization of a template for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTaskInstance {
    pub id: String,
    pub template_id: String,
    pub instance_date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub scheduled_date: NaiveDate,
    #[serde(with = "hhmm_option", default)]
    pub scheduled_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub xp_reward: i64,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RecurringTaskInstance {
    pub fn from_template(template: &RecurringTaskTemplate, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            instance_date: date,
            title: template.title.clone(),
            description: template.description.clone(),
            category: template.category,
            priority: template.priority,
            status: TaskStatus::Pending,
            scheduled_date: date,
            scheduled_time: template.scheduled_time,
            duration_minutes: template.duration_minutes,
            xp_reward: template.xp_reward,
            is_modified: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Apply a "modify" exception and flag the instance as overridden.
    pub fn apply_override(&mut self, overrides: &InstanceOverride) {
        if let Some(title) = &overrides.title {
            self.title = title.clone();
        }
        if let Some(description) = &overrides.description {
            self.description = description.clone();
        }
        if let Some(priority) = overrides.priority {
            self.priority = priority;
        }
        if let Some(scheduled_time) = overrides.scheduled_time {
            self.scheduled_time = scheduled_time;
        }
        if let Some(duration_minutes) = overrides.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(xp_reward) = overrides.xp_reward {
            self.xp_reward = xp_reward;
        }
        self.is_modified = true;
        self.updated_at = Utc::now();
    }

    pub fn duration_or_default(&self) -> i64 {
        self.duration_minutes.unwrap_or(DEFAULT_TASK_DURATION_MINUTES)
    }

    /// View the instance as a plain task (same id, so completion maps back).
    pub fn to_task(&self) -> Task {
        Task {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            priority: self.priority,
            status: self.status,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            duration_minutes: self.duration_minutes,
            is_recurring: true,
            recurrence: None,
            xp_reward: self.xp_reward,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }
}

/// Field overrides carried by a "modify" exception. An explicit typed patch,
/// same clearable-field convention as `TemplatePatch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceOverride {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, with = "hhmm_patch")]
    pub scheduled_time: Option<Option<NaiveTime>>,
    #[serde(default)]
    pub duration_minutes: Option<Option<i64>>,
    #[serde(default)]
    pub xp_reward: Option<i64>,
}

/// Per-date override against a template's normal recurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceException {
    pub template_id: String,
    pub date: NaiveDate,
    pub action: ExceptionAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "overrides", rename_all = "lowercase")]
pub enum ExceptionAction {
    Skip,
    Modify(InstanceOverride),
}

/// Exception lookup keyed by (template id, date). Built once per generation
/// pass so the date walk stays O(1) per day.
#[derive(Debug, Default)]
pub struct ExceptionIndex {
    entries: HashMap<(String, NaiveDate), ExceptionAction>,
}

impl ExceptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries win when the same (template, date) appears twice.
    pub fn from_exceptions(exceptions: &[RecurrenceException]) -> Self {
        let mut index = Self::new();
        for exception in exceptions {
            index.insert(exception.clone());
        }
        index
    }

    pub fn insert(&mut self, exception: RecurrenceException) {
        self.entries
            .insert((exception.template_id, exception.date), exception.action);
    }

    pub fn lookup(&self, template_id: &str, date: NaiveDate) -> Option<&ExceptionAction> {
        self.entries.get(&(template_id.to_string(), date))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
