use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{Task, TaskDraft};
use crate::models::workload::WorkloadAnalysis;
use crate::services::calendar::hhmm;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistributionStrategy {
    Daily,
    Weekly,
    Custom,
}

impl DistributionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStrategy::Daily => "daily",
            DistributionStrategy::Weekly => "weekly",
            DistributionStrategy::Custom => "custom",
        }
    }
}

impl fmt::Display for DistributionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DistributionStrategy {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(DistributionStrategy::Daily),
            "weekly" => Ok(DistributionStrategy::Weekly),
            "custom" => Ok(DistributionStrategy::Custom),
            other => Err(format!("unsupported distribution strategy: {other}")),
        }
    }
}

/// Request to spread a batch of drafts across a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkTaskCreation {
    pub tasks: Vec<TaskDraft>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub distribution: DistributionStrategy,
    #[serde(default)]
    pub exclude_weekends: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Low => "low",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanningConflict {
    pub date: NaiveDate,
    pub reason: String,
    pub severity: ConflictSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadImpact {
    Minimal,
    Moderate,
    Significant,
}

impl WorkloadImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadImpact::Minimal => "minimal",
            WorkloadImpact::Moderate => "moderate",
            WorkloadImpact::Significant => "significant",
        }
    }
}

impl fmt::Display for WorkloadImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked placement option for a draft task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingSuggestion {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub suggested_time: NaiveTime,
    pub confidence: f64,
    pub workload_impact: WorkloadImpact,
    pub reason: String,
    pub alternatives: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: hm(9, 0),
            end: hm(18, 0),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Caller-tunable scheduling limits. Every field has a default so a plain
/// `{}` deserializes to the stock preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerPreferences {
    pub max_tasks_per_day: usize,
    pub max_minutes_per_day: i64,
    pub working_hours: WorkingHours,
}

impl Default for SchedulerPreferences {
    fn default() -> Self {
        Self {
            max_tasks_per_day: 6,
            max_minutes_per_day: 480,
            working_hours: WorkingHours::default(),
        }
    }
}

/// Ephemeral read-then-propose aggregate handed to the caller for approval
/// before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningPreview {
    pub id: String,
    pub tasks: Vec<Task>,
    pub analysis: WorkloadAnalysis,
    pub conflicts: Vec<PlanningConflict>,
    pub suggestions: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
