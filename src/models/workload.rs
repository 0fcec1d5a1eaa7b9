use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::TaskCategory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPeriod {
    Week,
    Month,
    Custom,
}

impl AnalysisPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPeriod::Week => "week",
            AnalysisPeriod::Month => "month",
            AnalysisPeriod::Custom => "custom",
        }
    }
}

impl fmt::Display for AnalysisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AnalysisPeriod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "week" => Ok(AnalysisPeriod::Week),
            "month" => Ok(AnalysisPeriod::Month),
            "custom" => Ok(AnalysisPeriod::Custom),
            other => Err(format!("unsupported analysis period: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadLevel {
    Light,
    Moderate,
    Heavy,
    Overloaded,
}

impl WorkloadLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadLevel::Light => "light",
            WorkloadLevel::Moderate => "moderate",
            WorkloadLevel::Heavy => "heavy",
            WorkloadLevel::Overloaded => "overloaded",
        }
    }
}

impl fmt::Display for WorkloadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkloadLevel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "light" => Ok(WorkloadLevel::Light),
            "moderate" => Ok(WorkloadLevel::Moderate),
            "heavy" => Ok(WorkloadLevel::Heavy),
            "overloaded" => Ok(WorkloadLevel::Overloaded),
            other => Err(format!("unsupported workload level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkload {
    pub date: NaiveDate,
    pub task_count: usize,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWorkload {
    pub category: TaskCategory,
    pub task_count: usize,
    pub total_minutes: i64,
    pub percentage: f64,
}

/// Derived snapshot of load across a date range. Computed on demand from the
/// task collection, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadAnalysis {
    pub period: AnalysisPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_tasks: usize,
    pub total_minutes: i64,
    pub day_count: usize,
    pub average_tasks_per_day: f64,
    pub average_minutes_per_day: f64,
    pub daily_breakdown: Vec<DayWorkload>,
    pub peak_days: Vec<DayWorkload>,
    pub light_days: Vec<DayWorkload>,
    pub category_distribution: Vec<CategoryWorkload>,
    pub workload_level: WorkloadLevel,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
