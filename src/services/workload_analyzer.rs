use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::models::task::{Task, TaskCategory};
use crate::models::workload::{
    AnalysisPeriod, CategoryWorkload, DayWorkload, WorkloadAnalysis, WorkloadLevel,
};
use crate::services::calendar;

const LIGHT_MAX_TASKS_PER_DAY: f64 = 2.0;
const LIGHT_MAX_MINUTES_PER_DAY: f64 = 120.0;
const MODERATE_MAX_TASKS_PER_DAY: f64 = 4.0;
const MODERATE_MAX_MINUTES_PER_DAY: f64 = 240.0;
const HEAVY_MAX_TASKS_PER_DAY: f64 = 6.0;
const HEAVY_MAX_MINUTES_PER_DAY: f64 = 360.0;
const PEAK_DAY_FRACTION: f64 = 0.2;
const MAX_PEAK_DAYS: usize = 3;
const DOMINANT_CATEGORY_PERCENT: f64 = 50.0;

/// Compute the full load breakdown for a date range. Pure over its inputs;
/// a zero-task period yields a light classification and a single
/// capacity-available recommendation instead of dividing by zero.
pub fn calculate_workload_analysis(
    tasks: &[Task],
    start: NaiveDate,
    end: NaiveDate,
    period: AnalysisPeriod,
) -> WorkloadAnalysis {
    let dates = calendar::date_range(start, end);
    let day_count = dates.len();

    let total_tasks = tasks.len();
    let total_minutes: i64 = tasks.iter().map(Task::duration_or_default).sum();
    let (average_tasks_per_day, average_minutes_per_day) = if day_count == 0 {
        (0.0, 0.0)
    } else {
        (
            total_tasks as f64 / day_count as f64,
            total_minutes as f64 / day_count as f64,
        )
    };

    let daily_breakdown: Vec<DayWorkload> = dates
        .iter()
        .map(|&date| {
            let mut task_count = 0;
            let mut minutes = 0;
            for task in tasks.iter().filter(|t| t.scheduled_date == date) {
                task_count += 1;
                minutes += task.duration_or_default();
            }
            DayWorkload {
                date,
                task_count,
                total_minutes: minutes,
            }
        })
        .collect();

    let (peak_days, light_days) = select_peak_and_light_days(&daily_breakdown);
    let category_distribution = calculate_category_distribution(tasks);
    let workload_level = classify_workload_level(average_tasks_per_day, average_minutes_per_day);
    let recommendations =
        generate_recommendations(workload_level, total_tasks, &category_distribution);

    debug!(
        target: "app::workload",
        total_tasks,
        total_minutes,
        day_count,
        level = %workload_level,
        "workload analysis computed"
    );

    WorkloadAnalysis {
        period,
        start_date: start,
        end_date: end,
        total_tasks,
        total_minutes,
        day_count,
        average_tasks_per_day,
        average_minutes_per_day,
        daily_breakdown,
        peak_days,
        light_days,
        category_distribution,
        workload_level,
        recommendations,
        generated_at: Utc::now(),
    }
}

/// Top and bottom `min(3, ceil(dayCount * 0.2))` days by task count. The sort
/// is stable, so tied days keep calendar order; the light list is reversed so
/// the lightest day comes first.
fn select_peak_and_light_days(daily: &[DayWorkload]) -> (Vec<DayWorkload>, Vec<DayWorkload>) {
    if daily.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let cap = ((daily.len() as f64 * PEAK_DAY_FRACTION).ceil() as usize).min(MAX_PEAK_DAYS);
    let mut sorted = daily.to_vec();
    sorted.sort_by(|a, b| b.task_count.cmp(&a.task_count));

    let peak = sorted.iter().take(cap).cloned().collect();
    let light = sorted.iter().rev().take(cap).cloned().collect();
    (peak, light)
}

/// Grouped by category in declaration order; absent categories are omitted.
fn calculate_category_distribution(tasks: &[Task]) -> Vec<CategoryWorkload> {
    let total_tasks = tasks.len();
    if total_tasks == 0 {
        return Vec::new();
    }

    let mut distribution = Vec::new();
    for category in TaskCategory::ALL {
        let mut task_count = 0;
        let mut total_minutes = 0;
        for task in tasks.iter().filter(|t| t.category == category) {
            task_count += 1;
            total_minutes += task.duration_or_default();
        }
        if task_count == 0 {
            continue;
        }
        distribution.push(CategoryWorkload {
            category,
            task_count,
            total_minutes,
            percentage: task_count as f64 / total_tasks as f64 * 100.0,
        });
    }
    distribution
}

/// Threshold table checked in order; the first row where both averages fit
/// wins, so raising either average can only move the tier upward.
fn classify_workload_level(average_tasks_per_day: f64, average_minutes_per_day: f64) -> WorkloadLevel {
    if average_tasks_per_day <= LIGHT_MAX_TASKS_PER_DAY
        && average_minutes_per_day <= LIGHT_MAX_MINUTES_PER_DAY
    {
        WorkloadLevel::Light
    } else if average_tasks_per_day <= MODERATE_MAX_TASKS_PER_DAY
        && average_minutes_per_day <= MODERATE_MAX_MINUTES_PER_DAY
    {
        WorkloadLevel::Moderate
    } else if average_tasks_per_day <= HEAVY_MAX_TASKS_PER_DAY
        && average_minutes_per_day <= HEAVY_MAX_MINUTES_PER_DAY
    {
        WorkloadLevel::Heavy
    } else {
        WorkloadLevel::Overloaded
    }
}

fn generate_recommendations(
    level: WorkloadLevel,
    total_tasks: usize,
    category_distribution: &[CategoryWorkload],
) -> Vec<String> {
    if total_tasks == 0 {
        return vec![
            "No tasks scheduled in this period; capacity available for new work".to_string(),
        ];
    }

    let mut recommendations = match level {
        WorkloadLevel::Light => vec![
            "Workload is light; capacity available for additional tasks".to_string(),
        ],
        WorkloadLevel::Moderate => vec![
            "Workload is moderate and sustainable".to_string(),
            "Keep some buffer time free for unplanned work".to_string(),
        ],
        WorkloadLevel::Heavy => vec![
            "Workload is heavy; avoid adding new tasks to this period".to_string(),
            "Consider moving lower-priority tasks to a lighter week".to_string(),
        ],
        WorkloadLevel::Overloaded => vec![
            "Workload is overloaded; reschedule or drop lower-priority tasks".to_string(),
            "Split large tasks and spread them across lighter days".to_string(),
        ],
    };

    for entry in category_distribution {
        if entry.percentage > DOMINANT_CATEGORY_PERCENT {
            recommendations.push(format!(
                "{} tasks make up {:.0}% of this period; consider rebalancing categories",
                entry.category, entry.percentage
            ));
        }
    }

    recommendations
}
