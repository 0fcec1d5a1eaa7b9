use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::planning::{BulkTaskCreation, ConflictSeverity, PlanningConflict};
use crate::models::task::Task;
use crate::services::calendar;

const OVERLOADED_DAY_MINUTES: i64 = 480;
const HEAVY_DAY_MINUTES: i64 = 360;
const TOO_MANY_TASKS: usize = 8;
const MANY_TASKS: usize = 6;

/// Spread a batch of drafts across the requested range. An empty filtered
/// range (all weekends excluded, or start after end) yields an empty plan
/// rather than an error.
pub fn generate_bulk_task_plan(bulk: &BulkTaskCreation) -> Vec<Task> {
    let dates: Vec<NaiveDate> = calendar::date_range(bulk.start_date, bulk.end_date)
        .into_iter()
        .filter(|&date| !(bulk.exclude_weekends && calendar::is_weekend(date)))
        .collect();
    if dates.is_empty() || bulk.tasks.is_empty() {
        return Vec::new();
    }

    let tasks: Vec<Task> = bulk
        .tasks
        .iter()
        .enumerate()
        .map(|(index, draft)| {
            let date = dates[slot_for(bulk, index, dates.len())];
            draft.to_task(date)
        })
        .collect();

    debug!(
        target: "app::planning",
        strategy = %bulk.distribution,
        tasks = tasks.len(),
        dates = dates.len(),
        "bulk task plan generated"
    );
    tasks
}

fn slot_for(bulk: &BulkTaskCreation, index: usize, date_count: usize) -> usize {
    use crate::models::planning::DistributionStrategy::*;
    match bulk.distribution {
        // Round-robin over every available date.
        Daily => index % date_count,
        // One task per weekly slot, wrapping across the available weeks.
        Weekly => {
            let week_count = date_count.div_ceil(7);
            ((index % week_count) * 7).min(date_count - 1)
        }
        // Even spread proportional to list position.
        Custom => (index * date_count / bulk.tasks.len()).min(date_count - 1),
    }
}

/// Check a merged planned + existing task set for overloaded days and time
/// overlaps. Several conflicts may be reported for the same date.
pub fn validate_planning_conflicts(planned: &[Task], existing: &[Task]) -> Vec<PlanningConflict> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in planned.iter().chain(existing) {
        by_date.entry(task.scheduled_date).or_default().push(task);
    }

    let mut conflicts = Vec::new();
    for (&date, day_tasks) in &by_date {
        let total_minutes: i64 = day_tasks.iter().map(|task| task.duration_or_default()).sum();
        if total_minutes > OVERLOADED_DAY_MINUTES {
            conflicts.push(PlanningConflict {
                date,
                reason: format!(
                    "Overloaded day: {total_minutes} minutes scheduled exceeds the {OVERLOADED_DAY_MINUTES}-minute daily limit"
                ),
                severity: ConflictSeverity::High,
            });
        } else if total_minutes > HEAVY_DAY_MINUTES {
            conflicts.push(PlanningConflict {
                date,
                reason: format!("Heavy workload: {total_minutes} minutes scheduled"),
                severity: ConflictSeverity::Medium,
            });
        }

        let task_count = day_tasks.len();
        if task_count > TOO_MANY_TASKS {
            conflicts.push(PlanningConflict {
                date,
                reason: format!("Too many tasks: {task_count} tasks on one day"),
                severity: ConflictSeverity::High,
            });
        } else if task_count > MANY_TASKS {
            conflicts.push(PlanningConflict {
                date,
                reason: format!("Many tasks: {task_count} tasks on one day"),
                severity: ConflictSeverity::Medium,
            });
        }

        conflicts.extend(detect_time_overlaps(date, day_tasks));
    }

    debug!(
        target: "app::planning",
        planned = planned.len(),
        existing = existing.len(),
        conflicts = conflicts.len(),
        "planning conflicts validated"
    );
    conflicts
}

fn detect_time_overlaps(date: NaiveDate, day_tasks: &[&Task]) -> Vec<PlanningConflict> {
    let timed: Vec<(&Task, i64, i64)> = day_tasks
        .iter()
        .filter_map(|&task| {
            task.scheduled_time.map(|time| {
                let start = calendar::minutes_from_midnight(time);
                (task, start, start + task.duration_or_default())
            })
        })
        .collect();

    let mut conflicts = Vec::new();
    for (i, &(first, first_start, first_end)) in timed.iter().enumerate() {
        for &(second, second_start, second_end) in &timed[i + 1..] {
            if calendar::minutes_overlap(first_start, first_end, second_start, second_end) {
                conflicts.push(PlanningConflict {
                    date,
                    reason: format!(
                        "Time conflict between \"{}\" and \"{}\"",
                        first.title, second.title
                    ),
                    severity: ConflictSeverity::High,
                });
            }
        }
    }
    conflicts
}
