use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::models::planning::{
    SchedulerPreferences, SchedulingSuggestion, WorkingHours, WorkloadImpact,
};
use crate::models::task::{Task, TaskCategory, TaskDraft};
use crate::services::calendar;

const MIN_VIABLE_CONFIDENCE: f64 = 0.3;
const MAX_SUGGESTIONS: usize = 5;
const MAX_ALTERNATIVES: usize = 3;
const SLOT_BUFFER_MINUTES: i64 = 15;
const NEAR_CAPACITY_RATIO: f64 = 0.8;
const TASK_CAP_PENALTY: f64 = 0.3;
const TASK_NEAR_CAP_PENALTY: f64 = 0.6;
const MINUTE_CAP_PENALTY: f64 = 0.2;
const MINUTE_NEAR_CAP_PENALTY: f64 = 0.7;
const AFFINITY_BOOST: f64 = 1.2;
const MINIMAL_IMPACT_RATIO: f64 = 0.5;
const MODERATE_IMPACT_RATIO: f64 = 0.8;

/// Rank candidate dates for a draft task. Work-category drafts never land on
/// weekends; candidates at or below the viability floor are dropped entirely,
/// and the top five survivors come back with alternative dates attached.
pub fn generate_scheduling_suggestions(
    draft: &TaskDraft,
    existing_tasks: &[Task],
    start: NaiveDate,
    end: NaiveDate,
    preferences: &SchedulerPreferences,
) -> Vec<SchedulingSuggestion> {
    let mut candidates: Vec<SchedulingSuggestion> = Vec::new();

    for date in calendar::date_range(start, end) {
        if draft.category == TaskCategory::Work && calendar::is_weekend(date) {
            continue;
        }

        let day_tasks: Vec<&Task> = existing_tasks
            .iter()
            .filter(|task| task.scheduled_date == date)
            .collect();
        let day_task_count = day_tasks.len();
        let day_minutes: i64 = day_tasks.iter().map(|task| task.duration_or_default()).sum();
        let same_category_count = day_tasks
            .iter()
            .filter(|task| task.category == draft.category)
            .count();

        let confidence =
            estimate_confidence(day_task_count, day_minutes, same_category_count, preferences);
        if confidence <= MIN_VIABLE_CONFIDENCE {
            continue;
        }

        let projected_minutes = day_minutes + draft.duration_or_default();
        candidates.push(SchedulingSuggestion {
            date,
            suggested_time: find_best_time_slot(&day_tasks, draft, &preferences.working_hours),
            confidence,
            workload_impact: classify_impact(projected_minutes, preferences.max_minutes_per_day),
            reason: derive_reason(day_task_count, same_category_count),
            alternatives: Vec::new(),
        });
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let survivor_dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();
    candidates.truncate(MAX_SUGGESTIONS);
    for suggestion in candidates.iter_mut() {
        suggestion.alternatives = survivor_dates
            .iter()
            .filter(|&&date| date != suggestion.date)
            .take(MAX_ALTERNATIVES)
            .copied()
            .collect();
    }

    debug!(
        target: "app::planning",
        draft = %draft.title,
        count = candidates.len(),
        "scheduling suggestions generated"
    );
    candidates
}

/// Multiplicative confidence score starting at 1.0. Capacity penalties and
/// the category-affinity boost compose; the result is a ranking score, not a
/// probability, so the boost may push it past 1.0.
fn estimate_confidence(
    day_task_count: usize,
    day_minutes: i64,
    same_category_count: usize,
    preferences: &SchedulerPreferences,
) -> f64 {
    let mut confidence = 1.0;

    let task_cap = preferences.max_tasks_per_day;
    if day_task_count >= task_cap {
        confidence *= TASK_CAP_PENALTY;
    } else if day_task_count as f64 >= task_cap as f64 * NEAR_CAPACITY_RATIO {
        confidence *= TASK_NEAR_CAP_PENALTY;
    }

    let minute_cap = preferences.max_minutes_per_day;
    if day_minutes >= minute_cap {
        confidence *= MINUTE_CAP_PENALTY;
    } else if day_minutes as f64 >= minute_cap as f64 * NEAR_CAPACITY_RATIO {
        confidence *= MINUTE_NEAR_CAP_PENALTY;
    }

    if (1..=2).contains(&same_category_count) {
        confidence *= AFFINITY_BOOST;
    }

    confidence
}

fn classify_impact(projected_minutes: i64, max_minutes_per_day: i64) -> WorkloadImpact {
    let ratio = projected_minutes as f64 / max_minutes_per_day as f64;
    if ratio <= MINIMAL_IMPACT_RATIO {
        WorkloadImpact::Minimal
    } else if ratio <= MODERATE_IMPACT_RATIO {
        WorkloadImpact::Moderate
    } else {
        WorkloadImpact::Significant
    }
}

fn derive_reason(day_task_count: usize, same_category_count: usize) -> String {
    if day_task_count == 0 {
        "Empty day with no scheduled tasks".to_string()
    } else if (1..=2).contains(&same_category_count) {
        "Groups well with similar tasks already scheduled".to_string()
    } else if day_task_count <= 2 {
        "Light day with few scheduled tasks".to_string()
    } else {
        "Available slot within daily capacity".to_string()
    }
}

/// Pick a start time within working hours. A time on the draft always wins.
/// Otherwise the day's timed tasks are scanned for the first gap that fits
/// the draft plus a 15-minute buffer; failing that, the slot after the last
/// task is used when it still fits the working window, else the day start.
pub fn find_best_time_slot(
    day_tasks: &[&Task],
    draft: &TaskDraft,
    working_hours: &WorkingHours,
) -> NaiveTime {
    if let Some(time) = draft.scheduled_time {
        return time;
    }

    let work_end = calendar::minutes_from_midnight(working_hours.end);
    let duration = draft.duration_or_default();

    let mut timed: Vec<(i64, i64)> = day_tasks
        .iter()
        .filter_map(|task| {
            task.scheduled_time.map(|time| {
                let start = calendar::minutes_from_midnight(time);
                (start, start + task.duration_or_default())
            })
        })
        .collect();

    if timed.is_empty() {
        return working_hours.start;
    }
    timed.sort_by_key(|&(start, _)| start);

    for pair in timed.windows(2) {
        let gap_start = pair[0].1;
        let gap_end = pair[1].0;
        if gap_end - gap_start >= duration + SLOT_BUFFER_MINUTES {
            return calendar::time_from_minutes(gap_start + SLOT_BUFFER_MINUTES);
        }
    }

    let last_end = timed.last().map(|&(_, end)| end).unwrap_or(0);
    let candidate = last_end + SLOT_BUFFER_MINUTES;
    if candidate + duration <= work_end {
        calendar::time_from_minutes(candidate)
    } else {
        working_hours.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn task_on(
        date: NaiveDate,
        category: TaskCategory,
        at: Option<NaiveTime>,
        minutes: Option<i64>,
    ) -> Task {
        TaskDraft::new("Existing", category, TaskPriority::Medium)
            .with_scheduled_time(at)
            .with_duration_minutes(minutes)
            .to_task(date)
    }

    #[test]
    fn work_drafts_skip_weekends() {
        let draft = TaskDraft::new("Quarterly report", TaskCategory::Work, TaskPriority::High);
        // 2026-03-06 is a Friday; the range runs through Monday.
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &[],
            date(2026, 3, 6),
            date(2026, 3, 9),
            &SchedulerPreferences::default(),
        );

        let dates: Vec<NaiveDate> = suggestions.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2026, 3, 6), date(2026, 3, 9)]);

        let personal = TaskDraft::new("Groceries", TaskCategory::Personal, TaskPriority::Low);
        let suggestions = generate_scheduling_suggestions(
            &personal,
            &[],
            date(2026, 3, 6),
            date(2026, 3, 9),
            &SchedulerPreferences::default(),
        );
        assert_eq!(suggestions.len(), 4);
    }

    #[test]
    fn empty_day_scores_full_confidence_with_minimal_impact() {
        let draft = TaskDraft::new("Read paper", TaskCategory::Learning, TaskPriority::Medium);
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &[],
            date(2026, 3, 3),
            date(2026, 3, 3),
            &SchedulerPreferences::default(),
        );

        assert_eq!(suggestions.len(), 1);
        let suggestion = &suggestions[0];
        assert!((suggestion.confidence - 1.0).abs() < 1e-9);
        assert_eq!(suggestion.workload_impact, WorkloadImpact::Minimal);
        assert_eq!(suggestion.reason, "Empty day with no scheduled tasks");
        assert_eq!(suggestion.suggested_time, time(9, 0));
    }

    #[test]
    fn day_at_task_cap_is_discarded() {
        let day = date(2026, 3, 3);
        let existing: Vec<Task> = (0..6)
            .map(|_| task_on(day, TaskCategory::Personal, None, Some(20)))
            .collect();

        let draft = TaskDraft::new("One more", TaskCategory::Personal, TaskPriority::Low);
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &existing,
            day,
            day,
            &SchedulerPreferences::default(),
        );
        // 1.0 * 0.3 = 0.3 which is not above the floor.
        assert!(suggestions.is_empty());
    }

    #[test]
    fn near_minute_cap_degrades_confidence() {
        let day = date(2026, 3, 3);
        // 400 of 480 minutes booked (>= 80%), two tasks.
        let existing = vec![
            task_on(day, TaskCategory::Personal, None, Some(200)),
            task_on(day, TaskCategory::Personal, None, Some(200)),
        ];

        let draft = TaskDraft::new("Stretch", TaskCategory::Health, TaskPriority::Low)
            .with_duration_minutes(Some(30));
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &existing,
            day,
            day,
            &SchedulerPreferences::default(),
        );

        assert_eq!(suggestions.len(), 1);
        assert!((suggestions[0].confidence - 0.7).abs() < 1e-9);
        assert_eq!(suggestions[0].workload_impact, WorkloadImpact::Significant);
    }

    #[test]
    fn category_affinity_boosts_past_one() {
        let day = date(2026, 3, 3);
        let existing = vec![
            task_on(day, TaskCategory::Learning, None, Some(30)),
            task_on(day, TaskCategory::Learning, None, Some(30)),
        ];

        let draft = TaskDraft::new("Flashcards", TaskCategory::Learning, TaskPriority::Low);
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &existing,
            day,
            day,
            &SchedulerPreferences::default(),
        );

        assert_eq!(suggestions.len(), 1);
        assert!((suggestions[0].confidence - 1.2).abs() < 1e-9);
        assert_eq!(
            suggestions[0].reason,
            "Groups well with similar tasks already scheduled"
        );
    }

    #[test]
    fn keeps_top_five_with_alternatives_from_survivors() {
        let draft = TaskDraft::new("Plan sprint", TaskCategory::Work, TaskPriority::Medium);
        // Two work weeks of empty weekdays.
        let suggestions = generate_scheduling_suggestions(
            &draft,
            &[],
            date(2026, 3, 2),
            date(2026, 3, 13),
            &SchedulerPreferences::default(),
        );

        assert_eq!(suggestions.len(), 5);
        for suggestion in &suggestions {
            assert_eq!(suggestion.alternatives.len(), 3);
            assert!(!suggestion.alternatives.contains(&suggestion.date));
        }
    }

    #[test]
    fn slot_search_respects_existing_times() {
        let day = date(2026, 3, 3);
        let hours = WorkingHours::default();

        // Draft-specified time always wins.
        let fixed = TaskDraft::new("Call", TaskCategory::Work, TaskPriority::High)
            .with_scheduled_time(Some(time(14, 0)));
        assert_eq!(find_best_time_slot(&[], &fixed, &hours), time(14, 0));

        // No timed tasks: working start.
        let draft = TaskDraft::new("Write", TaskCategory::Work, TaskPriority::Medium)
            .with_duration_minutes(Some(30));
        let untimed = task_on(day, TaskCategory::Work, None, Some(60));
        assert_eq!(
            find_best_time_slot(&[&untimed], &draft, &hours),
            time(9, 0)
        );

        // Gap between 09:30 and 11:00 fits 30 + 15 minutes.
        let morning = task_on(day, TaskCategory::Work, Some(time(9, 0)), Some(30));
        let midday = task_on(day, TaskCategory::Work, Some(time(11, 0)), Some(60));
        assert_eq!(
            find_best_time_slot(&[&morning, &midday], &draft, &hours),
            time(9, 45)
        );

        // No qualifying gap: 15 minutes after the last task's end.
        let packed_morning = task_on(day, TaskCategory::Work, Some(time(9, 0)), Some(60));
        let packed_next = task_on(day, TaskCategory::Work, Some(time(10, 0)), Some(30));
        assert_eq!(
            find_best_time_slot(&[&packed_morning, &packed_next], &draft, &hours),
            time(10, 45)
        );

        // Tail slot would spill past working end: fall back to the day start.
        let late = task_on(day, TaskCategory::Work, Some(time(17, 30)), Some(25));
        assert_eq!(find_best_time_slot(&[&late], &draft, &hours), time(9, 0));
    }
}
