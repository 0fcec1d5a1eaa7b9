use chrono::NaiveDate;
use questplan_core::models::task::{Task, TaskCategory, TaskDraft, TaskPriority};
use questplan_core::models::workload::{AnalysisPeriod, WorkloadLevel};
use questplan_core::services::workload_analyzer::calculate_workload_analysis;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn task_on(day: NaiveDate, category: TaskCategory, minutes: Option<i64>) -> Task {
    TaskDraft::new("Task", category, TaskPriority::Medium)
        .with_duration_minutes(minutes)
        .to_task(day)
}

#[test]
fn busy_monday_in_quiet_week() {
    // Three tasks on Monday (90 minutes via the 30-minute default), nothing
    // on the other six days.
    let monday = date(2026, 3, 2);
    let tasks = vec![
        task_on(monday, TaskCategory::Work, None),
        task_on(monday, TaskCategory::Work, None),
        task_on(monday, TaskCategory::Health, None),
    ];

    let analysis = calculate_workload_analysis(
        &tasks,
        date(2026, 3, 1),
        date(2026, 3, 7),
        AnalysisPeriod::Week,
    );

    assert_eq!(analysis.workload_level, WorkloadLevel::Light);
    assert!((analysis.average_tasks_per_day - 3.0 / 7.0).abs() < 1e-9);
    assert_eq!(analysis.peak_days[0].date, monday);
    assert_eq!(analysis.peak_days[0].task_count, 3);
    assert!(analysis.light_days.iter().all(|d| d.date != monday));
    assert!(analysis.light_days.iter().all(|d| d.task_count == 0));
}

#[test]
fn per_day_counts_sum_to_total() {
    let tasks: Vec<Task> = (0..23u32)
        .map(|i| {
            task_on(
                date(2026, 3, 1 + (i * 3) % 14),
                TaskCategory::Personal,
                Some(15 + (i as i64 % 4) * 20),
            )
        })
        .collect();

    let analysis = calculate_workload_analysis(
        &tasks,
        date(2026, 3, 1),
        date(2026, 3, 14),
        AnalysisPeriod::Custom,
    );

    let per_day: usize = analysis.daily_breakdown.iter().map(|d| d.task_count).sum();
    assert_eq!(per_day, analysis.total_tasks);

    let per_day_minutes: i64 = analysis
        .daily_breakdown
        .iter()
        .map(|d| d.total_minutes)
        .sum();
    assert_eq!(per_day_minutes, analysis.total_minutes);

    let percent_sum: f64 = analysis
        .category_distribution
        .iter()
        .map(|c| c.percentage)
        .sum();
    assert!((percent_sum - 100.0).abs() < 1e-9);
}

#[test]
fn classification_tiers_escalate_with_density() {
    let day = date(2026, 3, 2);
    let cases = [
        (2usize, 60i64, WorkloadLevel::Light),
        (4, 60, WorkloadLevel::Moderate),
        (6, 60, WorkloadLevel::Heavy),
        (7, 60, WorkloadLevel::Overloaded),
        // Minutes alone can push the tier even at a low count.
        (2, 100, WorkloadLevel::Moderate),
    ];

    for (count, minutes, expected) in cases {
        let tasks: Vec<Task> = (0..count)
            .map(|_| task_on(day, TaskCategory::Work, Some(minutes)))
            .collect();
        let analysis = calculate_workload_analysis(&tasks, day, day, AnalysisPeriod::Custom);
        assert_eq!(
            analysis.workload_level, expected,
            "{count} tasks x {minutes} min"
        );
    }
}

#[test]
fn empty_period_reports_capacity() {
    let analysis = calculate_workload_analysis(
        &[],
        date(2026, 3, 1),
        date(2026, 3, 31),
        AnalysisPeriod::Month,
    );

    assert_eq!(analysis.total_tasks, 0);
    assert_eq!(analysis.total_minutes, 0);
    assert_eq!(analysis.workload_level, WorkloadLevel::Light);
    assert!(analysis.category_distribution.is_empty());
    assert_eq!(analysis.recommendations.len(), 1);
    assert!(analysis.recommendations[0].contains("capacity available"));
    // Peak/light lists still come from the (uniformly empty) days.
    assert_eq!(analysis.peak_days.len(), 3);
    assert_eq!(analysis.light_days.len(), 3);
}
