use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use questplan_core::db::{KvStore, SqliteStore};
use questplan_core::models::planning::{BulkTaskCreation, ConflictSeverity, DistributionStrategy};
use questplan_core::models::task::{TaskCategory, TaskDraft, TaskPriority};
use questplan_core::models::workload::WorkloadLevel;
use questplan_core::services::planning_service::PlanningService;
use questplan_core::services::template_service::TemplateService;
use questplan_core::models::template::TaskTemplate;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

#[test]
fn bulk_preview_conflict_commit_flow() {
    let dir = tempdir().expect("temp dir");
    let store: Arc<dyn KvStore> = Arc::new(
        SqliteStore::new(dir.path().join("planning.sqlite")).expect("sqlite store"),
    );
    let service = PlanningService::new(Arc::clone(&store));

    // Existing morning block that one planned task will collide with.
    service
        .add_task(
            TaskDraft::new("Spec review", TaskCategory::Work, TaskPriority::High)
                .with_scheduled_time(Some(time(9, 0)))
                .with_duration_minutes(Some(45))
                .to_task(date(2026, 3, 2)),
        )
        .expect("seed existing task");

    let request = BulkTaskCreation {
        tasks: vec![
            TaskDraft::new("API implementation", TaskCategory::Work, TaskPriority::High)
                .with_scheduled_time(Some(time(9, 30)))
                .with_duration_minutes(Some(30)),
            TaskDraft::new("Write docs", TaskCategory::Work, TaskPriority::Medium)
                .with_duration_minutes(Some(60)),
            TaskDraft::new("Team retro", TaskCategory::Work, TaskPriority::Low)
                .with_duration_minutes(Some(45)),
        ],
        start_date: date(2026, 3, 2),
        end_date: date(2026, 3, 4),
        distribution: DistributionStrategy::Daily,
        exclude_weekends: true,
    };

    let preview = service.build_preview(&request).expect("build preview");

    assert_eq!(preview.tasks.len(), 3);
    let planned_dates: Vec<NaiveDate> = preview.tasks.iter().map(|t| t.scheduled_date).collect();
    assert_eq!(
        planned_dates,
        vec![date(2026, 3, 2), date(2026, 3, 3), date(2026, 3, 4)]
    );

    // The 09:00 existing task and the planned 09:30 task overlap.
    let overlap: Vec<_> = preview
        .conflicts
        .iter()
        .filter(|c| c.reason.contains("Time conflict"))
        .collect();
    assert_eq!(overlap.len(), 1);
    assert_eq!(overlap[0].date, date(2026, 3, 2));
    assert_eq!(overlap[0].severity, ConflictSeverity::High);
    assert!(overlap[0].reason.contains("Spec review"));
    assert!(overlap[0].reason.contains("API implementation"));

    // Analysis covers planned plus existing tasks in the range.
    assert_eq!(preview.analysis.total_tasks, 4);
    assert_eq!(preview.analysis.workload_level, WorkloadLevel::Light);
    assert!(preview
        .suggestions
        .iter()
        .any(|s| s.contains("conflict")));

    // Nothing persisted until the preview is committed.
    assert_eq!(service.list_tasks().expect("tasks").len(), 1);
    service.commit_preview(&preview).expect("commit");
    assert_eq!(service.list_tasks().expect("tasks").len(), 4);
}

#[test]
fn scheduling_suggestions_prefer_light_days() {
    let dir = tempdir().expect("temp dir");
    let store: Arc<dyn KvStore> = Arc::new(
        SqliteStore::new(dir.path().join("suggest.sqlite")).expect("sqlite store"),
    );
    let service = PlanningService::new(Arc::clone(&store));

    // Load Tuesday close to the minute cap; leave Wednesday empty.
    for _ in 0..2 {
        service
            .add_task(
                TaskDraft::new("Deep work", TaskCategory::Work, TaskPriority::High)
                    .with_duration_minutes(Some(200))
                    .to_task(date(2026, 3, 3)),
            )
            .expect("seed task");
    }

    let draft = TaskDraft::new("Code review", TaskCategory::Work, TaskPriority::Medium)
        .with_duration_minutes(Some(60));
    let suggestions = service
        .suggest_slots(&draft, date(2026, 3, 3), date(2026, 3, 4))
        .expect("suggest");

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].date, date(2026, 3, 4));
    assert!(suggestions[0].confidence > suggestions[1].confidence);
    assert_eq!(suggestions[0].suggested_time, time(9, 0));
    assert!(suggestions[0].alternatives.contains(&date(2026, 3, 3)));
}

#[test]
fn task_template_instantiation_feeds_planning() {
    let dir = tempdir().expect("temp dir");
    let store: Arc<dyn KvStore> = Arc::new(
        SqliteStore::new(dir.path().join("templates.sqlite")).expect("sqlite store"),
    );
    let templates = TemplateService::new(Arc::clone(&store));
    let planning = PlanningService::new(Arc::clone(&store));

    let template = templates
        .create_template(
            TaskTemplate::new(
                "Weekly groceries",
                "Buy groceries",
                TaskCategory::Personal,
                TaskPriority::Low,
            )
            .with_duration_minutes(Some(40)),
        )
        .expect("create template");

    templates
        .instantiate_task(&template.id, date(2026, 3, 7))
        .expect("instantiate");

    // The instantiated task lands in the shared task collection the planner
    // reads from.
    let tasks = planning.list_tasks().expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy groceries");
    assert_eq!(
        templates
            .get_template(&template.id)
            .expect("get")
            .usage_count,
        1
    );
}
