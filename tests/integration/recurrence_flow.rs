use std::sync::Arc;

use chrono::NaiveDate;
use questplan_core::db::{KvStore, SqliteStore};
use questplan_core::models::recurring_task::{
    ExceptionAction, InstanceOverride, RecurrenceException, RecurrencePattern,
    RecurringTaskTemplate,
};
use questplan_core::models::task::{TaskCategory, TaskPriority, TaskStatus};
use questplan_core::services::recurring_task_service::RecurringTaskService;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn template_exception_instance_flow() {
    let dir = tempdir().expect("temp dir");
    let store: Arc<dyn KvStore> = Arc::new(
        SqliteStore::new(dir.path().join("recurrence.sqlite")).expect("sqlite store"),
    );
    let service = RecurringTaskService::new(store);

    let template = service
        .create_template(
            RecurringTaskTemplate::new(
                "Morning run",
                TaskCategory::Health,
                RecurrencePattern::weekly(vec![1, 3, 5]),
            )
            .with_priority(TaskPriority::High)
            .with_duration_minutes(Some(45)),
        )
        .expect("create template");

    // Skip Wednesday, retitle Friday.
    service
        .set_exception(RecurrenceException {
            template_id: template.id.clone(),
            date: date(2026, 3, 4),
            action: ExceptionAction::Skip,
        })
        .expect("skip exception");
    service
        .set_exception(RecurrenceException {
            template_id: template.id.clone(),
            date: date(2026, 3, 6),
            action: ExceptionAction::Modify(InstanceOverride {
                title: Some("Long run".to_string()),
                duration_minutes: Some(Some(90)),
                ..InstanceOverride::default()
            }),
        })
        .expect("modify exception");

    // 2026-03-01 is a Sunday; the week holds Mon/Wed/Fri occurrences.
    let instances = service
        .generate_instances(&template.id, date(2026, 3, 1), date(2026, 3, 7))
        .expect("generate instances");

    let dates: Vec<NaiveDate> = instances.iter().map(|i| i.instance_date).collect();
    assert_eq!(dates, vec![date(2026, 3, 2), date(2026, 3, 6)]);

    let monday = &instances[0];
    assert_eq!(monday.title, "Morning run");
    assert_eq!(monday.status, TaskStatus::Pending);
    assert!(!monday.is_modified);

    let friday = &instances[1];
    assert_eq!(friday.title, "Long run");
    assert_eq!(friday.duration_minutes, Some(90));
    assert!(friday.is_modified);

    // Instances round-trip through the sqlite store.
    let reloaded = service
        .list_instances(Some(&template.id))
        .expect("list instances");
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.iter().any(|i| i.title == "Long run"));

    // Preview continues past the generated window.
    let preview = service
        .preview_occurrences(&template.id, date(2026, 3, 1), 4)
        .expect("preview");
    assert_eq!(
        preview,
        vec![
            date(2026, 3, 2),
            date(2026, 3, 4),
            date(2026, 3, 6),
            date(2026, 3, 9)
        ]
    );

    // Deactivation stops generation without touching stored instances.
    service
        .deactivate_template(&template.id)
        .expect("deactivate");
    let after_deactivation = service
        .generate_instances(&template.id, date(2026, 3, 8), date(2026, 3, 14))
        .expect("generate while inactive");
    assert!(after_deactivation.is_empty());
    assert_eq!(
        service
            .list_instances(Some(&template.id))
            .expect("list instances")
            .len(),
        2
    );

    // Deleting the template cascades to instances and exceptions.
    service.delete_template(&template.id).expect("delete");
    assert!(service
        .list_instances(Some(&template.id))
        .expect("list instances")
        .is_empty());
    assert!(service
        .list_exceptions(&template.id)
        .expect("list exceptions")
        .is_empty());
}

#[test]
fn cleanup_removes_aged_pending_instances() {
    let dir = tempdir().expect("temp dir");
    let store: Arc<dyn KvStore> = Arc::new(
        SqliteStore::new(dir.path().join("cleanup.sqlite")).expect("sqlite store"),
    );
    let service = RecurringTaskService::new(store);

    let template = service
        .create_template(RecurringTaskTemplate::new(
            "Journal",
            TaskCategory::Personal,
            RecurrencePattern::daily(1),
        ))
        .expect("create template");

    // A window far in the past so every pending instance ages out.
    let old = service
        .generate_instances(&template.id, date(2020, 1, 1), date(2020, 1, 5))
        .expect("generate old instances");
    assert_eq!(old.len(), 5);

    let removed = service.cleanup_instances(30).expect("cleanup");
    assert_eq!(removed, 5);
    assert!(service
        .list_instances(Some(&template.id))
        .expect("list instances")
        .is_empty());
}
