use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::store::{load_collection, save_collection, KvStore, KEY_TASKS};
use crate::error::AppResult;
use crate::models::planning::{
    BulkTaskCreation, PlanningPreview, SchedulerPreferences, SchedulingSuggestion,
};
use crate::models::task::{Task, TaskDraft};
use crate::models::workload::AnalysisPeriod;
use crate::services::bulk_planner;
use crate::services::smart_scheduler;
use crate::services::workload_analyzer;

/// Orchestrates the read-then-propose-then-commit planning flow over the
/// stored task collection.
#[derive(Clone)]
pub struct PlanningService {
    store: Arc<dyn KvStore>,
    preferences: SchedulerPreferences,
}

impl PlanningService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            preferences: SchedulerPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: SchedulerPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn preferences(&self) -> &SchedulerPreferences {
        &self.preferences
    }

    /// Distribute the batch, analyze the resulting load alongside the tasks
    /// already stored in the range, and collect conflicts. Nothing is
    /// persisted; the preview is handed back for approval.
    pub fn build_preview(&self, bulk: &BulkTaskCreation) -> AppResult<PlanningPreview> {
        let planned = bulk_planner::generate_bulk_task_plan(bulk);
        let existing = self.list_tasks()?;

        let in_range: Vec<Task> = planned
            .iter()
            .chain(existing.iter())
            .filter(|task| {
                task.scheduled_date >= bulk.start_date && task.scheduled_date <= bulk.end_date
            })
            .cloned()
            .collect();
        let analysis = workload_analyzer::calculate_workload_analysis(
            &in_range,
            bulk.start_date,
            bulk.end_date,
            AnalysisPeriod::Custom,
        );

        let conflicts = bulk_planner::validate_planning_conflicts(&planned, &existing);

        let mut suggestions = Vec::new();
        if !conflicts.is_empty() {
            suggestions.push(format!(
                "Resolve {} scheduling conflict(s) before committing this plan",
                conflicts.len()
            ));
        }
        suggestions.extend(analysis.recommendations.iter().cloned());

        let preview = PlanningPreview {
            id: Uuid::new_v4().to_string(),
            tasks: planned,
            analysis,
            conflicts,
            suggestions,
            generated_at: Utc::now(),
        };

        debug!(
            target: "app::planning",
            preview_id = %preview.id,
            tasks = preview.tasks.len(),
            conflicts = preview.conflicts.len(),
            "planning preview built"
        );
        Ok(preview)
    }

    /// Persist the previewed tasks. The stored task set is not re-checked for
    /// changes since the preview was built; in this single-user app the
    /// caller owns that tradeoff.
    pub fn commit_preview(&self, preview: &PlanningPreview) -> AppResult<Vec<Task>> {
        let mut tasks = self.list_tasks()?;
        tasks.extend(preview.tasks.iter().cloned());
        save_collection(self.store.as_ref(), KEY_TASKS, &tasks)?;

        info!(
            target: "app::planning",
            preview_id = %preview.id,
            committed = preview.tasks.len(),
            "planning preview committed"
        );
        Ok(preview.tasks.clone())
    }

    /// Ranked placement suggestions for a draft against the stored tasks.
    pub fn suggest_slots(
        &self,
        draft: &TaskDraft,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<SchedulingSuggestion>> {
        let existing = self.list_tasks()?;
        Ok(smart_scheduler::generate_scheduling_suggestions(
            draft,
            &existing,
            start,
            end,
            &self.preferences,
        ))
    }

    /// On-demand load report over the stored tasks in a range.
    pub fn analyze_workload(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        period: AnalysisPeriod,
    ) -> AppResult<crate::models::workload::WorkloadAnalysis> {
        let tasks: Vec<Task> = self
            .list_tasks()?
            .into_iter()
            .filter(|task| task.scheduled_date >= start && task.scheduled_date <= end)
            .collect();
        Ok(workload_analyzer::calculate_workload_analysis(
            &tasks, start, end, period,
        ))
    }

    pub fn list_tasks(&self) -> AppResult<Vec<Task>> {
        load_collection(self.store.as_ref(), KEY_TASKS)
    }

    pub fn add_task(&self, task: Task) -> AppResult<Task> {
        let mut tasks = self.list_tasks()?;
        tasks.push(task.clone());
        save_collection(self.store.as_ref(), KEY_TASKS, &tasks)?;
        Ok(task)
    }
}
