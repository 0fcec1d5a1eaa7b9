use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use tracing::{debug, info};

use crate::db::store::{
    load_collection, save_collection, KvStore, KEY_RECURRING_EXCEPTIONS, KEY_RECURRING_INSTANCES,
    KEY_RECURRING_TEMPLATES,
};
use crate::error::{AppError, AppResult};
use crate::models::recurring_task::{
    ExceptionIndex, Frequency, RecurrenceException, RecurrencePattern, RecurringTaskInstance,
    RecurringTaskTemplate, TemplatePatch,
};
use crate::models::task::TaskStatus;
use crate::services::recurrence_engine::{GenerationWindow, InstanceGenerator};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Store-backed management of recurring templates, their exceptions and their
/// materialized instances.
#[derive(Clone)]
pub struct RecurringTaskService {
    store: Arc<dyn KvStore>,
    window: GenerationWindow,
}

impl RecurringTaskService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            window: GenerationWindow::default(),
        }
    }

    pub fn with_window(mut self, window: GenerationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn create_template(
        &self,
        template: RecurringTaskTemplate,
    ) -> AppResult<RecurringTaskTemplate> {
        Self::validate_template(&template)?;

        let mut templates = self.load_templates()?;
        templates.push(template.clone());
        save_collection(self.store.as_ref(), KEY_RECURRING_TEMPLATES, &templates)?;

        info!(
            target: "app::recurrence",
            template_id = %template.id,
            frequency = %template.pattern.frequency,
            "recurring template created"
        );
        Ok(template)
    }

    pub fn get_template(&self, template_id: &str) -> AppResult<RecurringTaskTemplate> {
        self.load_templates()?
            .into_iter()
            .find(|template| template.id == template_id)
            .ok_or_else(AppError::not_found)
    }

    pub fn list_templates(&self) -> AppResult<Vec<RecurringTaskTemplate>> {
        self.load_templates()
    }

    pub fn update_template(
        &self,
        template_id: &str,
        patch: TemplatePatch,
    ) -> AppResult<RecurringTaskTemplate> {
        let mut templates = self.load_templates()?;
        let template = templates
            .iter_mut()
            .find(|template| template.id == template_id)
            .ok_or_else(AppError::not_found)?;

        template.update(patch);
        Self::validate_template(template)?;
        let updated = template.clone();
        save_collection(self.store.as_ref(), KEY_RECURRING_TEMPLATES, &templates)?;
        Ok(updated)
    }

    /// Stops further generation. Already-materialized instances are kept.
    pub fn deactivate_template(&self, template_id: &str) -> AppResult<RecurringTaskTemplate> {
        self.set_active(template_id, false)
    }

    pub fn activate_template(&self, template_id: &str) -> AppResult<RecurringTaskTemplate> {
        self.set_active(template_id, true)
    }

    fn set_active(&self, template_id: &str, is_active: bool) -> AppResult<RecurringTaskTemplate> {
        let mut templates = self.load_templates()?;
        let template = templates
            .iter_mut()
            .find(|template| template.id == template_id)
            .ok_or_else(AppError::not_found)?;

        if is_active {
            template.activate();
        } else {
            template.deactivate();
        }
        let updated = template.clone();
        save_collection(self.store.as_ref(), KEY_RECURRING_TEMPLATES, &templates)?;
        Ok(updated)
    }

    /// Deletes the template and cascades to its instances and exceptions.
    pub fn delete_template(&self, template_id: &str) -> AppResult<()> {
        let mut templates = self.load_templates()?;
        let before = templates.len();
        templates.retain(|template| template.id != template_id);
        if templates.len() == before {
            return Err(AppError::not_found());
        }
        save_collection(self.store.as_ref(), KEY_RECURRING_TEMPLATES, &templates)?;

        let mut instances = self.load_instances()?;
        instances.retain(|instance| instance.template_id != template_id);
        save_collection(self.store.as_ref(), KEY_RECURRING_INSTANCES, &instances)?;

        let mut exceptions = self.load_exceptions()?;
        exceptions.retain(|exception| exception.template_id != template_id);
        save_collection(self.store.as_ref(), KEY_RECURRING_EXCEPTIONS, &exceptions)?;

        info!(
            target: "app::recurrence",
            template_id,
            "recurring template deleted with instances and exceptions"
        );
        Ok(())
    }

    /// Upserts by (template, date); a second write for the same occurrence
    /// replaces the first.
    pub fn set_exception(&self, exception: RecurrenceException) -> AppResult<()> {
        self.get_template(&exception.template_id)?;

        let mut exceptions = self.load_exceptions()?;
        exceptions.retain(|existing| {
            !(existing.template_id == exception.template_id && existing.date == exception.date)
        });
        exceptions.push(exception);
        save_collection(self.store.as_ref(), KEY_RECURRING_EXCEPTIONS, &exceptions)
    }

    pub fn remove_exception(&self, template_id: &str, date: NaiveDate) -> AppResult<()> {
        let mut exceptions = self.load_exceptions()?;
        let before = exceptions.len();
        exceptions
            .retain(|exception| !(exception.template_id == template_id && exception.date == date));
        if exceptions.len() == before {
            return Err(AppError::not_found());
        }
        save_collection(self.store.as_ref(), KEY_RECURRING_EXCEPTIONS, &exceptions)
    }

    pub fn list_exceptions(&self, template_id: &str) -> AppResult<Vec<RecurrenceException>> {
        Ok(self
            .load_exceptions()?
            .into_iter()
            .filter(|exception| exception.template_id == template_id)
            .collect())
    }

    /// Materialize instances for a window and persist them. Pending instances
    /// of the template inside the window are replaced wholesale so a re-run
    /// after a pattern or exception change does not duplicate them; instances
    /// the user already started or completed survive. Inactive templates
    /// generate nothing.
    pub fn generate_instances(
        &self,
        template_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<RecurringTaskInstance>> {
        let template = self.get_template(template_id)?;
        if !template.is_active {
            debug!(
                target: "app::recurrence",
                template_id,
                "skipping generation for inactive template"
            );
            return Ok(Vec::new());
        }

        let exceptions = ExceptionIndex::from_exceptions(&self.load_exceptions()?);
        let generated = InstanceGenerator::generate_instances(&template, start, end, &exceptions);

        let mut stored = self.load_instances()?;
        stored.retain(|instance| {
            !(instance.template_id == template_id
                && instance.status == TaskStatus::Pending
                && instance.scheduled_date >= start
                && instance.scheduled_date <= end)
        });
        stored.extend(generated.clone());
        save_collection(self.store.as_ref(), KEY_RECURRING_INSTANCES, &stored)?;

        Ok(generated)
    }

    /// Rolling-window generation from today, per the configured horizon.
    pub fn generate_upcoming(&self, template_id: &str) -> AppResult<Vec<RecurringTaskInstance>> {
        let today = Local::now().date_naive();
        let horizon = today + Duration::days(self.window.horizon_days as i64);
        self.generate_instances(template_id, today, horizon)
    }

    /// Periodic maintenance pass: regenerate the rolling window for every
    /// active template, then prune stale instances per the window's retention
    /// setting. Returns the number of instances removed.
    pub fn run_maintenance(&self) -> AppResult<usize> {
        for template in self.load_templates()? {
            if template.is_active {
                self.generate_upcoming(&template.id)?;
            }
        }
        self.cleanup_instances(self.window.days_to_keep)
    }

    pub fn list_instances(
        &self,
        template_id: Option<&str>,
    ) -> AppResult<Vec<RecurringTaskInstance>> {
        let instances = self.load_instances()?;
        Ok(match template_id {
            Some(id) => instances
                .into_iter()
                .filter(|instance| instance.template_id == id)
                .collect(),
            None => instances,
        })
    }

    /// Drops stale instances per the engine's retention rule and reports how
    /// many were removed.
    pub fn cleanup_instances(&self, days_to_keep: u32) -> AppResult<usize> {
        let instances = self.load_instances()?;
        let before = instances.len();
        let kept = InstanceGenerator::cleanup_old_instances(
            instances,
            days_to_keep,
            Local::now().date_naive(),
        );
        let removed = before - kept.len();
        save_collection(self.store.as_ref(), KEY_RECURRING_INSTANCES, &kept)?;
        Ok(removed)
    }

    /// Upcoming occurrence dates for a stored template's pattern.
    pub fn preview_occurrences(
        &self,
        template_id: &str,
        start: NaiveDate,
        count: usize,
    ) -> AppResult<Vec<NaiveDate>> {
        let template = self.get_template(template_id)?;
        Ok(InstanceGenerator::generate_preview(
            &template.pattern,
            start,
            count,
        ))
    }

    fn validate_template(template: &RecurringTaskTemplate) -> AppResult<()> {
        if template.title.trim().is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        if template.title.len() > MAX_TITLE_LENGTH {
            return Err(AppError::validation("Title cannot exceed 200 characters"));
        }
        if let Some(description) = &template.description {
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(AppError::validation(
                    "Description cannot exceed 1000 characters",
                ));
            }
        }
        if let Some(duration) = template.duration_minutes {
            if duration <= 0 {
                return Err(AppError::validation("Duration must be positive"));
            }
        }
        Self::validate_pattern(&template.pattern)
    }

    /// A weekly pattern without weekdays is legal; it just never fires.
    fn validate_pattern(pattern: &RecurrencePattern) -> AppResult<()> {
        if pattern.interval == 0 {
            return Err(AppError::validation(
                "Recurrence interval must be at least 1",
            ));
        }
        if pattern.frequency == Frequency::Weekly {
            if let Some(weekdays) = &pattern.weekdays {
                if weekdays.iter().any(|&day| day > 6) {
                    return Err(AppError::validation(
                        "Weekdays must be in the range 0 (Sunday) to 6 (Saturday)",
                    ));
                }
            }
        }
        Ok(())
    }

    fn load_templates(&self) -> AppResult<Vec<RecurringTaskTemplate>> {
        load_collection(self.store.as_ref(), KEY_RECURRING_TEMPLATES)
    }

    fn load_instances(&self) -> AppResult<Vec<RecurringTaskInstance>> {
        load_collection(self.store.as_ref(), KEY_RECURRING_INSTANCES)
    }

    fn load_exceptions(&self) -> AppResult<Vec<RecurrenceException>> {
        load_collection(self.store.as_ref(), KEY_RECURRING_EXCEPTIONS)
    }
}
