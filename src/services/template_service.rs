use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::db::store::{load_collection, save_collection, KvStore, KEY_TASKS, KEY_TASK_TEMPLATES};
use crate::error::{AppError, AppResult};
use crate::models::task::Task;
use crate::models::template::TaskTemplate;

const MAX_NAME_LENGTH: usize = 100;
const MAX_TITLE_LENGTH: usize = 200;

/// Store-backed CRUD for one-shot task templates plus quick instantiation.
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn KvStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn create_template(&self, template: TaskTemplate) -> AppResult<TaskTemplate> {
        if template.name.trim().is_empty() {
            return Err(AppError::validation("Template name cannot be empty"));
        }
        if template.name.len() > MAX_NAME_LENGTH {
            return Err(AppError::validation(
                "Template name cannot exceed 100 characters",
            ));
        }
        if template.title.trim().is_empty() {
            return Err(AppError::validation("Task title cannot be empty"));
        }
        if template.title.len() > MAX_TITLE_LENGTH {
            return Err(AppError::validation(
                "Task title cannot exceed 200 characters",
            ));
        }
        if let Some(duration) = template.duration_minutes {
            if duration <= 0 {
                return Err(AppError::validation("Duration must be positive"));
            }
        }

        let mut templates = self.load_templates()?;
        templates.push(template.clone());
        save_collection(self.store.as_ref(), KEY_TASK_TEMPLATES, &templates)?;

        info!(
            target: "app::planning",
            template_id = %template.id,
            "task template created"
        );
        Ok(template)
    }

    pub fn get_template(&self, template_id: &str) -> AppResult<TaskTemplate> {
        self.load_templates()?
            .into_iter()
            .find(|template| template.id == template_id)
            .ok_or_else(AppError::not_found)
    }

    pub fn list_templates(&self) -> AppResult<Vec<TaskTemplate>> {
        self.load_templates()
    }

    pub fn delete_template(&self, template_id: &str) -> AppResult<()> {
        let mut templates = self.load_templates()?;
        let before = templates.len();
        templates.retain(|template| template.id != template_id);
        if templates.len() == before {
            return Err(AppError::not_found());
        }
        save_collection(self.store.as_ref(), KEY_TASK_TEMPLATES, &templates)
    }

    /// Stamp out a task on the given date, persist it, and bump the
    /// template's usage counter.
    pub fn instantiate_task(&self, template_id: &str, date: NaiveDate) -> AppResult<Task> {
        let mut templates = self.load_templates()?;
        let template = templates
            .iter_mut()
            .find(|template| template.id == template_id)
            .ok_or_else(AppError::not_found)?;

        let task = template.instantiate(date);
        template.record_usage();
        save_collection(self.store.as_ref(), KEY_TASK_TEMPLATES, &templates)?;

        let mut tasks: Vec<Task> = load_collection(self.store.as_ref(), KEY_TASKS)?;
        tasks.push(task.clone());
        save_collection(self.store.as_ref(), KEY_TASKS, &tasks)?;

        Ok(task)
    }

    fn load_templates(&self) -> AppResult<Vec<TaskTemplate>> {
        load_collection(self.store.as_ref(), KEY_TASK_TEMPLATES)
    }
}
