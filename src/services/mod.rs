pub mod bulk_planner;
pub mod calendar;
pub mod planning_service;
pub mod recurrence_engine;
pub mod recurring_task_service;
pub mod smart_scheduler;
pub mod template_service;
pub mod workload_analyzer;
