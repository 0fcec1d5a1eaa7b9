pub mod planning;
pub mod recurring_task;
pub mod task;
pub mod template;
pub mod workload;
