use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::recurring_task::{
    ExceptionAction, ExceptionIndex, Frequency, RecurrencePattern, RecurringTaskInstance,
    RecurringTaskTemplate,
};
use crate::models::task::TaskStatus;
use crate::services::calendar;

/// Upper bound on a preview scan that has not matched anything yet.
const PREVIEW_FRUITLESS_SCAN_DAYS: u32 = 365;

/// Absolute preview scan bound, roughly ten years.
const PREVIEW_MAX_SCAN_DAYS: u32 = 3650;

/// Rolling-window defaults for scheduled materialization runs.
#[derive(Debug, Clone)]
pub struct GenerationWindow {
    /// Days ahead of today to materialize.
    pub horizon_days: u32,
    /// Trailing days of non-completed instances to retain on cleanup.
    pub days_to_keep: u32,
}

impl Default for GenerationWindow {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            days_to_keep: 30,
        }
    }
}

/// Engine for materializing task instances from recurrence patterns.
pub struct InstanceGenerator;

impl InstanceGenerator {
    /// Pattern-match predicate for a single date.
    ///
    /// Two behavioral quirks are preserved deliberately for compatibility
    /// with existing stored data and must not be "fixed" silently:
    /// daily patterns fire when the day-of-year is divisible by the interval
    /// (they are not anchored to the template's creation date), and weekly
    /// patterns fire on every listed weekday of every week (the interval is
    /// accepted but not applied).
    pub fn matches_on(pattern: &RecurrencePattern, date: NaiveDate) -> bool {
        match pattern.frequency {
            Frequency::Daily => date.ordinal() % pattern.effective_interval() == 0,
            Frequency::Weekly => match &pattern.weekdays {
                Some(weekdays) => weekdays.contains(&calendar::weekday_index(date)),
                None => false,
            },
            Frequency::Monthly => date.day() == 1,
        }
    }

    /// Walk every date in `[start, end]` and materialize instances, honoring
    /// skip/modify exceptions, the pattern's end date and its occurrence cap.
    /// Malformed patterns generate nothing rather than erroring.
    pub fn generate_instances(
        template: &RecurringTaskTemplate,
        start: NaiveDate,
        end: NaiveDate,
        exceptions: &ExceptionIndex,
    ) -> Vec<RecurringTaskInstance> {
        let pattern = &template.pattern;
        let effective_end = match pattern.end_date {
            Some(end_date) if end_date < end => end_date,
            _ => end,
        };
        let max_occurrences = pattern.max_occurrences.map(|max| max as usize);

        let mut instances = Vec::new();
        let mut current = start;
        while current <= effective_end {
            if let Some(max) = max_occurrences {
                if instances.len() >= max {
                    break;
                }
            }

            match exceptions.lookup(&template.id, current) {
                Some(ExceptionAction::Skip) => {}
                Some(ExceptionAction::Modify(overrides)) => {
                    if Self::matches_on(pattern, current) {
                        let mut instance = RecurringTaskInstance::from_template(template, current);
                        instance.apply_override(overrides);
                        instances.push(instance);
                    }
                }
                None => {
                    if Self::matches_on(pattern, current) {
                        instances.push(RecurringTaskInstance::from_template(template, current));
                    }
                }
            }

            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        debug!(
            target: "app::recurrence",
            template_id = %template.id,
            start = %start,
            end = %effective_end,
            count = instances.len(),
            "instances generated"
        );
        instances
    }

    /// Collect up to `count` upcoming occurrence dates. The scan gives up
    /// after 365 fruitless days, and is bounded overall, so a pattern that
    /// never (or no longer) matches yields a short or empty result instead of
    /// an unbounded walk.
    pub fn generate_preview(
        pattern: &RecurrencePattern,
        start: NaiveDate,
        count: usize,
    ) -> Vec<NaiveDate> {
        let target = match pattern.max_occurrences {
            Some(max) => count.min(max as usize),
            None => count,
        };

        let mut dates = Vec::new();
        let mut current = start;
        let mut scanned: u32 = 0;
        while dates.len() < target && scanned < PREVIEW_MAX_SCAN_DAYS {
            if let Some(end_date) = pattern.end_date {
                if current > end_date {
                    break;
                }
            }
            if scanned >= PREVIEW_FRUITLESS_SCAN_DAYS && dates.is_empty() {
                break;
            }
            if Self::matches_on(pattern, current) {
                dates.push(current);
            }
            scanned += 1;
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        dates
    }

    /// Retain instances scheduled within the trailing `days_to_keep` window
    /// (or later), plus completed instances regardless of age.
    pub fn cleanup_old_instances(
        instances: Vec<RecurringTaskInstance>,
        days_to_keep: u32,
        today: NaiveDate,
    ) -> Vec<RecurringTaskInstance> {
        let cutoff = today - chrono::Duration::days(days_to_keep as i64);
        let before = instances.len();
        let kept: Vec<RecurringTaskInstance> = instances
            .into_iter()
            .filter(|instance| {
                instance.scheduled_date >= cutoff || instance.status == TaskStatus::Completed
            })
            .collect();
        debug!(
            target: "app::recurrence",
            removed = before - kept.len(),
            cutoff = %cutoff,
            "old instances cleaned up"
        );
        kept
    }
}
