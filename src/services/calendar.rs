use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Inclusive list of calendar dates. Start after end yields an empty range.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Weekday index with 0=Sunday .. 6=Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(weekday_index(date), 0 | 6)
}

/// Calendar rows for one month, Sunday-first, padded with `None` outside the
/// month. The final row is only emitted when it holds at least one day.
pub fn month_grid(year: i32, month: u32) -> AppResult<Vec<[Option<NaiveDate>; 7]>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        AppError::validation_with_details(
            "invalid calendar month",
            json!({"year": year, "month": month}),
        )
    })?;

    let mut weeks = Vec::new();
    let mut week: [Option<NaiveDate>; 7] = [None; 7];
    let mut current = first;
    loop {
        let idx = weekday_index(current) as usize;
        week[idx] = Some(current);
        if idx == 6 {
            weeks.push(week);
            week = [None; 7];
        }
        match current.succ_opt() {
            Some(next) if next.month() == month => current = next,
            _ => break,
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    Ok(weeks)
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
        AppError::validation_with_details(
            "invalid date format",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts `HH:MM`, tolerating a trailing seconds component.
pub fn parse_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|err| {
            AppError::validation_with_details(
                "invalid time format",
                json!({"value": value, "error": err.to_string()}),
            )
        })
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn minutes_from_midnight(time: NaiveTime) -> i64 {
    (time.hour() as i64) * 60 + (time.minute() as i64)
}

/// Inverse of `minutes_from_midnight`, clamped to the same day.
pub fn time_from_minutes(total_minutes: i64) -> NaiveTime {
    let clamped = total_minutes.clamp(0, 23 * 60 + 59) as u32;
    NaiveTime::from_hms_opt(clamped / 60, clamped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Half-open interval overlap on minutes of day.
pub fn minutes_overlap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Serde helpers for `HH:MM` times of day.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(value) => super::hhmm::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_time(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// For `Option<Option<NaiveTime>>` patch fields: an absent field means "leave
/// unchanged", an explicit null means "clear".
pub mod hhmm_patch {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<Option<NaiveTime>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(Some(value)) => super::hhmm::serialize(value, serializer),
            _ => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<NaiveTime>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_time(&raw)
                .map(|time| Some(Some(time)))
                .map_err(serde::de::Error::custom),
            None => Ok(Some(None)),
        }
    }
}
