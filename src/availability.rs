// src/availability.rs
//
// Availability engine: recurring weekly template + existing bookings
// -> the set of hour slots currently selectable for a streamer/date.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One hour-granular range inside a day, "HH:00" inclusive start,
/// exclusive end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaySchedule {
    pub slots: Vec<TimeRange>,
}

/// Weekly template keyed by weekday index, 0 = Monday .. 6 = Sunday.
pub type WeeklySchedule = HashMap<u8, DaySchedule>;

/// A committed reservation that blocks slots while in a blocking status.
#[derive(Debug, Clone)]
pub struct BookedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn parse_hour(value: &str) -> Option<u32> {
    let (hh, mm) = value.split_once(':')?;
    if mm != "00" {
        return None;
    }
    let hour: u32 = hh.parse().ok()?;
    (hour < 24).then_some(hour)
}

pub fn format_hour(hour: u32) -> String {
    format!("{hour:02}:00")
}

fn slot_bounds(date: NaiveDate, hour: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0)?);
    Some((start, start + chrono::Duration::hours(1)))
}

fn in_template(day: &DaySchedule, hour: u32) -> bool {
    day.slots.iter().any(|range| {
        match (parse_hour(&range.start), parse_hour(&range.end)) {
            (Some(start), Some(end)) => start <= hour && hour < end,
            _ => false,
        }
    })
}

/// Ordered selectable hours for `date`, restricted to the streamer's
/// service-hour window `[window_start, window_end)`. Bookings passed in
/// must already be filtered to blocking statuses; slots they cover are
/// excluded. An absent or empty template entry yields no hours.
pub fn selectable_hours(
    schedule: &WeeklySchedule,
    bookings: &[BookedRange],
    date: NaiveDate,
    window_start: u32,
    window_end: u32,
) -> Vec<u32> {
    let weekday = date.weekday().num_days_from_monday() as u8;
    let Some(day) = schedule.get(&weekday) else {
        return Vec::new();
    };

    (window_start..window_end.min(24))
        .filter(|&hour| in_template(day, hour))
        .filter(|&hour| {
            let Some((slot_start, slot_end)) = slot_bounds(date, hour) else {
                return false;
            };
            !bookings
                .iter()
                .any(|b| b.start < slot_end && b.end > slot_start)
        })
        .collect()
}

/// Toggle `hour` in the current selection, then normalize to the single
/// contiguous run spanning min..=max of the result. Hours in the span that
/// are no longer selectable are silently dropped rather than rejected.
pub fn normalize_selection<F>(selected: &[u32], hour: u32, is_selectable: F) -> Vec<u32>
where
    F: Fn(u32) -> bool,
{
    let mut hours: Vec<u32> = selected.to_vec();
    if let Some(pos) = hours.iter().position(|&h| h == hour) {
        hours.remove(pos);
        return hours;
    }

    hours.push(hour);
    hours.sort_unstable();
    if hours.len() > 1 {
        let lo = hours[0];
        let hi = hours[hours.len() - 1];
        return (lo..=hi).filter(|&h| is_selectable(h)).collect();
    }
    hours
}

/// Validates a schedule submitted by a streamer: every range must be
/// hour-aligned and non-empty. Overlap between ranges is not rejected here.
pub fn schedule_is_well_formed(schedule: &WeeklySchedule) -> bool {
    schedule.iter().all(|(weekday, day)| {
        *weekday < 7
            && day.slots.iter().all(|range| {
                match (parse_hour(&range.start), parse_hour(&range.end)) {
                    (Some(start), Some(end)) => start < end,
                    _ => false,
                }
            })
    })
}
