use chrono::{NaiveDate, TimeZone, Utc};

use salda_booking::availability::{
    format_hour, normalize_selection, parse_hour, schedule_is_well_formed, selectable_hours,
    BookedRange, DaySchedule, TimeRange, WeeklySchedule,
};

fn schedule(weekday: u8, ranges: &[(&str, &str)]) -> WeeklySchedule {
    let mut schedule = WeeklySchedule::new();
    schedule.insert(
        weekday,
        DaySchedule {
            slots: ranges
                .iter()
                .map(|(start, end)| TimeRange {
                    start: start.to_string(),
                    end: end.to_string(),
                })
                .collect(),
        },
    );
    schedule
}

fn booked(date: NaiveDate, start: u32, end: u32) -> BookedRange {
    BookedRange {
        start: Utc.from_utc_datetime(&date.and_hms_opt(start, 0, 0).unwrap()),
        end: Utc.from_utc_datetime(&date.and_hms_opt(end, 0, 0).unwrap()),
    }
}

// 2025-06-11 is a Wednesday, weekday index 2 (Monday = 0).
fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
}

#[test]
fn template_range_yields_hour_slots() {
    let schedule = schedule(2, &[("10:00", "14:00")]);

    let hours = selectable_hours(&schedule, &[], wednesday(), 8, 22);
    assert_eq!(hours, vec![10, 11, 12, 13]);
}

#[test]
fn missing_weekday_yields_nothing() {
    let schedule = schedule(2, &[("10:00", "14:00")]);
    // Thursday has no template entry.
    let thursday = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();

    assert!(selectable_hours(&schedule, &[], thursday, 8, 22).is_empty());
}

#[test]
fn empty_template_yields_nothing() {
    let schedule = WeeklySchedule::new();

    assert!(selectable_hours(&schedule, &[], wednesday(), 8, 22).is_empty());
}

#[test]
fn booked_hours_are_excluded() {
    let schedule = schedule(2, &[("10:00", "14:00")]);
    let bookings = vec![booked(wednesday(), 11, 13)];

    let hours = selectable_hours(&schedule, &bookings, wednesday(), 8, 22);
    assert_eq!(hours, vec![10, 13]);
}

#[test]
fn booking_on_another_day_does_not_block() {
    let schedule = schedule(2, &[("10:00", "14:00")]);
    let tuesday = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    let bookings = vec![booked(tuesday, 10, 14)];

    let hours = selectable_hours(&schedule, &bookings, wednesday(), 8, 22);
    assert_eq!(hours, vec![10, 11, 12, 13]);
}

#[test]
fn service_window_clips_template() {
    let schedule = schedule(2, &[("08:00", "20:00")]);

    let hours = selectable_hours(&schedule, &[], wednesday(), 10, 12);
    assert_eq!(hours, vec![10, 11]);
}

#[test]
fn split_ranges_leave_a_gap() {
    let schedule = schedule(2, &[("09:00", "11:00"), ("13:00", "15:00")]);

    let hours = selectable_hours(&schedule, &[], wednesday(), 8, 22);
    assert_eq!(hours, vec![9, 10, 13, 14]);
}

#[test]
fn toggle_deselects_an_hour() {
    let selection = normalize_selection(&[10, 11], 11, |_| true);
    assert_eq!(selection, vec![10]);
}

#[test]
fn adjacent_hour_extends_the_run() {
    let selection = normalize_selection(&[10], 11, |_| true);
    assert_eq!(selection, vec![10, 11]);
}

#[test]
fn disjoint_hour_spans_the_range() {
    let selection = normalize_selection(&[10], 13, |_| true);
    assert_eq!(selection, vec![10, 11, 12, 13]);
}

#[test]
fn unavailable_hours_inside_the_span_are_dropped() {
    // 12:00 got booked between reads; it silently falls out of the span.
    let selection = normalize_selection(&[10], 13, |h| h != 12);
    assert_eq!(selection, vec![10, 11, 13]);
}

#[test]
fn hour_parsing_is_strict() {
    assert_eq!(parse_hour("09:00"), Some(9));
    assert_eq!(parse_hour("23:00"), Some(23));
    assert_eq!(parse_hour("24:00"), None);
    assert_eq!(parse_hour("10:30"), None);
    assert_eq!(parse_hour("abc"), None);
    assert_eq!(format_hour(9), "09:00");
}

#[test]
fn malformed_schedules_are_rejected() {
    assert!(schedule_is_well_formed(&schedule(2, &[("10:00", "14:00")])));
    assert!(!schedule_is_well_formed(&schedule(2, &[("14:00", "10:00")])));
    assert!(!schedule_is_well_formed(&schedule(2, &[("10:30", "14:00")])));
    assert!(!schedule_is_well_formed(&schedule(9, &[("10:00", "14:00")])));
}
