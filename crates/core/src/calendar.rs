//! School-week calendar helpers.
//!
//! The timetable is a fixed weekly grid keyed by [`DayOfWeek`]; leave requests
//! and attendance records are keyed by concrete calendar dates. Everything
//! that bridges the two (conflict checks, approval cascades, pending queues)
//! goes through [`occurrences_in_range`] so there is exactly one definition of
//! "the dates on which this slot meets".

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A teaching day. Sunday has no lessons and is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 6] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// Storage representation (matches the `schedule_slots.day_of_week` CHECK).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
        }
    }

    /// The `hari` label shown to school staff.
    pub fn indonesian_name(&self) -> &'static str {
        match self {
            Self::Monday => "Senin",
            Self::Tuesday => "Selasa",
            Self::Wednesday => "Rabu",
            Self::Thursday => "Kamis",
            Self::Friday => "Jumat",
            Self::Saturday => "Sabtu",
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(Self::Monday),
            Weekday::Tue => Some(Self::Tuesday),
            Weekday::Wed => Some(Self::Wednesday),
            Weekday::Thu => Some(Self::Thursday),
            Weekday::Fri => Some(Self::Friday),
            Weekday::Sat => Some(Self::Saturday),
            Weekday::Sun => None,
        }
    }

    pub fn to_weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Tuesday => Weekday::Tue,
            Self::Wednesday => Weekday::Wed,
            Self::Thursday => Weekday::Thu,
            Self::Friday => Weekday::Fri,
            Self::Saturday => Weekday::Sat,
        }
    }

    /// The teaching day a date falls on, or `None` for Sundays.
    pub fn of_date(date: NaiveDate) -> Option<Self> {
        Self::from_weekday(date.weekday())
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = CoreError;

    /// Accepts both the English storage names and the Indonesian `hari`
    /// labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "senin" => Ok(Self::Monday),
            "tuesday" | "selasa" => Ok(Self::Tuesday),
            "wednesday" | "rabu" => Ok(Self::Wednesday),
            "thursday" | "kamis" => Ok(Self::Thursday),
            "friday" | "jumat" => Ok(Self::Friday),
            "saturday" | "sabtu" => Ok(Self::Saturday),
            other => Err(CoreError::Validation(format!(
                "Invalid day of week '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Number of calendar days in `[start, end]`, counting both ends.
pub fn inclusive_span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Every date in `[start, end]` on which a slot meeting on `day` takes place.
///
/// Returns an empty list when `end < start`.
pub fn occurrences_in_range(day: DayOfWeek, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    let target = day.to_weekday().num_days_from_monday() as i64;
    let current = start.weekday().num_days_from_monday() as i64;
    let offset = (target - current).rem_euclid(7);

    let mut dates = Vec::new();
    let mut date = start + Duration::days(offset);
    while date <= end {
        dates.push(date);
        date += Duration::days(7);
    }
    dates
}

/// Whether two half-open time intervals `[start, end)` intersect.
pub fn time_ranges_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_english_and_indonesian_names() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("Senin".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("JUMAT".parse::<DayOfWeek>().unwrap(), DayOfWeek::Friday);
        assert!("minggu".parse::<DayOfWeek>().is_err());
        assert!("sunday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn sunday_is_not_a_teaching_day() {
        // 2026-03-08 is a Sunday.
        assert_eq!(DayOfWeek::of_date(d(2026, 3, 8)), None);
        assert_eq!(DayOfWeek::of_date(d(2026, 3, 9)), Some(DayOfWeek::Monday));
    }

    #[test]
    fn storage_name_round_trips_through_try_from() {
        for day in DayOfWeek::ALL {
            assert_eq!(DayOfWeek::try_from(day.as_str().to_string()).unwrap(), day);
        }
    }

    #[test]
    fn monday_slot_meets_once_in_monday_to_wednesday() {
        let dates = occurrences_in_range(DayOfWeek::Monday, d(2026, 3, 9), d(2026, 3, 11));
        assert_eq!(dates, vec![d(2026, 3, 9)]);
    }

    #[test]
    fn tuesday_slot_inside_range_is_found() {
        let dates = occurrences_in_range(DayOfWeek::Tuesday, d(2026, 3, 9), d(2026, 3, 11));
        assert_eq!(dates, vec![d(2026, 3, 10)]);
    }

    #[test]
    fn friday_slot_outside_range_yields_nothing() {
        let dates = occurrences_in_range(DayOfWeek::Friday, d(2026, 3, 9), d(2026, 3, 11));
        assert!(dates.is_empty());
    }

    #[test]
    fn weekly_recurrence_across_a_month() {
        // Range starts on a Thursday; Wednesdays follow a week apart.
        let dates = occurrences_in_range(DayOfWeek::Wednesday, d(2026, 3, 5), d(2026, 3, 31));
        assert_eq!(
            dates,
            vec![d(2026, 3, 11), d(2026, 3, 18), d(2026, 3, 25)]
        );
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(occurrences_in_range(DayOfWeek::Monday, d(2026, 3, 16), d(2026, 3, 9)).is_empty());
    }

    #[test]
    fn span_counts_both_ends() {
        assert_eq!(inclusive_span_days(d(2026, 3, 9), d(2026, 3, 9)), 1);
        assert_eq!(inclusive_span_days(d(2026, 3, 1), d(2026, 3, 30)), 30);
        assert_eq!(inclusive_span_days(d(2026, 3, 1), d(2026, 3, 31)), 31);
    }

    #[test]
    fn back_to_back_periods_do_not_overlap() {
        assert!(!time_ranges_overlap(t(7, 0), t(7, 45), t(7, 45), t(8, 30)));
        assert!(time_ranges_overlap(t(7, 0), t(7, 45), t(7, 30), t(8, 15)));
    }
}
