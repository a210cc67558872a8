//! Monthly attendance statistics.
//!
//! The database groups attendance records by (date, acting teacher, status);
//! [`aggregate`] folds those tallies into totals, per-day and per-teacher
//! breakdowns.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::attendance::AttendanceStatus;
use crate::types::DbId;

/// One grouped row: `count` records on `date` credited to `teacher_id`.
#[derive(Debug, Clone)]
pub struct StatusTally {
    pub date: NaiveDate,
    pub teacher_id: DbId,
    pub teacher_name: String,
    pub status: AttendanceStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub hadir: i64,
    pub telat: i64,
    pub tidak_hadir: i64,
    pub diganti: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: AttendanceStatus, count: i64) {
        self.total += count;
        match status {
            AttendanceStatus::Pending => self.pending += count,
            AttendanceStatus::Hadir => self.hadir += count,
            AttendanceStatus::Telat => self.telat += count,
            AttendanceStatus::TidakHadir => self.tidak_hadir += count,
            AttendanceStatus::Diganti => self.diganti += count,
        }
    }

    pub fn percentages(&self) -> StatusPercentages {
        StatusPercentages {
            hadir: percent(self.hadir, self.total),
            telat: percent(self.telat, self.total),
            tidak_hadir: percent(self.tidak_hadir, self.total),
            diganti: percent(self.diganti, self.total),
            attendance_rate: percent(self.hadir + self.telat, self.total),
            on_time_rate: percent(self.hadir, self.total),
        }
    }
}

/// Shares of the total, in percent with one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusPercentages {
    pub hadir: f64,
    pub telat: f64,
    pub tidak_hadir: f64,
    pub diganti: f64,
    /// hadir + telat.
    pub attendance_rate: f64,
    pub on_time_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyStatistics {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherStatistics {
    pub teacher_id: DbId,
    pub teacher_name: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub percentages: StatusPercentages,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStatistics {
    pub year: i32,
    pub month: u32,
    pub totals: StatusCounts,
    pub percentages: StatusPercentages,
    /// Ascending by date; only dates with at least one record.
    pub daily: Vec<DailyStatistics>,
    /// Ascending by teacher name, then id.
    pub teachers: Vec<TeacherStatistics>,
}

/// Round `part / total` to a percentage with one decimal; zero when empty.
pub fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// First and last day of a month, or `None` for an invalid year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub fn aggregate(year: i32, month: u32, tallies: &[StatusTally]) -> MonthlyStatistics {
    let mut totals = StatusCounts::default();
    let mut daily: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    let mut teachers: BTreeMap<DbId, (String, StatusCounts)> = BTreeMap::new();

    for tally in tallies {
        totals.add(tally.status, tally.count);
        daily.entry(tally.date).or_default().add(tally.status, tally.count);
        teachers
            .entry(tally.teacher_id)
            .or_insert_with(|| (tally.teacher_name.clone(), StatusCounts::default()))
            .1
            .add(tally.status, tally.count);
    }

    let mut teachers: Vec<TeacherStatistics> = teachers
        .into_iter()
        .map(|(teacher_id, (teacher_name, counts))| TeacherStatistics {
            teacher_id,
            teacher_name,
            percentages: counts.percentages(),
            counts,
        })
        .collect();
    teachers.sort_by(|a, b| {
        a.teacher_name
            .to_lowercase()
            .cmp(&b.teacher_name.to_lowercase())
            .then(a.teacher_id.cmp(&b.teacher_id))
    });

    MonthlyStatistics {
        year,
        month,
        percentages: totals.percentages(),
        totals,
        daily: daily
            .into_iter()
            .map(|(date, counts)| DailyStatistics { date, counts })
            .collect(),
        teachers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn tally(day: u32, teacher_id: DbId, name: &str, status: AttendanceStatus, count: i64) -> StatusTally {
        StatusTally {
            date: d(day),
            teacher_id,
            teacher_name: name.to_string(),
            status,
            count,
        }
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(0, 0), 0.0);
    }

    #[test]
    fn month_bounds_handles_december_and_leap_years() {
        assert_eq!(
            month_bounds(2026, 12),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
            ))
        );
        assert_eq!(
            month_bounds(2028, 2).map(|(_, end)| end),
            NaiveDate::from_ymd_opt(2028, 2, 29)
        );
        assert_eq!(month_bounds(2026, 13), None);
    }

    #[test]
    fn aggregates_totals_days_and_teachers() {
        let tallies = vec![
            tally(9, 1, "Siti", AttendanceStatus::Hadir, 3),
            tally(9, 2, "ahmad", AttendanceStatus::Telat, 1),
            tally(10, 1, "Siti", AttendanceStatus::TidakHadir, 1),
            tally(10, 2, "ahmad", AttendanceStatus::Diganti, 1),
        ];
        let stats = aggregate(2026, 3, &tallies);

        assert_eq!(stats.totals.total, 6);
        assert_eq!(stats.totals.hadir, 3);
        assert_eq!(stats.percentages.hadir, 50.0);
        assert_eq!(stats.percentages.attendance_rate, 66.7);

        assert_eq!(stats.daily.len(), 2);
        assert_eq!(stats.daily[0].date, d(9));
        assert_eq!(stats.daily[0].counts.total, 4);

        let names: Vec<_> = stats.teachers.iter().map(|t| t.teacher_name.as_str()).collect();
        assert_eq!(names, vec!["ahmad", "Siti"]);
        assert_eq!(stats.teachers[1].percentages.tidak_hadir, 25.0);
    }

    #[test]
    fn empty_month_has_zero_percentages() {
        let stats = aggregate(2026, 3, &[]);
        assert_eq!(stats.totals, StatusCounts::default());
        assert_eq!(stats.percentages.hadir, 0.0);
        assert!(stats.daily.is_empty());
        assert!(stats.teachers.is_empty());
    }
}
