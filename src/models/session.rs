//! Examination session model.
//!
//! A session is one examination period: a closed date range, the semester
//! whose modules are examined, and the days inside the range on which no
//! exam may be held (weekly rest days and explicit holidays).
//!
//! # Calendar Model
//! A date is an exam day iff:
//! - It falls within `[start_date, end_date]`, AND
//! - Its weekday is not listed in `rest_days`, AND
//! - It is not listed in `holidays`.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// An examination period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Human-readable name (e.g., "Winter exams 2026").
    pub name: String,
    /// Semester tag; only modules with the same tag are examined.
    pub semester: String,
    /// First calendar day of the session (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar day of the session (inclusive).
    pub end_date: NaiveDate,
    /// Weekdays on which no exam is held.
    #[serde(default = "default_rest_days")]
    pub rest_days: Vec<Weekday>,
    /// Additional non-exam dates inside the range.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

fn default_rest_days() -> Vec<Weekday> {
    vec![Weekday::Fri]
}

impl Session {
    /// Creates a session over `[start_date, end_date]` with Friday as rest day.
    pub fn new(
        id: impl Into<String>,
        semester: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            semester: semester.into(),
            start_date,
            end_date,
            rest_days: default_rest_days(),
            holidays: Vec::new(),
        }
    }

    /// Sets the session name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the weekly rest days.
    pub fn with_rest_days(mut self, rest_days: Vec<Weekday>) -> Self {
        self.rest_days = rest_days;
        self
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.push(date);
        self
    }

    /// Whether an exam may be held on `date`.
    pub fn is_exam_day(&self, date: NaiveDate) -> bool {
        date >= self.start_date
            && date <= self.end_date
            && !self.rest_days.contains(&date.weekday())
            && !self.holidays.contains(&date)
    }

    /// Ordered list of exam days in the session.
    ///
    /// Empty if `end_date < start_date` or every day is excluded.
    pub fn exam_days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .filter(|d| self.is_exam_day(*d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exam_days_skip_rest_day() {
        // 2026-01-05 is a Monday; the 9th is a Friday.
        let s = Session::new("S", "S1", date(2026, 1, 5), date(2026, 1, 11));
        let days = s.exam_days();
        assert_eq!(days.len(), 6);
        assert!(!days.contains(&date(2026, 1, 9)));
        assert_eq!(days[0], date(2026, 1, 5));
        assert_eq!(*days.last().unwrap(), date(2026, 1, 11));
    }

    #[test]
    fn test_exam_days_skip_holidays() {
        let s = Session::new("S", "S1", date(2026, 1, 5), date(2026, 1, 7))
            .with_rest_days(vec![])
            .with_holiday(date(2026, 1, 6));
        assert_eq!(s.exam_days(), vec![date(2026, 1, 5), date(2026, 1, 7)]);
    }

    #[test]
    fn test_exam_days_inverted_range() {
        let s = Session::new("S", "S1", date(2026, 1, 7), date(2026, 1, 5));
        assert!(s.exam_days().is_empty());
    }

    #[test]
    fn test_is_exam_day_outside_range() {
        let s = Session::new("S", "S1", date(2026, 1, 5), date(2026, 1, 7));
        assert!(!s.is_exam_day(date(2026, 1, 4)));
        assert!(s.is_exam_day(date(2026, 1, 5)));
    }

    #[test]
    fn test_rest_days_default_on_deserialize() {
        let json = r#"{"id":"S","name":"","semester":"S1","start_date":"2026-01-05","end_date":"2026-01-10"}"#;
        let s: Session = serde_json::from_str(json).unwrap();
        assert_eq!(s.rest_days, vec![Weekday::Fri]);
        assert!(s.holidays.is_empty());
    }
}
