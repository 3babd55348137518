//! Daily time slot model.
//!
//! A slot is a fixed window within an exam day. The same slot identifier
//! recurs on every exam day, so a placement is the pair (date, slot).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A daily examination window [start, end).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Display label (e.g., "08:30 - 10:00").
    pub label: String,
    /// Position within the day (ascending).
    pub order: u32,
    /// Window start (inclusive).
    pub start: NaiveTime,
    /// Window end (exclusive).
    pub end: NaiveTime,
}

/// A placement position: one slot on one exam day.
///
/// Ordered by date, then by the slot's position within the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    /// Exam date.
    pub date: NaiveDate,
    /// Index of the slot in the ordered slot list of the snapshot.
    pub slot_index: usize,
}

impl TimeSlot {
    /// Creates a new slot.
    pub fn new(id: impl Into<String>, order: u32, start: NaiveTime, end: NaiveTime) -> Self {
        let label = format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"));
        Self {
            id: id.into(),
            label,
            order,
            start,
            end,
        }
    }

    /// Window length in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether the window can hold an exam of `minutes`.
    pub fn fits_exam(&self, minutes: u32) -> bool {
        self.duration_minutes() >= i64::from(minutes)
    }
}

impl SlotKey {
    /// Creates a new slot key.
    pub fn new(date: NaiveDate, slot_index: usize) -> Self {
        Self { date, slot_index }
    }
}
