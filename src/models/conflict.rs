//! Conflict (diagnostic) model.
//!
//! Constraint violations are data, not errors: every stage that cannot
//! honour a constraint records a [`Conflict`] and carries on, so a run
//! always yields a complete timetable.
//!
//! | Kind | Raised by | Default severity |
//! |------|-----------|------------------|
//! | `Student` | allocator (placement overflow), auditor | Critical |
//! | `Room` | room assigner (no free room), auditor | Critical |
//! | `ProfessorOverload` | invigilator assigner, auditor | Major |
//! | `Capacity` | room assigner, auditor | Minor or Major |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of conflict kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Students with more exams on one date than allowed.
    Student,
    /// A room hosting more than one group in the same (date, slot).
    Room,
    /// A professor over the daily cap or in two rooms at once.
    ProfessorOverload,
    /// A group larger than its room.
    Capacity,
}

/// Conflict severity, ordered from least to most serious.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

/// A recorded constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Conflict {
    /// Kind of violation.
    pub kind: ConflictKind,
    /// Severity.
    pub severity: Severity,
    /// Date the violation occurs on.
    pub date: Option<NaiveDate>,
    /// Slot the violation occurs in, if it is slot-specific.
    pub slot_id: Option<String>,
    /// Offending entity (room, professor, or the first module of a clash).
    pub entity_id: String,
    /// Offending exams.
    pub exam_ids: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// Set by operators once the conflict has been dealt with.
    #[serde(default)]
    pub resolved: bool,
}

/// Conflict counts by kind and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub by_type: BTreeMap<ConflictKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub total: usize,
}

impl Conflict {
    /// Two exams on the same date share `shared_students` students.
    ///
    /// `slot_id` is set when the exams also share the slot.
    pub fn student(
        exam_a: impl Into<String>,
        exam_b: impl Into<String>,
        shared_students: u32,
        date: NaiveDate,
        slot_id: Option<String>,
    ) -> Self {
        let (a, b) = (exam_a.into(), exam_b.into());
        let message = match &slot_id {
            Some(slot) => format!(
                "{shared_students} student(s) sit {a} and {b} in the same slot {slot} on {date}"
            ),
            None => format!("{shared_students} student(s) sit {a} and {b} on {date}"),
        };
        Self {
            kind: ConflictKind::Student,
            severity: Severity::Critical,
            date: Some(date),
            slot_id,
            entity_id: a.clone(),
            exam_ids: vec![a, b],
            message,
            resolved: false,
        }
    }

    /// A room hosts more than one group in one (date, slot).
    pub fn room(
        room_id: impl Into<String>,
        exam_ids: Vec<String>,
        date: NaiveDate,
        slot_id: impl Into<String>,
    ) -> Self {
        let room_id = room_id.into();
        let slot_id = slot_id.into();
        Self {
            kind: ConflictKind::Room,
            severity: Severity::Critical,
            date: Some(date),
            message: format!(
                "Room {room_id} is booked {} times in slot {slot_id} on {date}",
                exam_ids.len()
            ),
            slot_id: Some(slot_id),
            entity_id: room_id,
            exam_ids,
            resolved: false,
        }
    }

    /// A professor invigilates beyond the daily cap.
    ///
    /// One conflict is recorded per excess assignment; `nth` is the
    /// position of this assignment within the day (1-based).
    pub fn professor_overload(
        professor_id: impl Into<String>,
        exam_id: impl Into<String>,
        date: NaiveDate,
        nth: u32,
        cap: u32,
    ) -> Self {
        let professor_id = professor_id.into();
        Self {
            kind: ConflictKind::ProfessorOverload,
            severity: Severity::Major,
            date: Some(date),
            slot_id: None,
            message: format!(
                "Professor {professor_id} has invigilation #{nth} on {date} (cap {cap})"
            ),
            entity_id: professor_id,
            exam_ids: vec![exam_id.into()],
            resolved: false,
        }
    }

    /// A professor invigilates more than one room in one (date, slot).
    pub fn professor_double_booked(
        professor_id: impl Into<String>,
        exam_ids: Vec<String>,
        date: NaiveDate,
        slot_id: impl Into<String>,
    ) -> Self {
        let professor_id = professor_id.into();
        let slot_id = slot_id.into();
        Self {
            kind: ConflictKind::ProfessorOverload,
            severity: Severity::Critical,
            date: Some(date),
            message: format!(
                "Professor {professor_id} invigilates {} rooms in slot {slot_id} on {date}",
                exam_ids.len()
            ),
            slot_id: Some(slot_id),
            entity_id: professor_id,
            exam_ids,
            resolved: false,
        }
    }

    /// A room assignment has no invigilator because no professor exists.
    pub fn unstaffed(
        room_id: impl Into<String>,
        exam_id: impl Into<String>,
        date: NaiveDate,
        slot_id: impl Into<String>,
    ) -> Self {
        let room_id = room_id.into();
        let slot_id = slot_id.into();
        Self {
            kind: ConflictKind::ProfessorOverload,
            severity: Severity::Critical,
            date: Some(date),
            message: format!("Room {room_id} has no invigilator in slot {slot_id} on {date}"),
            slot_id: Some(slot_id),
            entity_id: room_id,
            exam_ids: vec![exam_id.into()],
            resolved: false,
        }
    }

    /// A group of `headcount` students sits in a room of `capacity` seats.
    ///
    /// Overruns of at most `minor_margin` (fraction of capacity) are minor,
    /// larger ones major.
    pub fn capacity(
        room_id: impl Into<String>,
        exam_id: impl Into<String>,
        headcount: u32,
        capacity: u32,
        minor_margin: f64,
        date: NaiveDate,
        slot_id: impl Into<String>,
    ) -> Self {
        let room_id = room_id.into();
        let overflow = headcount.saturating_sub(capacity);
        let severity = if f64::from(overflow) <= f64::from(capacity) * minor_margin {
            Severity::Minor
        } else {
            Severity::Major
        };
        Self {
            kind: ConflictKind::Capacity,
            severity,
            date: Some(date),
            slot_id: Some(slot_id.into()),
            message: format!(
                "Room {room_id} seats {capacity} but hosts {headcount} students (+{overflow})"
            ),
            entity_id: room_id,
            exam_ids: vec![exam_id.into()],
            resolved: false,
        }
    }
}

impl ConflictSummary {
    /// Counts conflicts by kind and severity.
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let mut summary = Self::default();
        for c in conflicts {
            *summary.by_type.entry(c.kind).or_insert(0) += 1;
            *summary.by_severity.entry(c.severity).or_insert(0) += 1;
        }
        summary.total = conflicts.len();
        summary
    }

    /// Number of conflicts of a kind.
    pub fn count(&self, kind: ConflictKind) -> usize {
        self.by_type.get(&kind).copied().unwrap_or(0)
    }

    /// Number of conflicts of a severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictKind::Student => "student",
            ConflictKind::Room => "room",
            ConflictKind::ProfessorOverload => "professor-overload",
            ConflictKind::Capacity => "capacity",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn test_capacity_severity_margin() {
        // 10% of 50 = 5 seats
        let minor = Conflict::capacity("R1", "E1", 55, 50, 0.10, day(), "S1");
        assert_eq!(minor.severity, Severity::Minor);
        let major = Conflict::capacity("R1", "E1", 56, 50, 0.10, day(), "S1");
        assert_eq!(major.severity, Severity::Major);
        assert_eq!(major.kind, ConflictKind::Capacity);
    }

    #[test]
    fn test_conflict_factories() {
        let s = Conflict::student("E1", "E2", 12, day(), None);
        assert_eq!(s.kind, ConflictKind::Student);
        assert_eq!(s.severity, Severity::Critical);
        assert_eq!(s.exam_ids, vec!["E1".to_string(), "E2".to_string()]);

        let r = Conflict::room("R1", vec!["E1".into(), "E2".into()], day(), "S1");
        assert_eq!(r.kind, ConflictKind::Room);
        assert_eq!(r.slot_id.as_deref(), Some("S1"));

        let p = Conflict::professor_overload("P1", "E1", day(), 4, 3);
        assert_eq!(p.kind, ConflictKind::ProfessorOverload);
        assert_eq!(p.severity, Severity::Major);
        assert!(!p.resolved);
    }

    #[test]
    fn test_summary_counts() {
        let conflicts = vec![
            Conflict::student("E1", "E2", 1, day(), None),
            Conflict::professor_overload("P1", "E1", day(), 4, 3),
            Conflict::professor_overload("P1", "E2", day(), 5, 3),
        ];
        let summary = ConflictSummary::from_conflicts(&conflicts);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(ConflictKind::ProfessorOverload), 2);
        assert_eq!(summary.count(ConflictKind::Room), 0);
        assert_eq!(summary.count_severity(Severity::Critical), 1);
        assert_eq!(summary.count_severity(Severity::Major), 2);
    }

    #[test]
    fn test_summary_serializes_kind_keys() {
        let summary =
            ConflictSummary::from_conflicts(&[Conflict::student("E1", "E2", 1, day(), None)]);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"student\":1"));
        assert!(json.contains("\"critical\":1"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ConflictKind::ProfessorOverload.to_string(), "professor-overload");
    }
}
