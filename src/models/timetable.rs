//! Timetable (solution) model.
//!
//! A timetable is the persisted output of one run for one session:
//! one exam per module, one room assignment per (module, group), and
//! the invigilations staffing each room.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The complete output of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    /// Session the timetable belongs to.
    pub session_id: String,
    /// One exam per module.
    pub exams: Vec<Exam>,
    /// One room assignment per (module, group).
    pub room_assignments: Vec<ExamRoomAssignment>,
    /// Invigilators staffing each room assignment.
    pub invigilations: Vec<Invigilation>,
}

/// A module's exam placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Exam identifier.
    pub id: String,
    /// Examined module.
    pub module_code: String,
    /// Owning formation (denormalized for query convenience).
    pub formation_id: String,
    /// Exam date.
    pub date: NaiveDate,
    /// Daily slot.
    pub slot_id: String,
}

/// A group seated in a room for an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRoomAssignment {
    /// Assignment identifier.
    pub id: String,
    /// Exam the group sits.
    pub exam_id: String,
    /// Seated group.
    pub group_id: String,
    /// Room hosting the group.
    pub room_id: String,
    /// Group headcount at assignment time.
    pub headcount: u32,
}

/// Role of an invigilator in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvigilatorRole {
    /// The room's responsible invigilator.
    Primary,
    /// Additional invigilator for large rooms.
    Assistant,
}

/// A professor's supervisory duty for one room assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invigilation {
    /// Staffed room assignment.
    pub assignment_id: String,
    /// Invigilating professor.
    pub professor_id: String,
    /// Role in the room.
    pub role: InvigilatorRole,
}

impl Exam {
    /// Creates an exam; the id is derived from session and module.
    pub fn new(
        session_id: &str,
        module_code: impl Into<String>,
        formation_id: impl Into<String>,
        date: NaiveDate,
        slot_id: impl Into<String>,
    ) -> Self {
        let module_code = module_code.into();
        Self {
            id: Self::make_id(session_id, &module_code),
            module_code,
            formation_id: formation_id.into(),
            date,
            slot_id: slot_id.into(),
        }
    }

    /// Exam id of a module within a session.
    pub fn make_id(session_id: &str, module_code: &str) -> String {
        format!("{session_id}/{module_code}")
    }
}

impl ExamRoomAssignment {
    /// Creates an assignment; the id is derived from exam and group.
    pub fn new(
        exam_id: impl Into<String>,
        group_id: impl Into<String>,
        room_id: impl Into<String>,
        headcount: u32,
    ) -> Self {
        let exam_id = exam_id.into();
        let group_id = group_id.into();
        Self {
            id: format!("{exam_id}/{group_id}"),
            exam_id,
            group_id,
            room_id: room_id.into(),
            headcount,
        }
    }
}

impl Invigilation {
    /// Creates a primary invigilation.
    pub fn primary(assignment_id: impl Into<String>, professor_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            professor_id: professor_id.into(),
            role: InvigilatorRole::Primary,
        }
    }

    /// Creates an assistant invigilation.
    pub fn assistant(assignment_id: impl Into<String>, professor_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            professor_id: professor_id.into(),
            role: InvigilatorRole::Assistant,
        }
    }
}

impl Timetable {
    /// Creates an empty timetable for a session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Adds an exam.
    pub fn add_exam(&mut self, exam: Exam) {
        self.exams.push(exam);
    }

    /// Adds a room assignment.
    pub fn add_room_assignment(&mut self, assignment: ExamRoomAssignment) {
        self.room_assignments.push(assignment);
    }

    /// Adds an invigilation.
    pub fn add_invigilation(&mut self, invigilation: Invigilation) {
        self.invigilations.push(invigilation);
    }

    /// Number of exams.
    pub fn exam_count(&self) -> usize {
        self.exams.len()
    }

    /// Finds an exam by id.
    pub fn exam(&self, exam_id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == exam_id)
    }

    /// Finds the exam of a module.
    pub fn exam_for_module(&self, module_code: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.module_code == module_code)
    }

    /// Returns all room assignments of an exam.
    pub fn assignments_for_exam(&self, exam_id: &str) -> Vec<&ExamRoomAssignment> {
        self.room_assignments
            .iter()
            .filter(|a| a.exam_id == exam_id)
            .collect()
    }

    /// Returns all invigilations of a room assignment.
    pub fn invigilations_for_assignment(&self, assignment_id: &str) -> Vec<&Invigilation> {
        self.invigilations
            .iter()
            .filter(|i| i.assignment_id == assignment_id)
            .collect()
    }

    /// Returns all invigilations of a professor.
    pub fn invigilations_for_professor(&self, professor_id: &str) -> Vec<&Invigilation> {
        self.invigilations
            .iter()
            .filter(|i| i.professor_id == professor_id)
            .collect()
    }

    /// Distinct exam dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.exams.iter().map(|e| e.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Index from assignment id to its exam.
    pub fn exam_by_assignment(&self) -> HashMap<&str, &Exam> {
        let exams: HashMap<&str, &Exam> = self.exams.iter().map(|e| (e.id.as_str(), e)).collect();
        self.room_assignments
            .iter()
            .filter_map(|a| exams.get(a.exam_id.as_str()).map(|e| (a.id.as_str(), *e)))
            .collect()
    }

    /// Invigilation count per professor on one date.
    pub fn daily_loads(&self, date: NaiveDate) -> HashMap<&str, u32> {
        let by_assignment = self.exam_by_assignment();
        let mut loads: HashMap<&str, u32> = HashMap::new();
        for inv in &self.invigilations {
            if by_assignment
                .get(inv.assignment_id.as_str())
                .is_some_and(|e| e.date == date)
            {
                *loads.entry(inv.professor_id.as_str()).or_insert(0) += 1;
            }
        }
        loads
    }
}
