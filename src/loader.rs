//! Input loader.
//!
//! Turns a session's raw facts into the immutable [`Snapshot`] one run
//! works on:
//! - modules examined in the session's semester,
//! - available rooms,
//! - slots in daily order,
//! - group headcounts derived from enrollments where undeclared,
//! - exam days of the session calendar.
//!
//! Every collection is sorted by identifier so that runs over unchanged
//! data see the same order.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::{MissingData, Result, TimetableError};
use crate::models::{
    Enrollment, Formation, Group, Module, Professor, Room, Session, SessionData, SlotKey, TimeSlot,
};
use crate::store::SnapshotSource;
use crate::validation::validate_session;

/// Consistent, ordered input of one scheduling run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub session: Session,
    /// Exam days, ascending.
    pub exam_days: Vec<NaiveDate>,
    pub formations: Vec<Formation>,
    pub groups: Vec<Group>,
    /// Modules requiring an exam this session, by code.
    pub modules: Vec<Module>,
    /// Available rooms, by id.
    pub rooms: Vec<Room>,
    /// Slots in daily order.
    pub slots: Vec<TimeSlot>,
    pub professors: Vec<Professor>,
    /// Enrollments in the loaded modules.
    pub enrollments: Vec<Enrollment>,
}

/// Loads the snapshot of a session from a source.
///
/// # Errors
/// - `SessionNotFound` if the source does not know the session.
/// - `DataIncomplete` if no room, slot, or exam day is usable.
/// - `InvalidInput` if the facts are inconsistent.
pub fn load_snapshot<S: SnapshotSource + ?Sized>(source: &S, session_id: &str) -> Result<Snapshot> {
    let data = source
        .session_data(session_id)?
        .ok_or_else(|| TimetableError::SessionNotFound(session_id.to_string()))?;
    Snapshot::from_data(data)
}

impl Snapshot {
    /// Builds a snapshot from raw session facts.
    pub fn from_data(data: SessionData) -> Result<Self> {
        let session_id = data.session.id.clone();
        let incomplete = |missing: MissingData| {
            warn!(event = "loader.incomplete", session_id = %session_id, missing = %missing);
            TimetableError::DataIncomplete {
                session_id: session_id.clone(),
                missing,
            }
        };

        if !data.rooms.iter().any(|r| r.available) {
            return Err(incomplete(MissingData::Rooms));
        }
        if data.slots.is_empty() {
            return Err(incomplete(MissingData::Slots));
        }
        let exam_days = data.session.exam_days();
        if exam_days.is_empty() {
            return Err(incomplete(MissingData::ExamDays));
        }

        validate_session(&data).map_err(TimetableError::InvalidInput)?;

        let SessionData {
            session,
            mut formations,
            mut groups,
            modules,
            rooms,
            mut slots,
            mut professors,
            enrollments,
        } = data;

        let mut modules: Vec<Module> = modules
            .into_iter()
            .filter(|m| m.requires_exam && m.semester == session.semester)
            .collect();
        modules.sort_by(|a, b| a.code.cmp(&b.code));

        let loaded: HashSet<&str> = modules.iter().map(|m| m.code.as_str()).collect();
        let mut enrollments: Vec<Enrollment> = enrollments
            .into_iter()
            .filter(|e| loaded.contains(e.module_code.as_str()))
            .collect();
        enrollments.sort_by(|a, b| {
            (&a.module_code, &a.group_id, &a.student_id).cmp(&(
                &b.module_code,
                &b.group_id,
                &b.student_id,
            ))
        });
        enrollments.dedup();

        derive_headcounts(&mut groups, &enrollments);

        let mut rooms: Vec<Room> = rooms.into_iter().filter(|r| r.available).collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        slots.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));
        formations.sort_by(|a, b| a.id.cmp(&b.id));
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        professors.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            event = "loader.snapshot",
            session_id = %session.id,
            modules = modules.len(),
            groups = groups.len(),
            rooms = rooms.len(),
            slots = slots.len(),
            exam_days = exam_days.len(),
            professors = professors.len(),
            enrollments = enrollments.len(),
        );

        Ok(Self {
            session,
            exam_days,
            formations,
            groups,
            modules,
            rooms,
            slots,
            professors,
            enrollments,
        })
    }

    /// Session identifier.
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Groups of a formation, by id.
    pub fn groups_of(&self, formation_id: &str) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|g| g.formation_id == formation_id)
            .collect()
    }

    /// Finds a formation.
    pub fn formation(&self, formation_id: &str) -> Option<&Formation> {
        self.formations.iter().find(|f| f.id == formation_id)
    }

    /// Department owning a module (through its formation).
    pub fn module_department(&self, module: &Module) -> Option<&str> {
        self.formation(&module.formation_id)
            .map(|f| f.department_id.as_str())
    }

    /// Finds a room.
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    /// Finds a group.
    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Position of a slot within the day.
    pub fn slot_index(&self, slot_id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.id == slot_id)
    }

    /// Every (date, slot) of the session, date-major.
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        self.exam_days
            .iter()
            .flat_map(|&d| (0..self.slots.len()).map(move |i| SlotKey::new(d, i)))
            .collect()
    }
}

/// Sets undeclared (zero) headcounts to the number of distinct students
/// enrolled through the group.
fn derive_headcounts(groups: &mut [Group], enrollments: &[Enrollment]) {
    let mut students: HashMap<&str, HashSet<&str>> = HashMap::new();
    for e in enrollments {
        students
            .entry(e.group_id.as_str())
            .or_default()
            .insert(e.student_id.as_str());
    }
    for group in groups.iter_mut().filter(|g| g.headcount == 0) {
        group.headcount = students
            .get(group.id.as_str())
            .map(|s| s.len() as u32)
            .unwrap_or(0);
    }
}
