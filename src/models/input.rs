//! Raw session input record.
//!
//! The facts the surrounding administrative system holds for one session,
//! as exchanged with a [`SnapshotSource`](crate::store::SnapshotSource).
//! The loader turns it into a filtered, ordered [`Snapshot`](crate::loader::Snapshot).

use serde::{Deserialize, Serialize};

use super::{Enrollment, Formation, Group, Module, Professor, Room, Session, TimeSlot};

/// Everything known about a session before scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub session: Session,
    #[serde(default)]
    pub formations: Vec<Formation>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
    #[serde(default)]
    pub professors: Vec<Professor>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl SessionData {
    /// Creates an empty record for a session.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            formations: Vec::new(),
            groups: Vec::new(),
            modules: Vec::new(),
            rooms: Vec::new(),
            slots: Vec::new(),
            professors: Vec::new(),
            enrollments: Vec::new(),
        }
    }

    /// Adds a formation.
    pub fn with_formation(mut self, formation: Formation) -> Self {
        self.formations.push(formation);
        self
    }

    /// Adds a group.
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a module.
    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a time slot.
    pub fn with_slot(mut self, slot: TimeSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Adds a professor.
    pub fn with_professor(mut self, professor: Professor) -> Self {
        self.professors.push(professor);
        self
    }

    /// Adds an enrollment.
    pub fn with_enrollment(mut self, enrollment: Enrollment) -> Self {
        self.enrollments.push(enrollment);
        self
    }

    /// Session identifier.
    pub fn session_id(&self) -> &str {
        &self.session.id
    }
}
