//! Resource models: rooms and professors.
//!
//! Rooms host one group per (date, slot); professors invigilate one room
//! per (date, slot) and at most a configured number of rooms per day.

use serde::{Deserialize, Serialize};

/// An examination room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Seats available for an exam.
    pub capacity: u32,
    /// Whether the room may be used in this session.
    #[serde(default = "default_available")]
    pub available: bool,
}

/// A professor who may invigilate exams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professor {
    /// Unique professor identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Department the professor belongs to.
    pub department_id: String,
}

fn default_available() -> bool {
    true
}

impl Room {
    /// Creates an available room.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity,
            available: true,
        }
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the room as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Whether the room seats `headcount` students.
    #[inline]
    pub fn fits(&self, headcount: u32) -> bool {
        self.capacity >= headcount
    }
}

impl Professor {
    /// Creates a new professor.
    pub fn new(id: impl Into<String>, department_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department_id: department_id.into(),
        }
    }

    /// Sets the professor name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
