//! Error types for timetable runs.
//!
//! Only fatal conditions are errors. Constraint violations found while
//! scheduling (placement overflow, capacity overflow, invigilator
//! overload) are recorded as [`Conflict`](crate::models::Conflict)s.

use thiserror::Error;

use crate::validation::ValidationError;

/// Fatal errors that stop a run or an audit.
#[derive(Error, Debug)]
pub enum TimetableError {
    /// Scheduling is impossible with the loaded data.
    #[error("incomplete data for session {session_id}: {missing}")]
    DataIncomplete {
        session_id: String,
        missing: MissingData,
    },

    /// The source has no record of the session.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session data is structurally inconsistent.
    #[error("invalid input: {} problem(s), first: {}", .0.len(), first_message(.0))]
    InvalidInput(Vec<ValidationError>),

    /// No persisted timetable exists for the session.
    #[error("no timetable stored for session {0}")]
    TimetableNotFound(String),

    /// The atomic write of results failed; prior results are intact.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

/// What is missing for a session to be schedulable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingData {
    /// No available room.
    Rooms,
    /// No time slot.
    Slots,
    /// The session range holds no exam day.
    ExamDays,
}

impl std::fmt::Display for MissingData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingData::Rooms => write!(f, "no usable rooms"),
            MissingData::Slots => write!(f, "no time slots"),
            MissingData::ExamDays => write!(f, "no exam days in the session range"),
        }
    }
}

/// Errors raised by snapshot sources and timetable stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// A write was rejected; nothing was changed.
    #[error("write rejected for session {session_id}: {reason}")]
    Rejected { session_id: String, reason: String },

    /// Backend-specific failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}

/// Result alias for timetable operations.
pub type Result<T> = std::result::Result<T, TimetableError>;
