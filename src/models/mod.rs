//! Examination timetabling domain models.
//!
//! Provides the input facts of a session and the output rows of a run.
//!
//! # Domain Mappings
//!
//! | u-timetable | Scheduling role |
//! |-------------|-----------------|
//! | Module | Task (one exam to place) |
//! | Group | Sub-task sharing the task's start |
//! | Room | Disjunctive resource with capacity |
//! | Professor | Human resource with a daily budget |
//! | (date, TimeSlot) | Discrete time bucket |
//! | Timetable | Schedule |
//! | Conflict | Violation |

mod conflict;
mod formation;
mod input;
mod resource;
mod session;
mod slot;
mod timetable;

pub use conflict::{Conflict, ConflictKind, ConflictSummary, Severity};
pub use formation::{Enrollment, Formation, Group, Module};
pub use input::SessionData;
pub use resource::{Professor, Room};
pub use session::Session;
pub use slot::{SlotKey, TimeSlot};
pub use timetable::{Exam, ExamRoomAssignment, Invigilation, InvigilatorRole, Timetable};
