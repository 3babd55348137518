//! Examination timetabling engine.
//!
//! Assigns a session's exams to dates and time slots, seats every group
//! in a room, staffs every room with an invigilator, and audits the
//! result for residual conflicts. A run always produces a complete
//! timetable; what cannot be satisfied is recorded as a conflict instead
//! of failing the run.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Session`, `Formation`, `Group`, `Module`,
//!   `Room`, `Professor`, `TimeSlot`, `Timetable`, `Conflict`
//! - **`loader`**: Session facts → ordered, immutable `Snapshot`
//! - **`dispatching`**: Placement ordering rules and rule engine
//! - **`scheduler`**: Slot allocator, room assigner, invigilator assigner, KPIs
//! - **`audit`**: Post-hoc conflict detection
//! - **`engine`**: `run` and `audit` over a source and a store
//! - **`store`**: Input/output seams and the in-memory store
//! - **`generator`**: Seeded synthetic sessions
//! - **`validation`**: Input integrity checks (duplicate ids, dangling refs)
//!
//! # Pipeline
//!
//! ```text
//! SnapshotSource ─► loader ─► SlotAllocator ─► RoomAssigner ─► InvigilatorAssigner
//!                                                                   │
//!                  TimetableStore ◄── ConflictAuditor ◄─────────────┘
//! ```
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination timetabling: algorithmic
//!   strategies and applications"
//! - Qu et al. (2009), "A survey of search methodologies and automated
//!   system development for examination timetabling"
//! - Brélaz (1979), "New methods to color the vertices of a graph"

pub mod audit;
pub mod config;
pub mod dispatching;
pub mod engine;
pub mod error;
pub mod generator;
pub mod loader;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use audit::ConflictAuditor;
pub use config::{ConfigError, EngineConfig};
pub use engine::{RunReport, ScheduleOutcome, TimetableEngine};
pub use error::{MissingData, Result, StoreError, TimetableError};
pub use loader::{load_snapshot, Snapshot};
pub use models::{Conflict, ConflictKind, ConflictSummary, SessionData, Severity, Timetable};
pub use store::{MemoryStore, SnapshotSource, TimetableStore};
