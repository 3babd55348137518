//! Greedy timetable construction and KPI evaluation.
//!
//! A run chains three passes over one [`Snapshot`](crate::loader::Snapshot):
//!
//! 1. [`SlotAllocator`] places each module on a (date, slot).
//! 2. [`RoomAssigner`] seats each (module, group) in a room.
//! 3. [`InvigilatorAssigner`] staffs each room with a professor.
//!
//! Each pass always completes; what it cannot satisfy is returned as
//! [`Conflict`](crate::models::Conflict) values instead of an error.
//!
//! # KPI
//!
//! `TimetableKpi` computes success rate, calendar spread, room fill and
//! invigilation balance.
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination timetabling: algorithmic
//!   strategies and applications"
//! - Qu et al. (2009), "A survey of search methodologies and automated
//!   system development for examination timetabling"

mod allocator;
mod conflict_graph;
mod invigilators;
mod kpi;
mod rooms;

pub use allocator::{Placement, PlacementMode, SlotAllocation, SlotAllocator};
pub use conflict_graph::ConflictGraph;
pub use invigilators::InvigilatorAssigner;
pub use kpi::TimetableKpi;
pub use rooms::RoomAssigner;
