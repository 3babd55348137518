//! Room assigner: (module, group) → room.
//!
//! # Algorithm
//!
//! Per (date, slot), every group sitting an exam there is seated
//! largest-headcount-first into the smallest free room that holds it
//! (best-fit decreasing). A taken room leaves the candidate pool at once,
//! so no room hosts two groups of one slot while a free room exists.
//!
//! | Situation | Room | Conflict |
//! |-----------|------|----------|
//! | A free room fits | smallest fitting | none |
//! | Free rooms, none fits | largest free | capacity |
//! | No free room | largest overall | room (+ capacity if short) |
//!
//! # Reference
//! Coffman, Garey & Johnson (1996), "Approximation algorithms for bin
//! packing: a survey"

use std::collections::BTreeMap;
use tracing::debug;

use super::SlotAllocation;
use crate::config::EngineConfig;
use crate::loader::Snapshot;
use crate::models::{Conflict, Exam, ExamRoomAssignment, Group, Module, Room, SlotKey, Timetable};

/// Best-fit room assigner.
#[derive(Debug, Clone)]
pub struct RoomAssigner {
    minor_capacity_margin: f64,
}

impl RoomAssigner {
    /// Creates a room assigner from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            minor_capacity_margin: config.minor_capacity_margin,
        }
    }

    /// Seats every group of every placed module.
    ///
    /// Room assignments are appended to `timetable`; violations are
    /// returned.
    pub fn assign(
        &self,
        snapshot: &Snapshot,
        allocation: &SlotAllocation,
        timetable: &mut Timetable,
    ) -> Vec<Conflict> {
        let mut by_key: BTreeMap<SlotKey, Vec<usize>> = BTreeMap::new();
        for &m in &allocation.order {
            if let Some(p) = allocation.placement(m) {
                by_key.entry(p.key).or_default().push(m);
            }
        }

        let mut conflicts = Vec::new();
        for (key, modules) in &by_key {
            self.assign_slot(snapshot, *key, modules, timetable, &mut conflicts);
        }

        debug!(
            event = "rooms.assigned",
            session_id = %snapshot.session_id(),
            slots = by_key.len(),
            assignments = timetable.room_assignments.len(),
            conflicts = conflicts.len(),
        );

        conflicts
    }

    fn assign_slot(
        &self,
        snapshot: &Snapshot,
        key: SlotKey,
        modules: &[usize],
        timetable: &mut Timetable,
        conflicts: &mut Vec<Conflict>,
    ) {
        let session_id = snapshot.session_id();
        let slot_id = &snapshot.slots[key.slot_index].id;

        let mut seats: Vec<(&Module, &Group)> = modules
            .iter()
            .flat_map(|&m| {
                let module = &snapshot.modules[m];
                snapshot
                    .groups_of(&module.formation_id)
                    .into_iter()
                    .map(move |g| (module, g))
            })
            .collect();
        seats.sort_by(|a, b| {
            b.1.headcount
                .cmp(&a.1.headcount)
                .then_with(|| a.1.id.cmp(&b.1.id))
                .then_with(|| a.0.code.cmp(&b.0.code))
        });

        let mut free: Vec<&Room> = snapshot.rooms.iter().collect();
        free.sort_by(|a, b| (a.capacity, &a.id).cmp(&(b.capacity, &b.id)));
        let mut booked: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for (module, group) in seats {
            let Some(room) = pick_room(&snapshot.rooms, &mut free, group.headcount) else {
                continue;
            };
            let exam_id = Exam::make_id(session_id, &module.code);

            let exams_in_room = booked.entry(room.id.as_str()).or_default();
            exams_in_room.push(exam_id.clone());
            if exams_in_room.len() > 1 {
                conflicts.push(Conflict::room(
                    &room.id,
                    exams_in_room.clone(),
                    key.date,
                    slot_id,
                ));
            }
            if !room.fits(group.headcount) {
                conflicts.push(Conflict::capacity(
                    &room.id,
                    &exam_id,
                    group.headcount,
                    room.capacity,
                    self.minor_capacity_margin,
                    key.date,
                    slot_id,
                ));
            }

            timetable.add_room_assignment(ExamRoomAssignment::new(
                exam_id,
                &group.id,
                &room.id,
                group.headcount,
            ));
        }
    }
}

/// Takes a room out of `free` (sorted by capacity, then id).
fn pick_room<'a>(rooms: &'a [Room], free: &mut Vec<&'a Room>, headcount: u32) -> Option<&'a Room> {
    if let Some(pos) = free.iter().position(|r| r.fits(headcount)) {
        return Some(free.remove(pos));
    }
    if let Some(room) = free.pop() {
        return Some(room);
    }
    rooms
        .iter()
        .max_by(|a, b| a.capacity.cmp(&b.capacity).then_with(|| b.id.cmp(&a.id)))
}
