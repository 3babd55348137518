//! Invigilator assigner: room assignment → professor(s).
//!
//! # Algorithm
//!
//! Room assignments are staffed slot by slot in (date, slot) order. For
//! each room the primary invigilator is the first of:
//!
//! 1. an *eligible* professor: free in the slot and below the daily cap,
//!    preferring the module's department, then the lowest session load,
//!    then the lowest daily load, then id;
//! 2. the least-loaded professor free in the slot, beyond the daily cap
//!    (one overload conflict per excess invigilation);
//! 3. the least-loaded professor overall, double-booked in the slot
//!    (critical conflict).
//!
//! With an assistant threshold, rooms above it get one assistant per
//! additional threshold's worth of students, drawn from eligible
//! professors only.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::config::EngineConfig;
use crate::loader::Snapshot;
use crate::models::{Conflict, Invigilation, Professor, Timetable};

/// Load-balancing invigilator assigner.
#[derive(Debug, Clone)]
pub struct InvigilatorAssigner {
    daily_cap: u32,
    assistant_threshold: Option<u32>,
}

/// A room assignment to staff.
struct Post<'t> {
    assignment_id: &'t str,
    exam_id: &'t str,
    room_id: &'t str,
    headcount: u32,
    department: Option<&'t str>,
}

/// Invigilation counts while staffing.
#[derive(Default)]
struct Loads<'s> {
    daily: HashMap<(NaiveDate, &'s str), u32>,
    total: HashMap<&'s str, u32>,
}

impl<'s> Loads<'s> {
    fn daily(&self, date: NaiveDate, professor: &str) -> u32 {
        self.daily.get(&(date, professor)).copied().unwrap_or(0)
    }

    fn total(&self, professor: &str) -> u32 {
        self.total.get(professor).copied().unwrap_or(0)
    }

    fn add(&mut self, date: NaiveDate, professor: &'s str) -> u32 {
        *self.total.entry(professor).or_insert(0) += 1;
        let daily = self.daily.entry((date, professor)).or_insert(0);
        *daily += 1;
        *daily
    }
}

impl InvigilatorAssigner {
    /// Creates an invigilator assigner from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            daily_cap: config.professor_daily_cap,
            assistant_threshold: config.assistant_threshold.filter(|&t| t > 0),
        }
    }

    /// Assistants required for a room of `headcount` students.
    pub fn assistants_for(&self, headcount: u32) -> u32 {
        match self.assistant_threshold {
            Some(t) => headcount.div_ceil(t).saturating_sub(1),
            None => 0,
        }
    }

    /// Staffs every room assignment of `timetable`.
    ///
    /// Invigilations are appended to `timetable`; violations are returned.
    pub fn assign(&self, snapshot: &Snapshot, timetable: &mut Timetable) -> Vec<Conflict> {
        let departments: HashMap<&str, &str> = snapshot
            .modules
            .iter()
            .filter_map(|m| snapshot.module_department(m).map(|d| (m.code.as_str(), d)))
            .collect();
        let exams = timetable.exam_by_assignment();

        let mut by_slot: BTreeMap<(NaiveDate, usize), (&str, Vec<Post<'_>>)> = BTreeMap::new();
        for a in &timetable.room_assignments {
            let Some(exam) = exams.get(a.id.as_str()) else {
                continue;
            };
            let Some(slot_index) = snapshot.slot_index(&exam.slot_id) else {
                continue;
            };
            by_slot
                .entry((exam.date, slot_index))
                .or_insert_with(|| (exam.slot_id.as_str(), Vec::new()))
                .1
                .push(Post {
                    assignment_id: &a.id,
                    exam_id: &a.exam_id,
                    room_id: &a.room_id,
                    headcount: a.headcount,
                    department: departments.get(exam.module_code.as_str()).copied(),
                });
        }

        let mut loads = Loads::default();
        let mut invigilations = Vec::new();
        let mut conflicts = Vec::new();
        for ((date, _), (slot_id, rooms)) in &by_slot {
            self.staff_slot(
                &snapshot.professors,
                *date,
                slot_id,
                rooms,
                &mut loads,
                &mut invigilations,
                &mut conflicts,
            );
        }

        debug!(
            event = "invigilators.assigned",
            session_id = %snapshot.session_id(),
            invigilations = invigilations.len(),
            conflicts = conflicts.len(),
        );

        for inv in invigilations {
            timetable.add_invigilation(inv);
        }
        conflicts
    }

    #[allow(clippy::too_many_arguments)]
    fn staff_slot<'s>(
        &self,
        professors: &'s [Professor],
        date: NaiveDate,
        slot_id: &str,
        rooms: &[Post<'_>],
        loads: &mut Loads<'s>,
        invigilations: &mut Vec<Invigilation>,
        conflicts: &mut Vec<Conflict>,
    ) {
        let mut busy: BTreeMap<&'s str, Vec<String>> = BTreeMap::new();

        for room in rooms {
            let is_free = |p: &Professor| !busy.contains_key(p.id.as_str());
            let under_cap = |p: &Professor| loads.daily(date, &p.id) < self.daily_cap;
            let least_loaded =
                |(i, p): &(usize, &Professor)| (loads.daily(date, &p.id), loads.total(&p.id), *i);

            // Professors are sorted by id, so the index breaks ties by id.
            let primary = professors
                .iter()
                .enumerate()
                .filter(|(_, p)| is_free(*p) && under_cap(*p))
                .min_by_key(|(i, p)| {
                    (
                        room.department != Some(p.department_id.as_str()),
                        loads.total(&p.id),
                        loads.daily(date, &p.id),
                        *i,
                    )
                })
                .or_else(|| {
                    professors
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| is_free(*p))
                        .min_by_key(least_loaded)
                })
                .or_else(|| professors.iter().enumerate().min_by_key(least_loaded))
                .map(|(_, p)| p);
            let Some(primary) = primary else {
                conflicts.push(Conflict::unstaffed(room.room_id, room.exam_id, date, slot_id));
                continue;
            };

            self.book(primary, room, date, slot_id, loads, &mut busy, conflicts);
            invigilations.push(Invigilation::primary(room.assignment_id, &primary.id));

            for _ in 0..self.assistants_for(room.headcount) {
                let Some((_, assistant)) = professors
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !busy.contains_key(p.id.as_str()))
                    .filter(|(_, p)| loads.daily(date, &p.id) < self.daily_cap)
                    .min_by_key(|(i, p)| (loads.total(&p.id), *i))
                else {
                    debug!(room = room.room_id, %date, slot = slot_id, "no assistant available");
                    break;
                };
                self.book(assistant, room, date, slot_id, loads, &mut busy, conflicts);
                invigilations.push(Invigilation::assistant(room.assignment_id, &assistant.id));
            }
        }
    }

    /// Records one invigilation and the conflicts it causes.
    #[allow(clippy::too_many_arguments)]
    fn book<'s>(
        &self,
        professor: &'s Professor,
        room: &Post<'_>,
        date: NaiveDate,
        slot_id: &str,
        loads: &mut Loads<'s>,
        busy: &mut BTreeMap<&'s str, Vec<String>>,
        conflicts: &mut Vec<Conflict>,
    ) {
        let daily = loads.add(date, &professor.id);
        if daily > self.daily_cap {
            conflicts.push(Conflict::professor_overload(
                &professor.id,
                room.exam_id,
                date,
                daily,
                self.daily_cap,
            ));
        }

        let rooms = busy.entry(professor.id.as_str()).or_default();
        rooms.push(room.exam_id.to_string());
        if rooms.len() > 1 {
            conflicts.push(Conflict::professor_double_booked(
                &professor.id,
                rooms.clone(),
                date,
                slot_id,
            ));
        }
    }
}
