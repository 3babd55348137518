//! Conflict auditor.
//!
//! Re-derives every residual violation of a timetable from the timetable
//! and its input alone, independent of how the timetable was produced.
//! The same timetable always yields the same, sorted conflict list, so
//! auditing twice is idempotent.
//!
//! # Checks
//!
//! | Check | Kind | Severity |
//! |-------|------|----------|
//! | Students sit more exams on a date than allowed | student | critical |
//! | Room hosts two groups in one slot | room | critical |
//! | Professor invigilates beyond the daily cap | professor-overload | major, one per excess |
//! | Professor invigilates two rooms in one slot | professor-overload | critical |
//! | Room assignment without an invigilator | professor-overload | critical |
//! | Group larger than its room | capacity | minor within margin, else major |

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::EngineConfig;
use crate::loader::Snapshot;
use crate::models::{Conflict, Exam, InvigilatorRole, Timetable};
use crate::scheduler::ConflictGraph;

/// Someone sitting a set of exams: an enrolled student, or with formation
/// coupling, the whole cohort of a formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Attendee<'a> {
    Student(&'a str),
    Formation(&'a str),
}

/// Stateless timetable verifier.
#[derive(Debug, Clone)]
pub struct ConflictAuditor {
    student_daily_cap: u32,
    professor_daily_cap: u32,
    minor_capacity_margin: f64,
    couple_formations: bool,
}

impl ConflictAuditor {
    /// Creates an auditor applying the configuration's limits.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            student_daily_cap: config.student_daily_cap.max(1),
            professor_daily_cap: config.professor_daily_cap,
            minor_capacity_margin: config.minor_capacity_margin,
            couple_formations: config.couple_formation_modules,
        }
    }

    /// Lists every violation in `timetable`, sorted.
    pub fn audit(&self, snapshot: &Snapshot, timetable: &Timetable) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        self.check_students(snapshot, timetable, &mut conflicts);
        self.check_rooms(timetable, &mut conflicts);
        self.check_professors(snapshot, timetable, &mut conflicts);
        self.check_capacity(snapshot, timetable, &mut conflicts);
        conflicts.sort();
        conflicts
    }

    /// Exam pairs shared by an attendee who sits more exams on their date
    /// than the cap allows, or who sits both in the same slot.
    fn check_students(&self, snapshot: &Snapshot, timetable: &Timetable, out: &mut Vec<Conflict>) {
        let graph = ConflictGraph::build(snapshot, self.couple_formations);
        let index: HashMap<&str, usize> = snapshot
            .modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.code.as_str(), i))
            .collect();
        let placed: HashMap<usize, &Exam> = timetable
            .exams
            .iter()
            .filter_map(|e| index.get(e.module_code.as_str()).map(|&m| (m, e)))
            .collect();

        let mut sits: BTreeMap<Attendee<'_>, Vec<usize>> = BTreeMap::new();
        for e in &snapshot.enrollments {
            if let Some(&m) = index.get(e.module_code.as_str()) {
                sits.entry(Attendee::Student(&e.student_id)).or_default().push(m);
            }
        }
        if self.couple_formations {
            for (m, module) in snapshot.modules.iter().enumerate() {
                sits.entry(Attendee::Formation(&module.formation_id))
                    .or_default()
                    .push(m);
            }
        }

        let cap = self.student_daily_cap as usize;
        let mut clashes: BTreeSet<(usize, usize)> = BTreeSet::new();
        for modules in sits.values_mut() {
            modules.sort_unstable();
            modules.dedup();
            let mut by_date: BTreeMap<NaiveDate, Vec<(usize, &Exam)>> = BTreeMap::new();
            for &m in modules.iter() {
                if let Some(&exam) = placed.get(&m) {
                    by_date.entry(exam.date).or_default().push((m, exam));
                }
            }
            for day in by_date.values() {
                let over_cap = day.len() > cap;
                for (i, (a, exam_a)) in day.iter().enumerate() {
                    for (b, exam_b) in &day[i + 1..] {
                        if over_cap || exam_a.slot_id == exam_b.slot_id {
                            clashes.insert((*a, *b));
                        }
                    }
                }
            }
        }

        for (a, b) in clashes {
            let (Some(exam_a), Some(exam_b)) = (placed.get(&a), placed.get(&b)) else {
                continue;
            };
            let same_slot = exam_a.slot_id == exam_b.slot_id;
            out.push(Conflict::student(
                &exam_a.id,
                &exam_b.id,
                graph.shared(a, b).max(1),
                exam_a.date,
                same_slot.then(|| exam_a.slot_id.clone()),
            ));
        }
    }

    fn check_rooms(&self, timetable: &Timetable, out: &mut Vec<Conflict>) {
        let exams = timetable.exam_by_assignment();
        let mut bookings: BTreeMap<(NaiveDate, &str, &str), Vec<String>> = BTreeMap::new();
        for a in &timetable.room_assignments {
            if let Some(exam) = exams.get(a.id.as_str()) {
                bookings
                    .entry((exam.date, exam.slot_id.as_str(), a.room_id.as_str()))
                    .or_default()
                    .push(a.exam_id.clone());
            }
        }
        for ((date, slot_id, room_id), mut exam_ids) in bookings {
            if exam_ids.len() > 1 {
                exam_ids.sort();
                out.push(Conflict::room(room_id, exam_ids, date, slot_id));
            }
        }
    }

    fn check_professors(&self, snapshot: &Snapshot, timetable: &Timetable, out: &mut Vec<Conflict>) {
        let exams = timetable.exam_by_assignment();
        let slot_order = |slot_id: &str| snapshot.slot_index(slot_id).unwrap_or(usize::MAX);

        // (professor, date) → [(slot order, slot id, assignment id, exam id)]
        let mut duties: BTreeMap<(&str, NaiveDate), Vec<(usize, &str, &str, &str)>> =
            BTreeMap::new();
        for inv in &timetable.invigilations {
            if let Some(exam) = exams.get(inv.assignment_id.as_str()) {
                duties
                    .entry((inv.professor_id.as_str(), exam.date))
                    .or_default()
                    .push((
                        slot_order(&exam.slot_id),
                        exam.slot_id.as_str(),
                        inv.assignment_id.as_str(),
                        exam.id.as_str(),
                    ));
            }
        }

        for ((professor_id, date), mut day) in duties {
            day.sort();
            for (n, (_, _, _, exam_id)) in day.iter().enumerate() {
                let nth = n as u32 + 1;
                if nth > self.professor_daily_cap {
                    out.push(Conflict::professor_overload(
                        professor_id,
                        *exam_id,
                        date,
                        nth,
                        self.professor_daily_cap,
                    ));
                }
            }

            let mut by_slot: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for (_, slot_id, _, exam_id) in &day {
                by_slot.entry(*slot_id).or_default().push(exam_id.to_string());
            }
            for (slot_id, exam_ids) in by_slot {
                if exam_ids.len() > 1 {
                    out.push(Conflict::professor_double_booked(
                        professor_id,
                        exam_ids,
                        date,
                        slot_id,
                    ));
                }
            }
        }

        let staffed: HashSet<&str> = timetable
            .invigilations
            .iter()
            .filter(|i| i.role == InvigilatorRole::Primary)
            .map(|i| i.assignment_id.as_str())
            .collect();
        for a in &timetable.room_assignments {
            if staffed.contains(a.id.as_str()) {
                continue;
            }
            if let Some(exam) = exams.get(a.id.as_str()) {
                out.push(Conflict::unstaffed(&a.room_id, &a.exam_id, exam.date, &exam.slot_id));
            }
        }
    }

    fn check_capacity(&self, snapshot: &Snapshot, timetable: &Timetable, out: &mut Vec<Conflict>) {
        let exams = timetable.exam_by_assignment();
        for a in &timetable.room_assignments {
            let (Some(exam), Some(room)) = (exams.get(a.id.as_str()), snapshot.room(&a.room_id))
            else {
                continue;
            };
            if !room.fits(a.headcount) {
                out.push(Conflict::capacity(
                    &room.id,
                    &a.exam_id,
                    a.headcount,
                    room.capacity,
                    self.minor_capacity_margin,
                    exam.date,
                    &exam.slot_id,
                ));
            }
        }
    }
}
