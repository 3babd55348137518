//! Slot allocator: module → (date, slot).
//!
//! # Algorithm
//!
//! 1. Order modules most-constrained-first with the rule engine
//!    (conflict degree, groups, shared students, headcount, code).
//! 2. For each module, scan (date, slot) date-major. A position is
//!    *clean* if no neighbor in the conflict graph sits in the same slot,
//!    placing the module keeps its students within the daily cap, and the
//!    slot still has a room and an invigilator for every group.
//!    The first clean position on a day below the exams-per-day ceiling
//!    wins; otherwise the first clean position.
//! 3. Without a clean position, take the least-violating one (fewest
//!    students sharing the slot, then sharing the day, then fewest
//!    missing rooms) and record a student conflict per clashing neighbor.
//! 4. Once the elapsed time passes `fallback_after`, the remaining modules
//!    are placed round-robin over dates × slots without search; clashes
//!    are still recorded.
//!
//! Scans and tie-breaks follow snapshot order, so identical input gives
//! an identical placement.
//!
//! # Complexity
//! O(n · p · d) where n = modules, p = positions, d = max conflict degree.
//!
//! # Reference
//! Carter, Laporte & Lee (1996), "Examination timetabling: algorithmic
//! strategies and applications"

use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::ConflictGraph;
use crate::config::EngineConfig;
use crate::dispatching::{ModuleDemand, RuleEngine};
use crate::loader::Snapshot;
use crate::models::{Conflict, Exam, SlotKey, Timetable};

/// How a module's position was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// A clean position was found by search.
    Clean,
    /// No clean position existed; the least-violating one was taken.
    Relaxed,
    /// Placed round-robin after the time budget ran out.
    Fallback,
}

/// A module's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index in `Snapshot::modules`.
    pub module: usize,
    /// Date and slot.
    pub key: SlotKey,
    /// How the position was found.
    pub mode: PlacementMode,
}

/// Output of the allocator.
#[derive(Debug, Clone, Default)]
pub struct SlotAllocation {
    /// One placement per module, indexed by module (`placements[i].module == i`).
    pub placements: Vec<Placement>,
    /// Module indices in the order they were placed.
    pub order: Vec<usize>,
    /// Student conflicts left by relaxed and fallback placements.
    pub conflicts: Vec<Conflict>,
}

impl SlotAllocation {
    /// Number of placements made in a given mode.
    pub fn count(&self, mode: PlacementMode) -> usize {
        self.placements.iter().filter(|p| p.mode == mode).count()
    }

    /// Placement of a module.
    pub fn placement(&self, module: usize) -> Option<&Placement> {
        self.placements.get(module)
    }

    /// One exam per placement, in module order.
    pub fn to_timetable(&self, snapshot: &Snapshot) -> Timetable {
        let session_id = snapshot.session_id();
        let mut timetable = Timetable::new(session_id);
        for p in &self.placements {
            let module = &snapshot.modules[p.module];
            timetable.add_exam(Exam::new(
                session_id,
                &module.code,
                &module.formation_id,
                p.key.date,
                &snapshot.slots[p.key.slot_index].id,
            ));
        }
        timetable
    }
}

/// Greedy most-constrained-first slot allocator.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    rule_engine: RuleEngine,
    student_daily_cap: u32,
    max_exams_per_day: Option<u32>,
    fallback_after: Duration,
}

/// Violation measure of a candidate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    /// Students shared with neighbors in the very same slot.
    same_slot: u64,
    /// Students shared with clashing neighbors on the date.
    shared_students: u64,
    /// Groups without a free room or invigilator in the slot.
    missing_rooms: usize,
}

impl Cost {
    fn is_clean(&self) -> bool {
        self.same_slot == 0 && self.shared_students == 0 && self.missing_rooms == 0
    }
}

/// Occupancy bookkeeping while placing.
///
/// Positions index `keys`, which is date-major, so a position's day is
/// `position / slots_per_day`.
struct Occupancy {
    keys: Vec<SlotKey>,
    days: Vec<NaiveDate>,
    slots_per_day: usize,
    position: Vec<Option<SlotKey>>,
    on_day: Vec<Vec<usize>>,
    groups_at: HashMap<SlotKey, usize>,
    exams_per_day: Vec<u32>,
    slot_capacity: usize,
}

impl Occupancy {
    fn new(snapshot: &Snapshot) -> Self {
        let days = snapshot.exam_days.clone();
        let slot_capacity = if snapshot.professors.is_empty() {
            snapshot.rooms.len()
        } else {
            snapshot.rooms.len().min(snapshot.professors.len())
        };
        Self {
            keys: snapshot.slot_keys(),
            on_day: vec![Vec::new(); days.len()],
            exams_per_day: vec![0; days.len()],
            days,
            slots_per_day: snapshot.slots.len(),
            position: vec![None; snapshot.modules.len()],
            groups_at: HashMap::new(),
            slot_capacity,
        }
    }

    fn day(&self, position: usize) -> usize {
        position / self.slots_per_day
    }

    fn place(&mut self, module: usize, position: usize, groups: usize) {
        let key = self.keys[position];
        let day = self.day(position);
        self.position[module] = Some(key);
        self.on_day[day].push(module);
        self.exams_per_day[day] += 1;
        *self.groups_at.entry(key).or_insert(0) += groups;
    }

    /// Neighbors of `module` already placed on `key.date`, with shared
    /// students and whether they share the slot too.
    fn day_neighbors(
        &self,
        graph: &ConflictGraph,
        module: usize,
        key: SlotKey,
    ) -> Vec<(usize, u32, bool)> {
        graph
            .neighbors(module)
            .filter_map(|(n, shared)| match self.position[n] {
                Some(k) if k.date == key.date => Some((n, shared, k == key)),
                _ => None,
            })
            .collect()
    }
}

impl SlotAllocator {
    /// Creates an allocator from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rule_engine: RuleEngine::most_constrained_first(),
            student_daily_cap: config.student_daily_cap.max(1),
            max_exams_per_day: config.max_exams_per_day,
            fallback_after: config.fallback_after(),
        }
    }

    /// Replaces the module ordering.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.rule_engine = engine;
        self
    }

    /// Places every module of the snapshot.
    pub fn allocate(&self, snapshot: &Snapshot, graph: &ConflictGraph) -> SlotAllocation {
        self.allocate_since(snapshot, graph, Instant::now())
    }

    /// Places every module, measuring the fallback threshold from
    /// `started` (the start of the run) rather than from this call.
    pub fn allocate_since(
        &self,
        snapshot: &Snapshot,
        graph: &ConflictGraph,
        started: Instant,
    ) -> SlotAllocation {
        let mut occ = Occupancy::new(snapshot);
        let mut allocation = SlotAllocation::default();
        if occ.keys.is_empty() || snapshot.modules.is_empty() {
            return allocation;
        }

        let demands = ModuleDemand::from_snapshot(snapshot, graph);
        let order = self.rule_engine.sort_indices(&demands);
        let ceiling = self.ceiling(snapshot.modules.len(), occ.days.len());
        let mut placements: Vec<Option<Placement>> = vec![None; snapshot.modules.len()];
        let mut fallback_cursor = 0usize;

        for &m in &order {
            let groups = demands[m].group_count;
            let (position, mode) = if started.elapsed() >= self.fallback_after {
                if fallback_cursor == 0 {
                    warn!(
                        event = "allocator.fallback",
                        session_id = %snapshot.session_id(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        remaining = snapshot.modules.len() - allocation.order.len(),
                    );
                }
                let position = self.round_robin(&occ, fallback_cursor);
                fallback_cursor += 1;
                (position, PlacementMode::Fallback)
            } else {
                self.search(&occ, graph, m, groups, ceiling)
            };
            let key = occ.keys[position];

            trace!(module = %demands[m].code, date = %key.date, slot = key.slot_index, ?mode);

            if mode != PlacementMode::Clean {
                self.record_clashes(snapshot, &occ, graph, m, key, &mut allocation.conflicts);
            }
            occ.place(m, position, groups);
            placements[m] = Some(Placement {
                module: m,
                key,
                mode,
            });
            allocation.order.push(m);
        }

        allocation.placements = placements.into_iter().flatten().collect();

        debug!(
            event = "allocator.finished",
            session_id = %snapshot.session_id(),
            modules = allocation.placements.len(),
            clean = allocation.count(PlacementMode::Clean),
            relaxed = allocation.count(PlacementMode::Relaxed),
            fallback = allocation.count(PlacementMode::Fallback),
            conflicts = allocation.conflicts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
        );

        allocation
    }

    /// Exams-per-day soft ceiling: configured, or modules spread evenly.
    fn ceiling(&self, modules: usize, days: usize) -> u32 {
        self.max_exams_per_day
            .unwrap_or_else(|| modules.div_ceil(days.max(1)) as u32)
            .max(1)
    }

    fn search(
        &self,
        occ: &Occupancy,
        graph: &ConflictGraph,
        module: usize,
        groups: usize,
        ceiling: u32,
    ) -> (usize, PlacementMode) {
        let mut first_clean: Option<usize> = None;
        let mut least: Option<(Cost, bool, usize)> = None;

        for (position, &key) in occ.keys.iter().enumerate() {
            let cost = self.cost(occ, graph, module, key, groups);
            let over_ceiling = occ.exams_per_day[occ.day(position)] >= ceiling;

            if cost.is_clean() {
                if !over_ceiling {
                    return (position, PlacementMode::Clean);
                }
                first_clean.get_or_insert(position);
            } else if least.map_or(true, |(c, o, _)| (cost, over_ceiling) < (c, o)) {
                least = Some((cost, over_ceiling, position));
            }
        }

        match (first_clean, least) {
            (Some(position), _) => (position, PlacementMode::Clean),
            (None, Some((_, _, position))) => (position, PlacementMode::Relaxed),
            (None, None) => (0, PlacementMode::Relaxed),
        }
    }

    fn cost(
        &self,
        occ: &Occupancy,
        graph: &ConflictGraph,
        module: usize,
        key: SlotKey,
        groups: usize,
    ) -> Cost {
        let neighbors = occ.day_neighbors(graph, module, key);
        let day_clash = neighbors.len() >= self.student_daily_cap as usize;
        let mut same_slot = 0u64;
        let mut shared_students = 0u64;
        for &(_, shared, in_slot) in &neighbors {
            if in_slot {
                same_slot += u64::from(shared);
            }
            if in_slot || day_clash {
                shared_students += u64::from(shared);
            }
        }

        let used = occ.groups_at.get(&key).copied().unwrap_or(0);
        let missing_rooms = (used + groups).saturating_sub(occ.slot_capacity);

        Cost {
            same_slot,
            shared_students,
            missing_rooms,
        }
    }

    /// The `n`-th fallback position: dates cycle fastest, then slots.
    fn round_robin(&self, occ: &Occupancy, n: usize) -> usize {
        let days = occ.days.len();
        let slots = occ.slots_per_day;
        (n % days) * slots + (n / days) % slots
    }

    fn record_clashes(
        &self,
        snapshot: &Snapshot,
        occ: &Occupancy,
        graph: &ConflictGraph,
        module: usize,
        key: SlotKey,
        conflicts: &mut Vec<Conflict>,
    ) {
        let neighbors = occ.day_neighbors(graph, module, key);
        let day_clash = neighbors.len() >= self.student_daily_cap as usize;
        let session_id = snapshot.session_id();
        for (n, shared, same_slot) in neighbors {
            if !(day_clash || same_slot) {
                continue;
            }
            let slot_id = same_slot.then(|| snapshot.slots[key.slot_index].id.clone());
            conflicts.push(Conflict::student(
                Exam::make_id(session_id, &snapshot.modules[n].code),
                Exam::make_id(session_id, &snapshot.modules[module].code),
                shared,
                key.date,
                slot_id,
            ));
        }
    }
}
