//! End-to-end scheduling scenarios.
//!
//! Each test drives `TimetableEngine::run`/`audit` over an in-memory
//! store and checks the stored output.

use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use u_timetable::models::{
    Enrollment, Formation, Group, Module, Professor, Room, Session, TimeSlot,
};
use u_timetable::store::StoreResult;
use u_timetable::{
    Conflict, ConflictKind, EngineConfig, MemoryStore, MissingData, SessionData, Severity,
    StoreError, Timetable, TimetableEngine, TimetableError, TimetableStore,
};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

fn slots(mut data: SessionData, n: u32) -> SessionData {
    for i in 0..n {
        let start = NaiveTime::from_hms_opt(8 + 2 * i, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10 + 2 * i, 0, 0).unwrap();
        data = data.with_slot(TimeSlot::new(format!("T{}", i + 1), i + 1, start, end));
    }
    data
}

fn engine_with(
    data: SessionData,
    config: EngineConfig,
) -> TimetableEngine<Arc<MemoryStore>, Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    store.insert_session(data).unwrap();
    TimetableEngine::new(store.clone(), store, config)
}

fn stored(engine: &TimetableEngine<Arc<MemoryStore>, Arc<MemoryStore>>, id: &str) -> Timetable {
    engine.store().timetable(id).unwrap().unwrap()
}

/// 1 formation, groups of 20 and 35, one module, rooms 15/30/50,
/// 5 slots a day over two days (Mon 5 - Tue 6 January 2026).
fn two_group_session() -> SessionData {
    let data = SessionData::new(Session::new("S", "S1", date(5), date(6)))
        .with_formation(Formation::new("F1", 1, "CS"))
        .with_group(Group::new("G20", "F1", 20))
        .with_group(Group::new("G35", "F1", 35))
        .with_module(Module::new("M1", "F1", "S1"))
        .with_room(Room::new("R15", 15))
        .with_room(Room::new("R30", 30))
        .with_room(Room::new("R50", 50))
        .with_professor(Professor::new("P1", "CS"))
        .with_professor(Professor::new("P2", "CS"));
    slots(data, 5)
}

#[test]
fn two_groups_share_the_slot_in_distinct_fitting_rooms() {
    let engine = engine_with(two_group_session(), EngineConfig::default());
    let report = engine.run("S").unwrap();

    assert_eq!(report.scheduled_count, 1);
    assert_eq!(report.conflict_count, 0);

    let t = stored(&engine, "S");
    assert_eq!(t.exams.len(), 1);
    let rooms: HashMap<&str, &str> = t
        .room_assignments
        .iter()
        .map(|a| (a.group_id.as_str(), a.room_id.as_str()))
        .collect();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms["G35"], "R50");
    assert_eq!(rooms["G20"], "R30");
    assert_eq!(t.invigilations.len(), 2);
}

/// 200 single-group modules on one date: 40 rooms × 5 slots, 50 professors.
fn crowded_day() -> SessionData {
    let mut data = SessionData::new(Session::new("BIG", "S1", date(5), date(5)));
    for i in 0..200 {
        let f = format!("F{i:03}");
        data = data
            .with_formation(Formation::new(&f, 1, if i % 2 == 0 { "CS" } else { "MA" }))
            .with_group(Group::new(format!("{f}-G"), &f, 10))
            .with_module(Module::new(format!("{f}-M"), &f, "S1"));
    }
    for r in 0..40 {
        data = data.with_room(Room::new(format!("R{r:02}"), 20));
    }
    for p in 0..50 {
        data = data.with_professor(Professor::new(
            format!("P{p:02}"),
            if p % 2 == 0 { "CS" } else { "MA" },
        ));
    }
    slots(data, 5)
}

#[test]
fn professor_overload_is_one_conflict_per_excess_duty() {
    let engine = engine_with(crowded_day(), EngineConfig::default().with_professor_daily_cap(3));
    let report = engine.run("BIG").unwrap();
    assert_eq!(report.scheduled_count, 200);

    let t = stored(&engine, "BIG");
    assert_eq!(t.room_assignments.len(), 200);
    assert_eq!(t.invigilations.len(), 200);

    let mut loads: HashMap<&str, u32> = HashMap::new();
    for inv in &t.invigilations {
        *loads.entry(inv.professor_id.as_str()).or_insert(0) += 1;
    }
    let excess: u32 = loads.values().map(|&l| l.saturating_sub(3)).sum();
    assert!(excess >= 50);

    let conflicts = engine.store().conflicts("BIG").unwrap();
    let overloads = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::ProfessorOverload && c.severity == Severity::Major)
        .count();
    assert_eq!(overloads as u32, excess);
    // 40 rooms per slot, 50 professors: nobody is double-booked.
    assert!(conflicts.iter().all(|c| c.severity != Severity::Critical));
}

#[test]
fn no_rooms_fails_before_touching_prior_results() {
    let store = Arc::new(MemoryStore::new());
    store.insert_session(two_group_session()).unwrap();
    let engine = TimetableEngine::new(store.clone(), store.clone(), EngineConfig::default());
    engine.run("S").unwrap();
    let before = store.timetable("S").unwrap().unwrap();

    let mut broken = two_group_session();
    broken.rooms.clear();
    store.insert_session(broken).unwrap();

    let err = engine.run("S").unwrap_err();
    assert!(matches!(
        err,
        TimetableError::DataIncomplete {
            missing: MissingData::Rooms,
            ..
        }
    ));
    assert_eq!(store.timetable("S").unwrap().unwrap(), before);
}

#[test]
fn no_slots_is_data_incomplete() {
    let mut data = two_group_session();
    data.slots.clear();
    let err = engine_with(data, EngineConfig::default()).run("S").unwrap_err();
    assert!(matches!(
        err,
        TimetableError::DataIncomplete {
            missing: MissingData::Slots,
            ..
        }
    ));
}

/// Three formations with overlapping students over a short calendar.
fn busy_session() -> SessionData {
    let mut data = SessionData::new(Session::new("B", "S1", date(5), date(9)));
    for (f, dept) in [("F1", "CS"), ("F2", "CS"), ("F3", "MA")] {
        data = data
            .with_formation(Formation::new(f, 2, dept))
            .with_group(Group::new(format!("{f}-G1"), f, 25))
            .with_group(Group::new(format!("{f}-G2"), f, 30));
        for m in 1..=5 {
            data = data.with_module(Module::new(format!("{f}-M{m}"), f, "S1"));
        }
    }
    for s in 0..12 {
        data = data
            .with_enrollment(Enrollment::new(format!("s{s}"), "F1-M1", "F1-G1"))
            .with_enrollment(Enrollment::new(format!("s{s}"), "F2-M3", "F1-G1"))
            .with_enrollment(Enrollment::new(format!("s{s}"), "F3-M2", "F1-G1"));
    }
    for r in 0..4 {
        data = data.with_room(Room::new(format!("R{r}"), 30 + 5 * r));
    }
    for p in 0..6 {
        data = data.with_professor(Professor::new(format!("P{p}"), if p < 4 { "CS" } else { "MA" }));
    }
    slots(data, 3)
}

#[test]
fn overcommitted_calendar_still_schedules_everything() {
    // 5 coupled modules per formation, 4 exam days (Friday is a rest day).
    let engine = engine_with(busy_session(), EngineConfig::default());
    let report = engine.run("B").unwrap();

    assert_eq!(report.total_modules, 15);
    assert_eq!(report.scheduled_count, 15);
    assert!((report.success_rate() - 1.0).abs() < 1e-10);
    assert!(report.summary.count(ConflictKind::Student) > 0);

    let t = stored(&engine, "B");
    let modules: HashSet<&str> = t.exams.iter().map(|e| e.module_code.as_str()).collect();
    assert_eq!(modules.len(), 15);
    assert_eq!(t.room_assignments.len(), 30);
}

#[test]
fn rooms_are_exclusive_per_slot_or_flagged() {
    let engine = engine_with(busy_session(), EngineConfig::default());
    engine.run("B").unwrap();
    let t = stored(&engine, "B");
    let conflicts = engine.store().conflicts("B").unwrap();

    let exams: HashMap<&str, _> = t.exams.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut seen: HashMap<(NaiveDate, &str, &str), usize> = HashMap::new();
    for a in &t.room_assignments {
        let e = exams[a.exam_id.as_str()];
        *seen
            .entry((e.date, e.slot_id.as_str(), a.room_id.as_str()))
            .or_insert(0) += 1;
    }
    for ((d, slot, room), n) in seen {
        if n > 1 {
            assert!(conflicts.iter().any(|c| c.kind == ConflictKind::Room
                && c.entity_id == room
                && c.date == Some(d)
                && c.slot_id.as_deref() == Some(slot)));
        }
    }
}

#[test]
fn runs_are_deterministic() {
    let a = engine_with(busy_session(), EngineConfig::default());
    let b = engine_with(busy_session(), EngineConfig::default());
    a.run("B").unwrap();
    b.run("B").unwrap();
    assert_eq!(stored(&a, "B"), stored(&b, "B"));
    assert_eq!(
        a.store().conflicts("B").unwrap(),
        b.store().conflicts("B").unwrap()
    );
}

#[test]
fn rerun_replaces_previous_results() {
    let engine = engine_with(busy_session(), EngineConfig::default());
    engine.run("B").unwrap();
    let first = stored(&engine, "B");
    engine.run("B").unwrap();
    assert_eq!(stored(&engine, "B"), first);
}

#[test]
fn audit_is_idempotent_and_matches_run() {
    let engine = engine_with(busy_session(), EngineConfig::default());
    let report = engine.run("B").unwrap();
    let first = engine.audit("B").unwrap();
    let conflicts = engine.store().conflicts("B").unwrap();
    let second = engine.audit("B").unwrap();

    assert_eq!(first, report.summary);
    assert_eq!(first, second);
    assert_eq!(engine.store().conflicts("B").unwrap(), conflicts);
}

#[test]
fn exhausted_budget_falls_back_to_round_robin() {
    let config = EngineConfig::default().with_time_budget(Duration::ZERO);
    let engine = engine_with(busy_session(), config);
    let report = engine.run("B").unwrap();
    assert_eq!(report.scheduled_count, 15);
    assert_eq!(report.fallback_placements, 15);
}

/// Store whose writes can be switched off.
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl TimetableStore for FlakyStore {
    fn replace_results(&self, timetable: Timetable, conflicts: Vec<Conflict>) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.replace_results(timetable, conflicts)
    }

    fn replace_conflicts(&self, session_id: &str, conflicts: Vec<Conflict>) -> StoreResult<()> {
        self.inner.replace_conflicts(session_id, conflicts)
    }

    fn timetable(&self, session_id: &str) -> StoreResult<Option<Timetable>> {
        self.inner.timetable(session_id)
    }

    fn conflicts(&self, session_id: &str) -> StoreResult<Vec<Conflict>> {
        self.inner.conflicts(session_id)
    }
}

#[test]
fn persistence_failure_keeps_prior_schedule() {
    let source = Arc::new(MemoryStore::new());
    source.insert_session(two_group_session()).unwrap();
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        failing: AtomicBool::new(false),
    });
    let engine = TimetableEngine::new(source.clone(), store.clone(), EngineConfig::default());
    engine.run("S").unwrap();
    let before = store.timetable("S").unwrap().unwrap();

    source
        .insert_session(two_group_session().with_module(Module::new("M2", "F1", "S1")))
        .unwrap();
    store.failing.store(true, Ordering::SeqCst);

    let err = engine.run("S").unwrap_err();
    assert!(matches!(err, TimetableError::Persistence(StoreError::Backend(_))));
    assert_eq!(store.timetable("S").unwrap().unwrap(), before);
}

#[test]
fn audit_sees_manual_edits() {
    let store = Arc::new(MemoryStore::new());
    store.insert_session(two_group_session()).unwrap();
    let engine = TimetableEngine::new(store.clone(), store.clone(), EngineConfig::default());
    engine.run("S").unwrap();

    let mut edited = store.timetable("S").unwrap().unwrap();
    for a in &mut edited.room_assignments {
        a.room_id = "R15".into();
    }
    store.import_timetable(edited).unwrap();

    let summary = engine.audit("S").unwrap();
    assert_eq!(summary.count(ConflictKind::Room), 1);
    assert_eq!(summary.count(ConflictKind::Capacity), 2);
}
