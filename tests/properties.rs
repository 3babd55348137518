//! Structural invariants of generated timetables.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use u_timetable::generator::{GeneratorConfig, SessionGenerator};
use u_timetable::models::InvigilatorRole;
use u_timetable::{ConflictKind, EngineConfig, MemoryStore, TimetableEngine, TimetableStore};

fn config(seed: u64, rooms: usize, slots: usize, days: u32) -> GeneratorConfig {
    GeneratorConfig {
        rooms,
        slots_per_day: slots,
        session_days: days,
        ..GeneratorConfig::small().with_seed(seed)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_module_and_group_is_placed(
        seed in 0u64..1_000,
        rooms in 2usize..8,
        slots in 1usize..4,
        days in 3u32..15,
    ) {
        let data = SessionGenerator::new(config(seed, rooms, slots, days)).generate("P");
        let store = Arc::new(MemoryStore::new());
        store.insert_session(data.clone()).unwrap();
        let engine = TimetableEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let report = engine.run("P").unwrap();
        prop_assert_eq!(report.scheduled_count, data.modules.len());
        prop_assert!((report.success_rate() - 1.0).abs() < 1e-10);

        let t = store.timetable("P").unwrap().unwrap();
        let modules: HashSet<&str> = t.exams.iter().map(|e| e.module_code.as_str()).collect();
        prop_assert_eq!(modules.len(), data.modules.len());

        // One room assignment per (exam, group of the module's formation).
        let expected: usize = t
            .exams
            .iter()
            .map(|e| data.groups.iter().filter(|g| g.formation_id == e.formation_id).count())
            .sum();
        prop_assert_eq!(t.room_assignments.len(), expected);

        // Professors exist, so every room has exactly one primary.
        let mut primaries: HashMap<&str, usize> = HashMap::new();
        for inv in t.invigilations.iter().filter(|i| i.role == InvigilatorRole::Primary) {
            *primaries.entry(inv.assignment_id.as_str()).or_insert(0) += 1;
        }
        prop_assert_eq!(primaries.len(), t.room_assignments.len());
        prop_assert!(primaries.values().all(|&n| n == 1));
    }

    #[test]
    fn prop_room_reuse_is_always_flagged(seed in 0u64..1_000, rooms in 1usize..4) {
        let data = SessionGenerator::new(config(seed, rooms, 2, 7)).generate("P");
        let store = Arc::new(MemoryStore::new());
        store.insert_session(data).unwrap();
        let engine = TimetableEngine::new(store.clone(), store.clone(), EngineConfig::default());
        engine.run("P").unwrap();

        let t = store.timetable("P").unwrap().unwrap();
        let conflicts = store.conflicts("P").unwrap();
        let exams: HashMap<&str, _> = t.exams.iter().map(|e| (e.id.as_str(), e)).collect();
        let mut uses: HashMap<(chrono::NaiveDate, &str, &str), usize> = HashMap::new();
        for a in &t.room_assignments {
            let e = exams[a.exam_id.as_str()];
            *uses.entry((e.date, e.slot_id.as_str(), a.room_id.as_str())).or_insert(0) += 1;
        }
        let double_booked = uses.values().filter(|&&n| n > 1).count();
        prop_assert_eq!(
            conflicts.iter().filter(|c| c.kind == ConflictKind::Room).count(),
            double_booked
        );
    }

    #[test]
    fn prop_audit_reproduces_run_conflicts(seed in 0u64..1_000) {
        let data = SessionGenerator::new(config(seed, 4, 2, 5)).generate("P");
        let store = Arc::new(MemoryStore::new());
        store.insert_session(data).unwrap();
        let engine = TimetableEngine::new(store.clone(), store.clone(), EngineConfig::default());

        let report = engine.run("P").unwrap();
        let after_run = store.conflicts("P").unwrap();
        let summary = engine.audit("P").unwrap();
        prop_assert_eq!(summary, report.summary);
        prop_assert_eq!(store.conflicts("P").unwrap(), after_run);
    }
}
