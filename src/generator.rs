//! Synthetic session generator.
//!
//! Produces a consistent [`SessionData`] of configurable size from a
//! seed: departments own formations, formations own groups and modules,
//! every student of a group is enrolled in all modules of the formation,
//! and a fraction of students also take one module of a sibling
//! formation. The same seed always yields the same session.
//!
//! # Usage
//!
//! ```
//! use u_timetable::generator::{GeneratorConfig, SessionGenerator};
//!
//! let data = SessionGenerator::new(GeneratorConfig::small()).generate("2026-S1");
//! assert!(!data.modules.is_empty());
//! ```

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::prelude::IndexedRandom;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{
    Enrollment, Formation, Group, Module, Professor, Room, Session, SessionData, TimeSlot,
};

/// Size and shape of a generated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// RNG seed.
    pub seed: u64,
    /// Number of departments.
    pub departments: usize,
    /// Formations per department.
    pub formations_per_department: usize,
    /// Groups per formation (inclusive range).
    pub groups_per_formation: (usize, usize),
    /// Students per group (inclusive range).
    pub group_size: (u32, u32),
    /// Examined modules per formation (inclusive range).
    pub modules_per_formation: (usize, usize),
    /// Number of rooms.
    pub rooms: usize,
    /// Room capacity (inclusive range).
    pub room_capacity: (u32, u32),
    /// Professors per department.
    pub professors_per_department: usize,
    /// Daily slots (starting 08:00, two hours apart).
    pub slots_per_day: usize,
    /// Calendar length of the session in days (rest days included).
    pub session_days: u32,
    /// First day of the session.
    pub start_date: NaiveDate,
    /// Fraction of students taking one extra module of a sibling formation.
    pub cross_enrollment: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            departments: 3,
            formations_per_department: 4,
            groups_per_formation: (1, 3),
            group_size: (15, 40),
            modules_per_formation: (4, 7),
            rooms: 20,
            room_capacity: (20, 80),
            professors_per_department: 12,
            slots_per_day: 4,
            session_days: 21,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap_or(NaiveDate::MIN),
            cross_enrollment: 0.05,
        }
    }
}

impl GeneratorConfig {
    /// A session small enough for unit tests.
    pub fn small() -> Self {
        Self {
            departments: 2,
            formations_per_department: 2,
            groups_per_formation: (1, 2),
            group_size: (10, 30),
            modules_per_formation: (2, 4),
            rooms: 6,
            room_capacity: (20, 50),
            professors_per_department: 4,
            slots_per_day: 3,
            session_days: 14,
            ..Self::default()
        }
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Seeded session generator.
#[derive(Debug, Clone)]
pub struct SessionGenerator {
    config: GeneratorConfig,
}

impl SessionGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates a session with the given id (semester "S1").
    pub fn generate(&self, session_id: &str) -> SessionData {
        let c = &self.config;
        let mut rng = SmallRng::seed_from_u64(c.seed);

        let end = c.start_date + Duration::days(i64::from(c.session_days.max(1)) - 1);
        let mut data = SessionData::new(
            Session::new(session_id, "S1", c.start_date, end).with_name(format!("Session {session_id}")),
        );

        for i in 0..c.slots_per_day {
            let start = 8 + 2 * i as u32;
            data = data.with_slot(TimeSlot::new(
                format!("T{}", i + 1),
                i as u32 + 1,
                hour(start),
                hour(start + 2),
            ));
        }

        for i in 0..c.rooms {
            let capacity = rng.random_range(c.room_capacity.0..=c.room_capacity.1.max(c.room_capacity.0));
            data = data.with_room(Room::new(format!("R{:03}", i + 1), capacity));
        }

        let mut student_seq = 0usize;
        for d in 0..c.departments {
            let dept = format!("D{}", d + 1);
            for p in 0..c.professors_per_department {
                data = data.with_professor(Professor::new(format!("{dept}-P{:02}", p + 1), &dept));
            }

            for f in 0..c.formations_per_department {
                let formation_id = format!("{dept}-F{}", f + 1);
                let level = (f % 5) as u8 + 1;
                data = data.with_formation(Formation::new(&formation_id, level, &dept));

                let module_count = random_between(&mut rng, c.modules_per_formation);
                let modules: Vec<String> = (0..module_count)
                    .map(|m| format!("{formation_id}-M{}", m + 1))
                    .collect();
                for code in &modules {
                    let credits = rng.random_range(2..=6);
                    data = data.with_module(Module::new(code, &formation_id, "S1").with_credits(credits));
                }

                let group_count = random_between(&mut rng, c.groups_per_formation);
                for g in 0..group_count {
                    let group_id = format!("{formation_id}-G{}", g + 1);
                    let size = rng.random_range(c.group_size.0..=c.group_size.1.max(c.group_size.0));
                    for _ in 0..size {
                        student_seq += 1;
                        let student_id = format!("st{student_seq:05}");
                        for code in &modules {
                            data = data.with_enrollment(Enrollment::new(&student_id, code, &group_id));
                        }
                    }
                    data = data.with_group(Group::new(group_id, &formation_id, size));
                }
            }
        }

        self.cross_enroll(&mut rng, &mut data);
        data
    }

    /// Enrolls a fraction of students in one module of another formation
    /// of their department.
    fn cross_enroll(&self, rng: &mut SmallRng, data: &mut SessionData) {
        if self.config.cross_enrollment <= 0.0 {
            return;
        }
        let mut students: Vec<(String, String, String)> = data
            .enrollments
            .iter()
            .map(|e| (e.student_id.clone(), e.group_id.clone(), e.module_code.clone()))
            .collect();
        students.sort();
        students.dedup_by(|a, b| a.0 == b.0);

        let mut extra = Vec::new();
        for (student_id, group_id, module_code) in students {
            if !rng.random_bool(self.config.cross_enrollment.min(1.0)) {
                continue;
            }
            let Some(own) = data.modules.iter().find(|m| m.code == module_code) else {
                continue;
            };
            let Some(dept) = data
                .formations
                .iter()
                .find(|f| f.id == own.formation_id)
                .map(|f| f.department_id.clone())
            else {
                continue;
            };
            let siblings: Vec<&Module> = data
                .modules
                .iter()
                .filter(|m| m.formation_id != own.formation_id)
                .filter(|m| {
                    data.formations
                        .iter()
                        .any(|f| f.id == m.formation_id && f.department_id == dept)
                })
                .collect();
            if let Some(module) = siblings.choose(rng) {
                extra.push(Enrollment::new(student_id, &module.code, group_id));
            }
        }
        data.enrollments.extend(extra);
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h.min(23), 0, 0).unwrap_or(NaiveTime::MIN)
}

fn random_between(rng: &mut SmallRng, (lo, hi): (usize, usize)) -> usize {
    rng.random_range(lo..=hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Snapshot;
    use crate::validation::validate_session;

    #[test]
    fn test_generated_session_is_valid() {
        let data = SessionGenerator::new(GeneratorConfig::small()).generate("G");
        assert!(validate_session(&data).is_ok());
        assert_eq!(data.slots.len(), 3);
        assert_eq!(data.rooms.len(), 6);
        assert_eq!(data.professors.len(), 8);
        assert_eq!(data.formations.len(), 4);
        assert!(Snapshot::from_data(data).is_ok());
    }

    #[test]
    fn test_same_seed_same_session() {
        let a = SessionGenerator::new(GeneratorConfig::small()).generate("G");
        let b = SessionGenerator::new(GeneratorConfig::small()).generate("G");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_different_seed_differs() {
        let a = SessionGenerator::new(GeneratorConfig::small()).generate("G");
        let b = SessionGenerator::new(GeneratorConfig::small().with_seed(7)).generate("G");
        assert_ne!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_headcount_matches_enrollments() {
        let data = SessionGenerator::new(GeneratorConfig::small()).generate("G");
        for group in &data.groups {
            let mut students: Vec<_> = data
                .enrollments
                .iter()
                .filter(|e| e.group_id == group.id)
                .map(|e| e.student_id.as_str())
                .collect();
            students.sort();
            students.dedup();
            assert_eq!(students.len() as u32, group.headcount);
        }
    }

    #[test]
    fn test_slots_are_well_formed() {
        let config = GeneratorConfig {
            slots_per_day: 5,
            ..GeneratorConfig::small()
        };
        let data = SessionGenerator::new(config).generate("G");
        assert!(data.slots.iter().all(|s| s.end > s.start));
        assert_eq!(data.slots[0].label, "08:00 - 10:00");
    }
}
